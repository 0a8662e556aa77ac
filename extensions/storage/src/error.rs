use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage has not been configured, call configure() first")]
    NotConfigured,
    #[error("unsupported storage configuration: {0}")]
    Unsupported(String),
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored item is not valid json: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Stable code carried across the bridge.
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::NotConfigured => "NOT_CONFIGURED",
            StorageError::Unsupported(_) => "CONFIG_ERROR",
            StorageError::Io(_) => "IO_ERROR",
            StorageError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
