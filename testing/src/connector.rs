use crate::engine::ScriptedEngine;
use parking_lot::Mutex;
use std::sync::Arc;
use trailhead_core::config::ResolvedConfig;
use trailhead_core::engine::{Connector, SharedEngine};
use trailhead_core::error::EngineError;

/// Connector that returns the same [`ScriptedEngine`] for every configuration
/// and remembers the configurations it was given.
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    engine: Arc<ScriptedEngine>,
    configs: Arc<Mutex<Vec<ResolvedConfig>>>,
}

impl ScriptedConnector {
    pub fn new(engine: ScriptedEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            configs: Arc::default(),
        }
    }

    pub fn engine(&self) -> Arc<ScriptedEngine> {
        Arc::clone(&self.engine)
    }

    /// Configurations seen by `connect`, oldest first.
    pub fn configs(&self) -> Vec<ResolvedConfig> {
        self.configs.lock().clone()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, config: &ResolvedConfig) -> Result<SharedEngine, EngineError> {
        self.configs.lock().push(config.clone());
        Ok(self.engine.clone())
    }
}
