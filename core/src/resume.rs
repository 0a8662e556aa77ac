use crate::error::{JourneyError, JourneyResult};
use std::fmt;

/// A validated out-of-band continuation link (e.g. an emailed magic link).
///
/// Must be absolute: scheme and authority are both required. Custom app
/// schemes (`com.example.app://resume?...`) are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeUri {
    raw: String,
    uri: http::Uri,
}

impl ResumeUri {
    pub fn parse(raw: &str) -> JourneyResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(JourneyError::invalid_uri(raw, "empty uri"));
        }
        let uri: http::Uri = trimmed
            .parse()
            .map_err(|e: http::uri::InvalidUri| JourneyError::invalid_uri(raw, e.to_string()))?;
        if uri.scheme().is_none() {
            return Err(JourneyError::invalid_uri(raw, "missing scheme"));
        }
        if uri.authority().is_none() {
            return Err(JourneyError::invalid_uri(raw, "missing host"));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            uri,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn uri(&self) -> &http::Uri {
        &self.uri
    }

    /// First value of a query parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.decoded_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// All query parameters in order of appearance, percent-decoded.
    ///
    /// Callers forwarding these must re-encode them.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.decoded_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn decoded_pairs(&self) -> url::form_urlencoded::Parse<'_> {
        url::form_urlencoded::parse(self.uri.query().unwrap_or_default().as_bytes())
    }
}

impl fmt::Display for ResumeUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
