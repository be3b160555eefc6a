use std::sync::Arc;

pub type ColorizerResult<T> = Result<T, ColorizerError>;

#[derive(thiserror::Error, Debug)]
pub enum ColorizerError {
    #[error("fetch error: {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("timeout error: '{url}' took longer than {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("missing file url: no {0} file is configured")]
    MissingUrl(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("dataset has been disposed")]
    Disposed,

    /// Failure of a load that several callers awaited together.
    #[error(transparent)]
    Shared(Arc<ColorizerError>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ColorizerError {
    pub fn fetch(url: impl Into<String>, msg: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: msg.to_string(),
        }
    }

    pub fn timeout(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            url: url.into(),
            timeout_ms,
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    pub fn missing_url(field: impl Into<String>) -> Self {
        Self::MissingUrl(field.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// `true` when the request was aborted by the fetch timeout, including shared failures.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Shared(inner) => inner.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
