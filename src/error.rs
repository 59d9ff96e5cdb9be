//! Fetch failure taxonomy

use thiserror::Error;

/// Why a squadron page could not be retrieved.
///
/// Every variant names the squadron so the orchestrator can log it before
/// degrading to an empty page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("timed out after {secs}s fetching {squadron}")]
    Timeout { squadron: String, secs: u64 },

    #[error("HTTP {status} fetching {squadron}")]
    Status { squadron: String, status: u16 },

    #[error("anti-bot challenge not solved for {squadron}")]
    Challenge { squadron: String },

    #[error("network error fetching {squadron}: {source}")]
    Network {
        squadron: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("browser error fetching {squadron}: {message}")]
    Browser { squadron: String, message: String },

    #[error("fetch task for {squadron} did not complete")]
    Aborted { squadron: String },
}

impl FetchError {
    pub fn squadron(&self) -> &str {
        match self {
            FetchError::Timeout { squadron, .. }
            | FetchError::Status { squadron, .. }
            | FetchError::Challenge { squadron }
            | FetchError::Network { squadron, .. }
            | FetchError::Browser { squadron, .. }
            | FetchError::Aborted { squadron } => squadron,
        }
    }

    pub(crate) fn browser(squadron: &str, err: impl std::fmt::Display) -> Self {
        FetchError::Browser {
            squadron: squadron.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_squadron() {
        let err = FetchError::Status {
            squadron: "Band Of Brothers".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "HTTP 503 fetching Band Of Brothers");
        assert_eq!(err.squadron(), "Band Of Brothers");

        let err = FetchError::browser("ABC", "tab crashed");
        assert_eq!(err.to_string(), "browser error fetching ABC: tab crashed");
    }
}
