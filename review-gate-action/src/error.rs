use thiserror::Error;

/// Fatal conditions of a run, kept apart from the expected "check failed"
/// decision so that only `main` folds the two into one failure signal.
#[derive(Debug, Error)]
pub enum RunError {
    /// Missing credential, reviewer source, repository or event payload.
    #[error("{0:#}")]
    Config(anyhow::Error),
    /// The review listing call failed.
    #[error("{0:#}")]
    Upstream(anyhow::Error),
}

impl RunError {
    pub fn config(message: impl Into<String>) -> Self {
        RunError::Config(anyhow::anyhow!(message.into()))
    }

    /// Text handed to the run-outcome sink.
    pub fn failure_message(&self) -> String {
        match self {
            RunError::Config(e) => format!("{:#}", e),
            RunError::Upstream(e) => format!("Caught an error: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_config_failure_message_is_bare() {
        let err = RunError::config("Missing Github token");
        assert_eq!(err.failure_message(), "Missing Github token");
    }

    #[test]
    fn test_upstream_failure_message_includes_context_chain() {
        let source: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused"));
        let err = RunError::Upstream(source.context("Failed to send list reviews request").unwrap_err());
        assert_eq!(
            err.failure_message(),
            "Caught an error: Failed to send list reviews request: connection refused"
        );
    }
}
