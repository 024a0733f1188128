use thiserror::Error;

/// Error taxonomy for the trigger pipeline.
///
/// Per-item errors are isolated by the orchestrator; only malformed events
/// surface to the caller of `handle`.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Missing or inconsistent trigger configuration; fatal at startup
    #[error("invalid trigger configuration: {0}")]
    Configuration(String),

    /// A suite listing or other platform read failed; the affected item is
    /// skipped this round and retried on the next duplicate delivery
    #[error("failed to fetch {what}: {source}")]
    TransientFetch {
        what: String,
        #[source]
        source: anyhow::Error,
    },

    /// The external review run failed
    #[error("review executor failed: {0}")]
    Executor(#[source] anyhow::Error),

    /// The inbound event could not be validated
    #[error("malformed event: {0}")]
    MalformedEvent(String),
}

impl TriggerError {
    pub fn fetch(what: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::TransientFetch {
            what: what.into(),
            source: source.into(),
        }
    }
}
