use cn_core::record::RecordError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("canvas `{0}` not found")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("autosave task is no longer running")]
    Stopped,
}

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("assistant request failed: {0}")]
    Service(String),

    #[error("malformed assistant response: {0}")]
    Malformed(#[from] serde_json::Error),
}
