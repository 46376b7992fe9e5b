use crate::backend::BackendState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SynthError {
    #[error("audio backend unavailable")]
    BackendUnavailable,
    #[error("audio backend refused to resume")]
    ResumeFailed,
    #[error("audio backend is {0:?}, not running")]
    NotRunning(BackendState),
}
