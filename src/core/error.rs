use thiserror::Error;

/// A call to the generation service failed or came back with data we
/// cannot use.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service request failed: {0}")]
    Service(String),
    #[error("could not parse generation response: {0}")]
    Malformed(String),
    #[error("generated content does not match the requested shape: {0}")]
    NonConforming(String),
    #[error("request rejected: {0}")]
    Rejected(#[from] ValidationError),
}

/// The caller asked for something the current workflow cannot do.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("scenario idea must not be empty")]
    EmptyIdea,
    #[error("text to improve must not be empty")]
    EmptyText,
    #[error("player count {0} is outside 3..=6")]
    PlayerCount(u8),
    #[error("unsupported language code: {0}")]
    UnknownLocale(String),
    #[error("no idea at position {0}")]
    IdeaOutOfRange(usize),
    #[error("scenario has no step {0}")]
    StepOutOfRange(usize),
    #[error("cannot {action} while {stage}")]
    InvalidTransition {
        stage: &'static str,
        action: &'static str,
    },
    #[error("another operation is already in progress")]
    Busy,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
