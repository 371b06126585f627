use battle_engine::BattleError;
use thiserror::Error;

/// Stable error kinds the presentation layer can render without
/// inspecting internal messages.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid input: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

impl From<BattleError> for SessionError {
    fn from(err: BattleError) -> Self {
        match err {
            BattleError::BattleFinished => SessionError::InvalidState(err.to_string()),
            BattleError::NotActivePlayer => SessionError::Forbidden(err.to_string()),
        }
    }
}
