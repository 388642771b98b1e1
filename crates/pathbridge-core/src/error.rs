use crate::translate::TranslateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid data: {0}")]
    Invalid(String),
    #[error("unknown connection: {0}")]
    UnknownConnection(String),
    #[error(transparent)]
    Translate(#[from] TranslateError),
}
