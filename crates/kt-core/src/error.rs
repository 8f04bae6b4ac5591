use thiserror::Error;

pub type KtResult<T> = Result<T, KtError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KtError {
    #[error("Not a decimal number: {text:?}")]
    InvalidNumber { text: String },
}
