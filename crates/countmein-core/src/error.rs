use countmein_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("poll not found")]
    PollNotFound,
    #[error("option index out of range")]
    InvalidOption,
    #[error("vote toggle retry budget exhausted")]
    ContentionExhausted,
    #[error(transparent)]
    Database(#[from] DbError),
}
