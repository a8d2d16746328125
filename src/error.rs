use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] anyhow::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("transport closed")]
    TransportClosed,
}

impl ChatError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }
}

impl From<sqlx::Error> for ChatError {
    fn from(err: sqlx::Error) -> Self {
        Self::StorageUnavailable(err.into())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
