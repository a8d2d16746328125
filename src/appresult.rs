use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use tracing::error;

use crate::error::ChatError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<ChatError>() {
            Some(ChatError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            Some(ChatError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(ChatError::StorageUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{:#}\n{}", self.0, self.0.backtrace());
        }

        (status, Json(json!({ "msg": self.0.to_string() }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_errors_pick_their_status() {
        let bad: AppError = ChatError::invalid("body is empty").into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let missing: AppError = ChatError::NotFound("user u9".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let down: AppError = ChatError::StorageUnavailable(anyhow::anyhow!("disk")).into();
        assert_eq!(down.status(), StatusCode::SERVICE_UNAVAILABLE);

        let other: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(other.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
