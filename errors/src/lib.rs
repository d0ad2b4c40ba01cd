use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub const INSUFFICIENT_CREDITS_MSG: &str =
    "Insufficient credits. You need at least 1 credit to generate an image.";
pub const PROMPT_REQUIRED_MSG: &str = "Prompt is required";
pub const GENERATION_FAILED_MSG: &str = "Failed to generate image";

/// Request-level failures, ordered from user-correctable to fatal.
///
/// `Validation` is reported verbatim to the caller. `Adapter` and `Store`
/// carry their source for the log but answer with a generic message so
/// backend details never leak. `Auth` means no usable session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("image generation backend failed")]
    Adapter(#[source] anyhow::Error),
    #[error("storage failure")]
    Store(#[source] anyhow::Error),
    #[error("not signed in")]
    Auth,
}

impl AppError {
    pub fn insufficient_credits() -> Self {
        AppError::Validation(INSUFFICIENT_CREDITS_MSG.to_string())
    }

    pub fn prompt_required() -> Self {
        AppError::Validation(PROMPT_REQUIRED_MSG.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Adapter(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Adapter(_) | AppError::Store(_) => GENERATION_FAILED_MSG.to_string(),
            AppError::Auth => "Not signed in".to_string(),
        };
        (self.status(), Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        assert_eq!(
            AppError::prompt_required().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::insufficient_credits().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn adapter_and_store_map_to_500() {
        let adapter = AppError::Adapter(anyhow::anyhow!("backend down"));
        let store = AppError::Store(anyhow::anyhow!("pool closed"));
        assert_eq!(adapter.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_maps_to_401() {
        assert_eq!(AppError::Auth.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn validation_message_is_preserved() {
        let err = AppError::insufficient_credits();
        assert_eq!(err.to_string(), INSUFFICIENT_CREDITS_MSG);
    }
}
