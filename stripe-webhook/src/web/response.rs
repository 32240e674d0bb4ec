//! Translation of request outcomes into HTTP responses.
//!
//! | Outcome                    | Status | Body                               |
//! |----------------------------|--------|------------------------------------|
//! | all handlers succeeded     | 200    | empty                              |
//! | no handler for event type  | 501    | empty                              |
//! | signature rejected         | 400    | `Signature verification error`     |
//! | anything else              | 500    | `Error processing event`           |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn, Level};

use crate::dispatch::DispatchOutcome;
use crate::error::WebhookError;

/// Structured error body: `{ "errors": [{ status, title, details }] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub status: u16,
    pub title: String,
    pub details: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, title: &str, details: impl Into<String>) -> Self {
        Self {
            errors: vec![ErrorDetail {
                status: status.as_u16(),
                title: title.to_string(),
                details: details.into(),
            }],
        }
    }
}

impl From<&WebhookError> for ErrorBody {
    fn from(err: &WebhookError) -> Self {
        ErrorBody::new(err.status(), err.title(), err.to_string())
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

impl IntoResponse for DispatchOutcome {
    fn into_response(self) -> Response {
        match self {
            DispatchOutcome::Success { .. } => StatusCode::OK.into_response(),
            DispatchOutcome::NoHandlersRegistered => StatusCode::NOT_IMPLEMENTED.into_response(),
            DispatchOutcome::HandlerFailure { cause, .. } => {
                WebhookError::Handler(cause).into_response()
            }
        }
    }
}

/// Produce the single response for one request.
pub fn translate(result: Result<DispatchOutcome, WebhookError>) -> Response {
    match result {
        Ok(outcome) => outcome.into_response(),
        Err(e) => {
            let status = e.status().as_u16();
            if failure_level(&e) == Level::WARN {
                warn!(status = status, title = e.title(), error = %e, "webhook_request_rejected");
            } else {
                error!(status = status, title = e.title(), error = %e, "webhook_request_failed");
            }
            e.into_response()
        }
    }
}

/// Client errors are logged at `warn`, server-side failures at `error`.
fn failure_level(err: &WebhookError) -> Level {
    if err.status().is_client_error() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    async fn body_bytes(response: Response) -> axum::body::Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    async fn error_body(response: Response) -> ErrorBody {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_success_is_200_with_empty_body() {
        let response = translate(Ok(DispatchOutcome::Success { handlers: 1 }));

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_handlers_is_501_with_empty_body() {
        let response = translate(Ok(DispatchOutcome::NoHandlersRegistered));

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_signature_error_is_400() {
        let response = translate(Err(WebhookError::SignatureVerification(
            "bad signature".to_string(),
        )));

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_body(response).await,
            ErrorBody::new(
                StatusCode::BAD_REQUEST,
                "Signature verification error",
                "bad signature"
            )
        );
    }

    #[tokio::test]
    async fn test_handler_failure_is_500() {
        let response = translate(Ok(DispatchOutcome::HandlerFailure {
            cause: anyhow!("card declined"),
            failed: 1,
            total: 2,
        }));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = error_body(response).await;
        assert_eq!(body.errors.len(), 1);
        assert_eq!(body.errors[0].status, 500);
        assert_eq!(body.errors[0].title, "Error processing event");
        assert_eq!(body.errors[0].details, "card declined");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_500() {
        let response = translate(Err(WebhookError::MalformedPayload("eof".to_string())));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_body(response).await.errors[0].title, "Error processing event");
    }

    #[test]
    fn test_failure_level_by_status() {
        let rejected = WebhookError::SignatureVerification("bad".to_string());
        assert_eq!(failure_level(&rejected), Level::WARN);

        let failed = WebhookError::Handler(anyhow!("boom"));
        assert_eq!(failure_level(&failed), Level::ERROR);

        let unreadable = WebhookError::BodyRead("eof".to_string());
        assert_eq!(failure_level(&unreadable), Level::ERROR);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody::new(StatusCode::BAD_REQUEST, "Signature verification error", "x");
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "errors": [{"status": 400, "title": "Signature verification error", "details": "x"}]
            })
        );
    }
}
