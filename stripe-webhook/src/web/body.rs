//! Raw request body acquisition.
//!
//! The signature covers the exact bytes Stripe sent, so the body is read
//! untouched before anything parses it.

use axum::body::{Body, Bytes};
use tracing::warn;

use crate::error::WebhookError;

/// Default upper bound on an inbound webhook body (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Read the complete request body, failing if it exceeds `limit` bytes or
/// the stream errors.
pub async fn read_raw_body(body: Body, limit: usize) -> Result<Bytes, WebhookError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        warn!(error = %e, limit = limit, "body_read_failed");
        WebhookError::BodyRead(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[tokio::test]
    async fn test_read_body_exact_bytes() {
        let raw = "{\"type\": \"invoice.paid\",\n  \"id\":\"evt_1\" }";

        let bytes = read_raw_body(Body::from(raw), DEFAULT_MAX_BODY_BYTES)
            .await
            .unwrap();

        assert_eq!(bytes, Bytes::from(raw));
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let err = read_raw_body(Body::from(vec![b'a'; 64]), 16).await.unwrap_err();
        assert!(matches!(err, WebhookError::BodyRead(_)));
    }

    #[tokio::test]
    async fn test_read_body_stream_error() {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"{\"type\":")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
        ];
        let body = Body::from_stream(futures::stream::iter(chunks));

        let err = read_raw_body(body, DEFAULT_MAX_BODY_BYTES).await.unwrap_err();

        assert!(matches!(err, WebhookError::BodyRead(_)));
    }
}
