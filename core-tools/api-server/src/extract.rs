//! Request body extraction
//!
//! A missing body, or one not sent as JSON, reads as `{}` so the handlers'
//! own field checks decide the response. Anything unparsable is a 400 with
//! the usual `{ "error": ... }` body.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;

/// JSON request body whose rejections are [`ApiError`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(&req) {
            return Ok(Self(T::default()));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes).map(Self).map_err(|e| {
            tracing::debug!("Rejected request body: {}", e);
            ApiError::bad_request("Invalid JSON body")
        })
    }
}
