//! Form extractor accepting urlencoded and multipart bodies.
//!
//! Browsers posting `FormData` send `multipart/form-data`; curl and plain HTML
//! forms send `application/x-www-form-urlencoded`. Both decode into the same
//! typed struct. Multipart file parts are read as text like any other field.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{async_trait, Form};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Typed form body from either encoding.
#[derive(Debug, Clone)]
pub struct ClipForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ClipForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            return Ok(Self(value));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let mut fields = Map::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            fields.insert(name, Value::String(value));
        }

        serde_json::from_value(Value::Object(fields))
            .map(Self)
            .map_err(|e| ApiError::bad_request(format!("Invalid form data: {}", e)))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

