//! JSON body extractor for endpoints whose body may be omitted.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ValidationDetail};

/// Deserializes a JSON body, or yields `T::default()` when the body is empty.
///
/// A body that is present but malformed is rejected, never defaulted.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

fn body_error(message: String) -> ApiError {
    ApiError::Validation {
        message: message.clone(),
        details: Some(vec![ValidationDetail {
            field: "body".into(),
            message,
        }]),
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| body_error(rejection.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let Json(value) =
            Json::<T>::from_bytes(&bytes).map_err(|rejection| body_error(rejection.body_text()))?;
        Ok(Self(value))
    }
}
