// src/middleware/owner.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::common::error::AppError;

pub const OWNER_ID_HEADER: &str = "x-owner-id";

/// The owner workspace a request acts for, read from `x-owner-id`.
#[derive(Debug, Clone, Copy)]
pub struct OwnerContext(pub Uuid);

impl<S> FromRequestParts<S> for OwnerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(OWNER_ID_HEADER).ok_or(AppError::MissingOwner)?;

        let owner_id = value
            .to_str()
            .ok()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
            .ok_or(AppError::InvalidOwner)?;

        Ok(OwnerContext(owner_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<OwnerContext, AppError> {
        let mut builder = Request::builder().uri("/api/leases");
        if let Some(value) = header {
            builder = builder.header(OWNER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        OwnerContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_owner_from_header() {
        let owner = Uuid::new_v4();
        let ctx = extract(Some(&owner.to_string())).await.unwrap();
        assert_eq!(ctx.0, owner);
    }

    #[tokio::test]
    async fn rejects_missing_or_malformed_header() {
        assert!(matches!(extract(None).await, Err(AppError::MissingOwner)));
        assert!(matches!(extract(Some("owner-42")).await, Err(AppError::InvalidOwner)));
    }
}
