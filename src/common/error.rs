// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::settlement::SettlementRef;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("payload validation failed")]
    ValidationErrors(#[from] validator::ValidationErrors),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    // Reconciliation against a record already paid by another transaction.
    #[error("{entity} {id} already settled by {existing_tx} on chain {existing_chain}")]
    AlreadySettled {
        entity: &'static str,
        id: Uuid,
        existing_chain: String,
        existing_tx: String,
    },

    #[error("cannot move {entity} {id} from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        id: Uuid,
        from: String,
        to: String,
    },

    #[error("the x-owner-id header is required")]
    MissingOwner,

    #[error("the x-owner-id header is not a valid UUID")]
    InvalidOwner,

    #[error("database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("internal server error")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        AppError::NotFound { entity, id }
    }

    pub fn already_settled(entity: &'static str, id: Uuid, existing: &SettlementRef) -> Self {
        AppError::AlreadySettled {
            entity,
            id,
            existing_chain: existing.chain_id.clone(),
            existing_tx: existing.tx_hash.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::ValidationErrors(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "One or more fields are invalid.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::Validation(_) | AppError::MissingOwner | AppError::InvalidOwner => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::AlreadySettled { .. } | AppError::InvalidTransition { .. } => {
                (StatusCode::CONFLICT, self.to_string())
            }

            // Store and unexpected failures: log the detail, hide it from the caller.
            AppError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.".to_string())
            }
            AppError::InternalServerError(e) => {
                tracing::error!(error = ?e, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred.".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        let id = Uuid::new_v4();
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::MissingOwner, StatusCode::BAD_REQUEST),
            (AppError::not_found("lease", id), StatusCode::NOT_FOUND),
            (
                AppError::already_settled("invoice", id, &SettlementRef::new("1", "0xabcdef0123")),
                StatusCode::CONFLICT,
            ),
            (
                AppError::DatabaseError(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn already_settled_names_the_transaction_on_file() {
        let id = Uuid::nil();
        let err = AppError::already_settled("invoice", id, &SettlementRef::new("5", "0xfeedbeef01"));
        assert_eq!(
            err.to_string(),
            format!("invoice {id} already settled by 0xfeedbeef01 on chain 5")
        );
    }
}
