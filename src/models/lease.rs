// src/models/lease.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::invoice::Invoice;

// --- Enums (mapped to Postgres) ---

/// Coarse lease lifecycle. Declaration order is the lifecycle order, so
/// `Ord` doubles as the monotonicity check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "lease_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Pending,     // awaiting signatures
    Signed,      // tenant signed
    DepositPaid, // deposit credited
    Active,      // rent payment confirmed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SigningParty {
    Owner,
    Tenant,
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lease {
    pub id: Uuid,

    #[schema(example = "listing-8841")]
    pub property_ref: String,

    pub owner_id: Uuid,
    pub tenant_id: Uuid,

    #[schema(example = "0x8ba1f109551bD432803012645Ac136ddd64DBA72")]
    pub tenant_wallet: Option<String>,

    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,

    #[schema(example = 5)]
    pub due_day: i32,

    #[schema(example = "1.0")]
    pub monthly_rent: Decimal,
    #[schema(example = "12.0")]
    pub annual_rent: Decimal,
    #[schema(example = "2.0")]
    pub security_deposit: Decimal,
    #[schema(example = "0.5")]
    pub deposit_balance: Decimal,

    pub status: LeaseStatus,

    pub owner_signed_at: Option<DateTime<Utc>>,
    pub tenant_signed_at: Option<DateTime<Utc>>,

    #[schema(example = "11155111")]
    pub chain_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lease {
    /// Moves the lease forward to `target`. Never regresses; returns whether
    /// the status changed.
    pub fn advance(&mut self, target: LeaseStatus) -> bool {
        if target > self.status {
            self.status = target;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewLease {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "listing-8841")]
    pub property_ref: String,

    pub tenant_id: Uuid,

    #[validate(length(min = 42, message = "invalid wallet address"))]
    pub tenant_wallet: Option<String>,

    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,

    #[validate(range(min = 1, max = 31, message = "due day must be between 1 and 31"))]
    #[schema(example = 5)]
    pub due_day: i32,

    #[schema(example = "1.0")]
    pub monthly_rent: Decimal,
    #[schema(example = "12.0")]
    pub annual_rent: Decimal,
    #[schema(example = "2.0")]
    pub security_deposit: Decimal,

    pub chain_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignLeaseRequest {
    pub party: SigningParty,
}

/// A freshly created lease with the invoice for its first period.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLease {
    #[serde(flatten)]
    pub lease: Lease,
    pub initial_invoice: Invoice,
}
