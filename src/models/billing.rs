// src/models/billing.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "late_fee_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LateFeeType {
    Fixed,   // flat amount per late invoice
    Percent, // percentage of the invoice amount
}

/// Late-fee policy of one owner workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingProfile {
    #[schema(ignore)]
    pub owner_id: Uuid,

    #[schema(example = 3)]
    pub grace_days: i32,

    pub late_fee_type: LateFeeType,

    #[schema(example = "10")]
    pub late_fee_value: Decimal,

    pub updated_at: Option<DateTime<Utc>>,
}

impl BillingProfile {
    pub const DEFAULT_GRACE_DAYS: i32 = 3;

    /// Profile used for owners who never saved one.
    pub fn default_for(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            grace_days: Self::DEFAULT_GRACE_DAYS,
            late_fee_type: LateFeeType::Fixed,
            late_fee_value: Decimal::ZERO,
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBillingProfileRequest {
    #[validate(range(min = 0, max = 365, message = "grace days must be between 0 and 365"))]
    #[schema(example = 3)]
    pub grace_days: i32,

    pub late_fee_type: LateFeeType,

    #[schema(example = "10")]
    pub late_fee_value: Decimal,
}
