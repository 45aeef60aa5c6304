// src/models/settlement.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// (chain id, transaction hash) of a confirmed on-chain payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRef {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "11155111")]
    pub chain_id: String,

    #[validate(length(min = 10, message = "transaction hash too short"))]
    #[schema(example = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060")]
    pub tx_hash: String,
}

impl SettlementRef {
    pub fn new(chain_id: impl Into<String>, tx_hash: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            tx_hash: tx_hash.into(),
        }
    }
}

/// What the settlement collaborator hands over once a payment is final.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettlementConfirmation {
    #[validate(nested)]
    pub settlement: SettlementRef,

    #[schema(example = "2.0")]
    pub confirmed_amount: Decimal,

    pub confirmed_at: DateTime<Utc>,
}

/// Payments that are not periodic rent invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdHocKind {
    Deposit,
    AnnualRent,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileInvoiceRequest {
    #[validate(length(min = 10, message = "transaction hash too short"))]
    pub tx_hash: String,

    #[validate(length(min = 1, message = "required"))]
    pub chain_id: String,

    #[schema(example = "1.0")]
    pub paid_amount: Decimal,
}
