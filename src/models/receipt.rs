// src/models/receipt.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{invoice::Invoice, settlement::SettlementRef};

/// Proof of one confirmed payment. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: Uuid,
    pub lease_id: Uuid,
    pub invoice_id: Option<Uuid>,

    #[schema(example = "receipt-deposit-550e8400-e29b-41d4-a716-446655440000")]
    pub synthetic_key: String,

    #[schema(example = "2.0")]
    pub paid_amount: Decimal,
    pub paid_at: DateTime<Utc>,

    pub chain_id: String,
    pub tx_hash: String,

    pub created_at: DateTime<Utc>,
}

impl Receipt {
    pub fn settlement(&self) -> SettlementRef {
        SettlementRef::new(&self.chain_id, &self.tx_hash)
    }
}

/// Result of a reconciliation call. `replayed` is true when the payment had
/// already been recorded and nothing was written.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub invoice: Invoice,
    pub receipt: Receipt,
    pub replayed: bool,
}
