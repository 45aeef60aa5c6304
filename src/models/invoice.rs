// src/models/invoice.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::settlement::SettlementRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    Rent,
    Deposit,
    AnnualRent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
}

/// One billing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePeriod {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub lease_id: Uuid,
    pub kind: InvoiceKind,

    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub due_at: DateTime<Utc>,

    #[schema(example = "1.0")]
    pub amount: Decimal,
    #[schema(example = "0")]
    pub late_fee: Decimal,

    pub status: InvoiceStatus,

    pub chain_id: Option<String>,
    pub tx_hash: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn settlement(&self) -> Option<SettlementRef> {
        match (&self.chain_id, &self.tx_hash) {
            (Some(chain_id), Some(tx_hash)) => Some(SettlementRef::new(chain_id, tx_hash)),
            _ => None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

/// An invoice with its late-fee assessment at a given instant. Never persisted.
///
/// The stored `lateFee` of the flattened invoice stays as recorded; the fee
/// owed at the assessment instant is `assessedLateFee`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStanding {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub overdue: bool,
    pub late_days: i64,
    #[schema(example = "0.1")]
    pub assessed_late_fee: Decimal,
    #[schema(example = "1.1")]
    pub total_due: Decimal,
}

/// What a tenant's wallet needs to pay an invoice.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstructions {
    pub invoice_id: Uuid,
    pub lease_id: Uuid,
    #[schema(example = "1.0")]
    pub amount: Decimal,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    #[schema(example = "1337")]
    pub chain_id: String,
}
