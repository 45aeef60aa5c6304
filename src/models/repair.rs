// src/models/repair.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "repair_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl RepairStatus {
    /// Forward moves only, which makes `Closed` terminal. Staying put is
    /// allowed so updates that only touch other fields pass through.
    pub fn can_transition_to(self, next: RepairStatus) -> bool {
        next >= self
    }

    /// Statuses at which an attached cost is charged against the deposit.
    pub fn settles_cost(self) -> bool {
        matches!(self, RepairStatus::Resolved | RepairStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "repair_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RepairPriority {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Repair {
    pub id: Uuid,
    pub lease_id: Uuid,

    #[schema(example = "Leaking kitchen tap")]
    pub title: String,
    #[schema(example = "Drips constantly since Monday")]
    pub detail: String,

    pub priority: RepairPriority,
    #[schema(example = "plumbing")]
    pub category: String,

    pub status: RepairStatus,

    #[schema(example = "1.5")]
    pub cost: Option<Decimal>,

    pub scheduled_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,

    // Exactly-once guard: set iff the deposit has been charged for this repair.
    pub deducted_amount: Option<Decimal>,
    pub deducted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewRepair {
    #[validate(length(min = 1, message = "required"))]
    pub title: String,

    #[validate(length(min = 1, message = "required"))]
    pub detail: String,

    pub priority: Option<RepairPriority>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairUpdate {
    pub status: Option<RepairStatus>,
    #[schema(example = "1.5")]
    pub cost: Option<Decimal>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
}

/// Which branch of the deposit deduction ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeductionOutcome {
    Deducted { amount: Decimal, remaining: Decimal },
    AlreadyDeducted { amount: Decimal },
    NothingToDeduct,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepairChange {
    pub repair: Repair,
    pub deduction: Option<DeductionOutcome>,
}
