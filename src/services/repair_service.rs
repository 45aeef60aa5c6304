// src/services/repair_service.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::store::LedgerStore,
    models::repair::{NewRepair, Repair, RepairChange, RepairPriority, RepairStatus, RepairUpdate},
    services::deposit_ledger,
};

const DEFAULT_CATEGORY: &str = "general";

#[derive(Clone)]
pub struct RepairService {
    store: Arc<dyn LedgerStore>,
}

impl RepairService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn file_repair(&self, lease_id: Uuid, payload: NewRepair) -> Result<Repair, AppError> {
        payload.validate()?;

        let mut tx = self.store.begin().await?;
        if tx.lease(lease_id).await?.is_none() {
            return Err(AppError::not_found("lease", lease_id));
        }

        let now = Utc::now();
        let repair = Repair {
            id: Uuid::new_v4(),
            lease_id,
            title: payload.title.trim().to_string(),
            detail: payload.detail.trim().to_string(),
            priority: payload.priority.unwrap_or(RepairPriority::Normal),
            category: payload
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            status: RepairStatus::Open,
            cost: None,
            scheduled_at: None,
            assigned_to: None,
            deducted_amount: None,
            deducted_at: None,
            created_at: now,
            updated_at: now,
        };
        tx.insert_repair(&repair).await?;
        tx.commit().await?;

        tracing::info!(repair_id = %repair.id, lease_id = %lease_id, "repair filed");
        Ok(repair)
    }

    /// Applies a partial update. Once the repair is resolved or closed with a
    /// positive cost, that cost is charged against the deposit in the same
    /// transaction, at most once per repair. Only updates that carry a status
    /// or a cost can trigger the charge.
    pub async fn update_repair(&self, repair_id: Uuid, update: RepairUpdate) -> Result<RepairChange, AppError> {
        if update.cost.is_some_and(|c| c < Decimal::ZERO) {
            return Err(AppError::Validation("cost must not be negative".into()));
        }

        let mut tx = self.store.begin().await?;
        let mut repair = tx
            .repair_for_update(repair_id)
            .await?
            .ok_or_else(|| AppError::not_found("repair", repair_id))?;

        if let Some(next) = update.status {
            if !repair.status.can_transition_to(next) {
                return Err(AppError::InvalidTransition {
                    entity: "repair",
                    id: repair_id,
                    from: format!("{:?}", repair.status),
                    to: format!("{next:?}"),
                });
            }
            repair.status = next;
        }
        if let Some(cost) = update.cost {
            repair.cost = Some(cost);
        }
        if update.scheduled_at.is_some() {
            repair.scheduled_at = update.scheduled_at;
        }
        if update.assigned_to.is_some() {
            repair.assigned_to = update.assigned_to;
        }
        tx.update_repair(&repair).await?;

        let settling = update.status.is_some() || update.cost.is_some();
        let deduction = match repair.cost {
            Some(cost) if settling && repair.status.settles_cost() && cost > Decimal::ZERO => {
                Some(deposit_ledger::deduct_in_tx(&mut *tx, &mut repair, cost).await?)
            }
            _ => None,
        };

        tx.commit().await?;
        tracing::info!(repair_id = %repair_id, status = ?repair.status, "repair updated");
        Ok(RepairChange { repair, deduction })
    }

    pub async fn list_repairs(&self, lease_id: Uuid) -> Result<Vec<Repair>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.lease(lease_id).await?.is_none() {
            return Err(AppError::not_found("lease", lease_id));
        }
        tx.repairs(lease_id).await
    }
}
