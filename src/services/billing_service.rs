// src/services/billing_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::store::LedgerStore,
    models::billing::{BillingProfile, UpdateBillingProfileRequest},
};

/// Owner-facing access to the late-fee policy. The ledger itself only reads it.
#[derive(Clone)]
pub struct BillingService {
    store: Arc<dyn LedgerStore>,
}

impl BillingService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn profile(&self, owner_id: Uuid) -> Result<BillingProfile, AppError> {
        let mut tx = self.store.begin().await?;
        tx.billing_profile(owner_id).await
    }

    pub async fn save_profile(
        &self,
        owner_id: Uuid,
        payload: UpdateBillingProfileRequest,
    ) -> Result<BillingProfile, AppError> {
        payload.validate()?;
        if payload.late_fee_value < Decimal::ZERO {
            return Err(AppError::Validation("late fee must not be negative".into()));
        }

        let profile = BillingProfile {
            owner_id,
            grace_days: payload.grace_days,
            late_fee_type: payload.late_fee_type,
            late_fee_value: payload.late_fee_value,
            updated_at: None,
        };

        let mut tx = self.store.begin().await?;
        let saved = tx.save_billing_profile(&profile).await?;
        tx.commit().await?;

        tracing::info!(owner_id = %owner_id, grace_days = saved.grace_days, "billing profile saved");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory_store::MemoryLedgerStore, models::billing::LateFeeType, services::test_support::dec,
    };

    #[tokio::test]
    async fn saved_profile_replaces_default() {
        let svc = BillingService::new(Arc::new(MemoryLedgerStore::new()));
        let owner = Uuid::new_v4();
        assert_eq!(svc.profile(owner).await.unwrap().grace_days, 3);

        let saved = svc
            .save_profile(
                owner,
                UpdateBillingProfileRequest {
                    grace_days: 5,
                    late_fee_type: LateFeeType::Percent,
                    late_fee_value: dec("2.5"),
                },
            )
            .await
            .unwrap();

        assert!(saved.updated_at.is_some());
        let loaded = svc.profile(owner).await.unwrap();
        assert_eq!(loaded.grace_days, 5);
        assert_eq!(loaded.late_fee_type, LateFeeType::Percent);
    }

    #[tokio::test]
    async fn negative_fee_is_rejected() {
        let svc = BillingService::new(Arc::new(MemoryLedgerStore::new()));
        let err = svc
            .save_profile(
                Uuid::new_v4(),
                UpdateBillingProfileRequest {
                    grace_days: 3,
                    late_fee_type: LateFeeType::Fixed,
                    late_fee_value: dec("-1"),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
