// src/db/billing_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::billing::BillingProfile};

#[derive(Clone, Copy, Default)]
pub struct BillingProfileRepository;

impl BillingProfileRepository {
    /// Saved profile of the owner, or the default one if nothing was saved yet.
    pub async fn get_profile<'e, E>(&self, executor: E, owner_id: Uuid) -> Result<BillingProfile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let profile = sqlx::query_as::<_, BillingProfile>(
            r#"
            SELECT owner_id, grace_days, late_fee_type, late_fee_value, updated_at
            FROM billing_profiles
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(executor)
        .await?;

        Ok(profile.unwrap_or_else(|| BillingProfile::default_for(owner_id)))
    }

    pub async fn upsert_profile<'e, E>(
        &self,
        executor: E,
        profile: &BillingProfile,
    ) -> Result<BillingProfile, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT: the first save creates the row, later saves overwrite it.
        // The RETURNING row carries the updated_at the database stamped.
        let saved = sqlx::query_as::<_, BillingProfile>(
            r#"
            INSERT INTO billing_profiles (owner_id, grace_days, late_fee_type, late_fee_value)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (owner_id)
            DO UPDATE SET
                grace_days = EXCLUDED.grace_days,
                late_fee_type = EXCLUDED.late_fee_type,
                late_fee_value = EXCLUDED.late_fee_value,
                updated_at = NOW()
            RETURNING owner_id, grace_days, late_fee_type, late_fee_value, updated_at
            "#,
        )
        .bind(profile.owner_id)
        .bind(profile.grace_days)
        .bind(profile.late_fee_type)
        .bind(profile.late_fee_value)
        .fetch_one(executor)
        .await?;

        Ok(saved)
    }
}
