// src/db/repair_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::repair::Repair};

#[derive(Clone, Copy, Default)]
pub struct RepairRepository;

impl RepairRepository {
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Repair>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let repair = sqlx::query_as::<_, Repair>("SELECT * FROM repairs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(repair)
    }

    pub async fn list_by_lease<'e, E>(&self, executor: E, lease_id: Uuid) -> Result<Vec<Repair>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Oldest first, with the id as tie breaker so the order is stable.
        let repairs = sqlx::query_as::<_, Repair>(
            "SELECT * FROM repairs WHERE lease_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(lease_id)
        .fetch_all(executor)
        .await?;

        Ok(repairs)
    }

    pub async fn insert<'e, E>(&self, executor: E, repair: &Repair) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO repairs (
                id, lease_id, title, detail, priority, category, status,
                cost, scheduled_at, assigned_to, deducted_amount, deducted_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(repair.id)
        .bind(repair.lease_id)
        .bind(&repair.title)
        .bind(&repair.detail)
        .bind(repair.priority)
        .bind(&repair.category)
        .bind(repair.status)
        .bind(repair.cost)
        .bind(repair.scheduled_at)
        .bind(&repair.assigned_to)
        .bind(repair.deducted_amount)
        .bind(repair.deducted_at)
        .bind(repair.created_at)
        .bind(repair.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn update<'e, E>(&self, executor: E, repair: &Repair) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // deducted_* only ever goes from NULL to a value
        let result = sqlx::query(
            r#"
            UPDATE repairs
            SET status = $2,
                cost = $3,
                scheduled_at = $4,
                assigned_to = $5,
                deducted_amount = COALESCE(deducted_amount, $6),
                deducted_at = COALESCE(deducted_at, $7),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(repair.id)
        .bind(repair.status)
        .bind(repair.cost)
        .bind(repair.scheduled_at)
        .bind(&repair.assigned_to)
        .bind(repair.deducted_amount)
        .bind(repair.deducted_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("repair", repair.id));
        }
        Ok(())
    }
}
