// src/db/receipt_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::receipt::Receipt};

#[derive(Clone, Copy, Default)]
pub struct ReceiptRepository;

impl ReceiptRepository {
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Receipt>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let receipt = sqlx::query_as::<_, Receipt>("SELECT * FROM receipts WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(receipt)
    }

    pub async fn list_by_lease<'e, E>(&self, executor: E, lease_id: Uuid) -> Result<Vec<Receipt>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let receipts = sqlx::query_as::<_, Receipt>(
            "SELECT * FROM receipts WHERE lease_id = $1 ORDER BY paid_at ASC, id ASC",
        )
        .bind(lease_id)
        .fetch_all(executor)
        .await?;

        Ok(receipts)
    }

    // Receipts are write-once: a second insert under the same id is a no-op.
    pub async fn insert<'e, E>(&self, executor: E, receipt: &Receipt) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO receipts (
                id, lease_id, invoice_id, synthetic_key,
                paid_amount, paid_at, chain_id, tx_hash, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(receipt.id)
        .bind(receipt.lease_id)
        .bind(receipt.invoice_id)
        .bind(&receipt.synthetic_key)
        .bind(receipt.paid_amount)
        .bind(receipt.paid_at)
        .bind(&receipt.chain_id)
        .bind(&receipt.tx_hash)
        .bind(receipt.created_at)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
