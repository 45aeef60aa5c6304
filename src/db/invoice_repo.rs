// src/db/invoice_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::invoice::Invoice};

const INVOICE_COLUMNS: &str = r#"
    id, lease_id, kind, period_start, period_end, due_at,
    amount, late_fee, status, chain_id, tx_hash, created_at
"#;

#[derive(Clone, Copy, Default)]
pub struct InvoiceRepository;

impl InvoiceRepository {
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(invoice)
    }

    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 FOR UPDATE");
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(invoice)
    }

    pub async fn list_by_lease<'e, E>(&self, executor: E, lease_id: Uuid) -> Result<Vec<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE lease_id = $1 \
             ORDER BY period_start ASC, created_at ASC"
        );
        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(lease_id)
            .fetch_all(executor)
            .await?;

        Ok(invoices)
    }

    pub async fn latest_rent<'e, E>(&self, executor: E, lease_id: Uuid) -> Result<Option<Invoice>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Only rent invoices drive the monthly schedule. Deposit and annual
        // rent rows live on the same table but must not move the anchor.
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE lease_id = $1 AND kind = 'rent' \
             ORDER BY period_start DESC LIMIT 1"
        );
        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(lease_id)
            .fetch_optional(executor)
            .await?;

        Ok(invoice)
    }

    /// `ON CONFLICT DO NOTHING` covers both the primary key and the
    /// one-rent-invoice-per-period index.
    pub async fn insert<'e, E>(&self, executor: E, invoice: &Invoice) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // rows_affected tells the caller whether it won the insert or
        // whether another run had already written this invoice.
        let result = sqlx::query(
            r#"
            INSERT INTO invoices (
                id, lease_id, kind, period_start, period_end, due_at,
                amount, late_fee, status, chain_id, tx_hash, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.lease_id)
        .bind(invoice.kind)
        .bind(invoice.period_start)
        .bind(invoice.period_end)
        .bind(invoice.due_at)
        .bind(invoice.amount)
        .bind(invoice.late_fee)
        .bind(invoice.status)
        .bind(&invoice.chain_id)
        .bind(&invoice.tx_hash)
        .bind(invoice.created_at)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Amount and period are immutable; only settlement state changes.
    pub async fn update_settlement<'e, E>(&self, executor: E, invoice: &Invoice) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = $2, late_fee = $3, chain_id = $4, tx_hash = $5
            WHERE id = $1
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.status)
        .bind(invoice.late_fee)
        .bind(&invoice.chain_id)
        .bind(&invoice.tx_hash)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("invoice", invoice.id));
        }
        Ok(())
    }
}
