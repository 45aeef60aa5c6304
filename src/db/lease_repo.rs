// src/db/lease_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::lease::Lease};

const LEASE_COLUMNS: &str = r#"
    id, property_ref, owner_id, tenant_id, tenant_wallet,
    start_at, end_at, due_day,
    monthly_rent, annual_rent, security_deposit, deposit_balance,
    status, owner_signed_at, tenant_signed_at, chain_id,
    created_at, updated_at
"#;

// Stateless: every call runs on the executor it is handed (pool or transaction).
#[derive(Clone, Copy, Default)]
pub struct LeaseRepository;

impl LeaseRepository {
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lease>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LEASE_COLUMNS} FROM leases WHERE id = $1");
        let lease = sqlx::query_as::<_, Lease>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(lease)
    }

    /// Locks the lease row until the surrounding transaction ends. This is
    /// what serializes deposit mutations per lease.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Lease>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {LEASE_COLUMNS} FROM leases WHERE id = $1 FOR UPDATE");
        let lease = sqlx::query_as::<_, Lease>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(lease)
    }

    pub async fn list<'e, E>(&self, executor: E, owner_id: Option<Uuid>) -> Result<Vec<Lease>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {LEASE_COLUMNS} FROM leases \
             WHERE ($1::uuid IS NULL OR owner_id = $1) \
             ORDER BY created_at ASC, id ASC"
        );
        let leases = sqlx::query_as::<_, Lease>(&sql)
            .bind(owner_id)
            .fetch_all(executor)
            .await?;

        Ok(leases)
    }

    pub async fn insert<'e, E>(&self, executor: E, lease: &Lease) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO leases (
                id, property_ref, owner_id, tenant_id, tenant_wallet,
                start_at, end_at, due_day,
                monthly_rent, annual_rent, security_deposit, deposit_balance,
                status, owner_signed_at, tenant_signed_at, chain_id,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(lease.id)
        .bind(&lease.property_ref)
        .bind(lease.owner_id)
        .bind(lease.tenant_id)
        .bind(&lease.tenant_wallet)
        .bind(lease.start_at)
        .bind(lease.end_at)
        .bind(lease.due_day)
        .bind(lease.monthly_rent)
        .bind(lease.annual_rent)
        .bind(lease.security_deposit)
        .bind(lease.deposit_balance)
        .bind(lease.status)
        .bind(lease.owner_signed_at)
        .bind(lease.tenant_signed_at)
        .bind(&lease.chain_id)
        .bind(lease.created_at)
        .bind(lease.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Persists the mutable part of a lease: lifecycle, deposit balance and signatures.
    pub async fn update<'e, E>(&self, executor: E, lease: &Lease) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE leases
            SET status = $2,
                deposit_balance = $3,
                owner_signed_at = $4,
                tenant_signed_at = $5,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(lease.id)
        .bind(lease.status)
        .bind(lease.deposit_balance)
        .bind(lease.owner_signed_at)
        .bind(lease.tenant_signed_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("lease", lease.id));
        }
        Ok(())
    }
}
