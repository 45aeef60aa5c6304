// src/services/test_support.rs

use std::str::FromStr;

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    db::{memory_store::MemoryLedgerStore, store::LedgerStore},
    models::lease::{Lease, LeaseStatus},
};

pub(crate) fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Pending one-year lease: rent 1.0, annual 12.0, deposit 2.0, nothing paid.
pub(crate) fn lease_fixture(start_at: DateTime<Utc>, due_day: i32) -> Lease {
    Lease {
        id: Uuid::new_v4(),
        property_ref: "listing-1".to_string(),
        owner_id: Uuid::new_v4(),
        tenant_id: Uuid::new_v4(),
        tenant_wallet: None,
        start_at,
        end_at: start_at + Months::new(12),
        due_day,
        monthly_rent: dec("1.0"),
        annual_rent: dec("12.0"),
        security_deposit: dec("2.0"),
        deposit_balance: Decimal::ZERO,
        status: LeaseStatus::Pending,
        owner_signed_at: None,
        tenant_signed_at: None,
        chain_id: None,
        created_at: start_at,
        updated_at: start_at,
    }
}

pub(crate) async fn seed_lease(store: &MemoryLedgerStore, lease: Lease) -> Lease {
    let mut tx = store.begin().await.unwrap();
    tx.insert_lease(&lease).await.unwrap();
    tx.commit().await.unwrap();
    lease
}
