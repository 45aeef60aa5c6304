// src/db/store.rs

//! The transactional record store the ledger runs against.
//!
//! Every ledger mutation opens one [`LedgerTx`], reads what it needs (locking
//! rows it is about to change), writes, and commits. Dropping a transaction
//! without committing discards all of its writes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        billing::BillingProfile, invoice::Invoice, lease::Lease, receipt::Receipt, repair::Repair,
    },
};

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, AppError>;
}

/// One atomic read-modify-write scope.
///
/// `*_for_update` reads lock the row until commit/rollback. Callers that lock
/// both a repair and its lease lock the repair first.
#[async_trait]
pub trait LedgerTx: Send {
    // --- Leases ---
    async fn lease(&mut self, id: Uuid) -> Result<Option<Lease>, AppError>;
    async fn lease_for_update(&mut self, id: Uuid) -> Result<Option<Lease>, AppError>;
    async fn leases(&mut self, owner_id: Option<Uuid>) -> Result<Vec<Lease>, AppError>;
    async fn insert_lease(&mut self, lease: &Lease) -> Result<(), AppError>;
    async fn update_lease(&mut self, lease: &Lease) -> Result<(), AppError>;

    // --- Billing profiles ---
    /// Saved profile of the owner, or the default profile when none was saved.
    async fn billing_profile(&mut self, owner_id: Uuid) -> Result<BillingProfile, AppError>;
    async fn save_billing_profile(&mut self, profile: &BillingProfile) -> Result<BillingProfile, AppError>;

    // --- Invoices ---
    async fn invoice(&mut self, id: Uuid) -> Result<Option<Invoice>, AppError>;
    async fn invoice_for_update(&mut self, id: Uuid) -> Result<Option<Invoice>, AppError>;
    async fn invoices(&mut self, lease_id: Uuid) -> Result<Vec<Invoice>, AppError>;
    /// Most recent rent invoice of the lease by `period_start`.
    async fn latest_rent_invoice(&mut self, lease_id: Uuid) -> Result<Option<Invoice>, AppError>;
    /// Inserts unless the id, or a rent invoice for the same lease and period,
    /// already exists. Returns whether a row was written.
    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<bool, AppError>;
    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), AppError>;

    // --- Receipts ---
    async fn receipt(&mut self, id: Uuid) -> Result<Option<Receipt>, AppError>;
    async fn receipts(&mut self, lease_id: Uuid) -> Result<Vec<Receipt>, AppError>;
    /// Inserts unless the id already exists. Returns whether a row was written.
    async fn insert_receipt(&mut self, receipt: &Receipt) -> Result<bool, AppError>;

    // --- Repairs ---
    async fn repair_for_update(&mut self, id: Uuid) -> Result<Option<Repair>, AppError>;
    async fn repairs(&mut self, lease_id: Uuid) -> Result<Vec<Repair>, AppError>;
    async fn insert_repair(&mut self, repair: &Repair) -> Result<(), AppError>;
    async fn update_repair(&mut self, repair: &Repair) -> Result<(), AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}
