// src/db/pg_store.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        billing_repo::BillingProfileRepository,
        invoice_repo::InvoiceRepository,
        lease_repo::LeaseRepository,
        receipt_repo::ReceiptRepository,
        repair_repo::RepairRepository,
        store::{LedgerStore, LedgerTx},
    },
    models::{
        billing::BillingProfile, invoice::Invoice, lease::Lease, receipt::Receipt, repair::Repair,
    },
};

/// PostgreSQL-backed store. Per-lease serialization comes from row locks
/// (`SELECT ... FOR UPDATE`) taken inside each transaction, so it holds
/// across any number of server processes.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTx { tx }))
    }
}

pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn lease(&mut self, id: Uuid) -> Result<Option<Lease>, AppError> {
        LeaseRepository.find_by_id(&mut *self.tx, id).await
    }

    async fn lease_for_update(&mut self, id: Uuid) -> Result<Option<Lease>, AppError> {
        LeaseRepository.find_for_update(&mut *self.tx, id).await
    }

    async fn leases(&mut self, owner_id: Option<Uuid>) -> Result<Vec<Lease>, AppError> {
        LeaseRepository.list(&mut *self.tx, owner_id).await
    }

    async fn insert_lease(&mut self, lease: &Lease) -> Result<(), AppError> {
        LeaseRepository.insert(&mut *self.tx, lease).await
    }

    async fn update_lease(&mut self, lease: &Lease) -> Result<(), AppError> {
        LeaseRepository.update(&mut *self.tx, lease).await
    }

    async fn billing_profile(&mut self, owner_id: Uuid) -> Result<BillingProfile, AppError> {
        BillingProfileRepository.get_profile(&mut *self.tx, owner_id).await
    }

    async fn save_billing_profile(&mut self, profile: &BillingProfile) -> Result<BillingProfile, AppError> {
        BillingProfileRepository.upsert_profile(&mut *self.tx, profile).await
    }

    async fn invoice(&mut self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        InvoiceRepository.find_by_id(&mut *self.tx, id).await
    }

    async fn invoice_for_update(&mut self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        InvoiceRepository.find_for_update(&mut *self.tx, id).await
    }

    async fn invoices(&mut self, lease_id: Uuid) -> Result<Vec<Invoice>, AppError> {
        InvoiceRepository.list_by_lease(&mut *self.tx, lease_id).await
    }

    async fn latest_rent_invoice(&mut self, lease_id: Uuid) -> Result<Option<Invoice>, AppError> {
        InvoiceRepository.latest_rent(&mut *self.tx, lease_id).await
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<bool, AppError> {
        InvoiceRepository.insert(&mut *self.tx, invoice).await
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), AppError> {
        InvoiceRepository.update_settlement(&mut *self.tx, invoice).await
    }

    async fn receipt(&mut self, id: Uuid) -> Result<Option<Receipt>, AppError> {
        ReceiptRepository.find_by_id(&mut *self.tx, id).await
    }

    async fn receipts(&mut self, lease_id: Uuid) -> Result<Vec<Receipt>, AppError> {
        ReceiptRepository.list_by_lease(&mut *self.tx, lease_id).await
    }

    async fn insert_receipt(&mut self, receipt: &Receipt) -> Result<bool, AppError> {
        ReceiptRepository.insert(&mut *self.tx, receipt).await
    }

    async fn repair_for_update(&mut self, id: Uuid) -> Result<Option<Repair>, AppError> {
        RepairRepository.find_for_update(&mut *self.tx, id).await
    }

    async fn repairs(&mut self, lease_id: Uuid) -> Result<Vec<Repair>, AppError> {
        RepairRepository.list_by_lease(&mut *self.tx, lease_id).await
    }

    async fn insert_repair(&mut self, repair: &Repair) -> Result<(), AppError> {
        RepairRepository.insert(&mut *self.tx, repair).await
    }

    async fn update_repair(&mut self, repair: &Repair) -> Result<(), AppError> {
        RepairRepository.update(&mut *self.tx, repair).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
