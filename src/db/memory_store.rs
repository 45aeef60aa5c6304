// src/db/memory_store.rs

//! In-process [`LedgerStore`]. Transactions are fully serialized by one async
//! mutex and work on a private copy of the state that replaces the shared
//! state on commit, so an abandoned transaction leaves nothing behind.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::{LedgerStore, LedgerTx},
    models::{
        billing::BillingProfile,
        invoice::{Invoice, InvoiceKind},
        lease::Lease,
        receipt::Receipt,
        repair::Repair,
    },
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    leases: HashMap<Uuid, Lease>,
    profiles: HashMap<Uuid, BillingProfile>,
    invoices: HashMap<Uuid, Invoice>,
    receipts: HashMap<Uuid, Receipt>,
    repairs: HashMap<Uuid, Repair>,
}

#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryLedgerTx { guard, working }))
    }
}

pub struct MemoryLedgerTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

fn sorted<T, K: Ord>(items: impl Iterator<Item = T>, key: impl FnMut(&T) -> K) -> Vec<T> {
    let mut out: Vec<T> = items.collect();
    out.sort_by_key(key);
    out
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn lease(&mut self, id: Uuid) -> Result<Option<Lease>, AppError> {
        Ok(self.working.leases.get(&id).cloned())
    }

    async fn lease_for_update(&mut self, id: Uuid) -> Result<Option<Lease>, AppError> {
        // The whole store is already held exclusively.
        self.lease(id).await
    }

    async fn leases(&mut self, owner_id: Option<Uuid>) -> Result<Vec<Lease>, AppError> {
        let matching = self
            .working
            .leases
            .values()
            .filter(|l| owner_id.is_none_or(|owner| l.owner_id == owner))
            .cloned();
        Ok(sorted(matching, |l| (l.created_at, l.id)))
    }

    async fn insert_lease(&mut self, lease: &Lease) -> Result<(), AppError> {
        if self.working.leases.contains_key(&lease.id) {
            return Err(AppError::Validation(format!("lease {} already exists", lease.id)));
        }
        self.working.leases.insert(lease.id, lease.clone());
        Ok(())
    }

    async fn update_lease(&mut self, lease: &Lease) -> Result<(), AppError> {
        let stored = self
            .working
            .leases
            .get_mut(&lease.id)
            .ok_or_else(|| AppError::not_found("lease", lease.id))?;
        *stored = Lease { updated_at: Utc::now(), ..lease.clone() };
        Ok(())
    }

    async fn billing_profile(&mut self, owner_id: Uuid) -> Result<BillingProfile, AppError> {
        Ok(self
            .working
            .profiles
            .get(&owner_id)
            .cloned()
            .unwrap_or_else(|| BillingProfile::default_for(owner_id)))
    }

    async fn save_billing_profile(&mut self, profile: &BillingProfile) -> Result<BillingProfile, AppError> {
        let saved = BillingProfile { updated_at: Some(Utc::now()), ..profile.clone() };
        self.working.profiles.insert(saved.owner_id, saved.clone());
        Ok(saved)
    }

    async fn invoice(&mut self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        Ok(self.working.invoices.get(&id).cloned())
    }

    async fn invoice_for_update(&mut self, id: Uuid) -> Result<Option<Invoice>, AppError> {
        self.invoice(id).await
    }

    async fn invoices(&mut self, lease_id: Uuid) -> Result<Vec<Invoice>, AppError> {
        let matching = self
            .working
            .invoices
            .values()
            .filter(|i| i.lease_id == lease_id)
            .cloned();
        Ok(sorted(matching, |i| (i.period_start, i.created_at)))
    }

    async fn latest_rent_invoice(&mut self, lease_id: Uuid) -> Result<Option<Invoice>, AppError> {
        Ok(self
            .working
            .invoices
            .values()
            .filter(|i| i.lease_id == lease_id && i.kind == InvoiceKind::Rent)
            .max_by_key(|i| i.period_start)
            .cloned())
    }

    async fn insert_invoice(&mut self, invoice: &Invoice) -> Result<bool, AppError> {
        let duplicate_period = invoice.kind == InvoiceKind::Rent
            && self.working.invoices.values().any(|i| {
                i.lease_id == invoice.lease_id
                    && i.kind == InvoiceKind::Rent
                    && i.period_start == invoice.period_start
            });
        if duplicate_period || self.working.invoices.contains_key(&invoice.id) {
            return Ok(false);
        }
        self.working.invoices.insert(invoice.id, invoice.clone());
        Ok(true)
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> Result<(), AppError> {
        let stored = self
            .working
            .invoices
            .get_mut(&invoice.id)
            .ok_or_else(|| AppError::not_found("invoice", invoice.id))?;
        *stored = invoice.clone();
        Ok(())
    }

    async fn receipt(&mut self, id: Uuid) -> Result<Option<Receipt>, AppError> {
        Ok(self.working.receipts.get(&id).cloned())
    }

    async fn receipts(&mut self, lease_id: Uuid) -> Result<Vec<Receipt>, AppError> {
        let matching = self
            .working
            .receipts
            .values()
            .filter(|r| r.lease_id == lease_id)
            .cloned();
        Ok(sorted(matching, |r| (r.paid_at, r.id)))
    }

    async fn insert_receipt(&mut self, receipt: &Receipt) -> Result<bool, AppError> {
        if self.working.receipts.contains_key(&receipt.id) {
            return Ok(false);
        }
        self.working.receipts.insert(receipt.id, receipt.clone());
        Ok(true)
    }

    async fn repair_for_update(&mut self, id: Uuid) -> Result<Option<Repair>, AppError> {
        Ok(self.working.repairs.get(&id).cloned())
    }

    async fn repairs(&mut self, lease_id: Uuid) -> Result<Vec<Repair>, AppError> {
        let matching = self
            .working
            .repairs
            .values()
            .filter(|r| r.lease_id == lease_id)
            .cloned();
        Ok(sorted(matching, |r| (r.created_at, r.id)))
    }

    async fn insert_repair(&mut self, repair: &Repair) -> Result<(), AppError> {
        self.working.repairs.insert(repair.id, repair.clone());
        Ok(())
    }

    async fn update_repair(&mut self, repair: &Repair) -> Result<(), AppError> {
        let stored = self
            .working
            .repairs
            .get_mut(&repair.id)
            .ok_or_else(|| AppError::not_found("repair", repair.id))?;
        *stored = Repair { updated_at: Utc::now(), ..repair.clone() };
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryLedgerTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
