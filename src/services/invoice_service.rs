// src/services/invoice_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{error::AppError, ids},
    db::store::{LedgerStore, LedgerTx},
    models::{
        billing::BillingProfile,
        invoice::{Invoice, InvoiceKind, InvoiceStanding, InvoiceStatus, PaymentInstructions},
        lease::Lease,
    },
    services::{fee_policy, period},
};

/// Rent invoice for the period starting at `period_start`. The id is derived
/// from (lease, period) so regenerating a period always targets the same row.
pub(crate) fn rent_invoice(lease: &Lease, period_start: DateTime<Utc>, now: DateTime<Utc>) -> Invoice {
    let window = period::build_period(lease, period_start);
    Invoice {
        id: ids::synthetic_id(&ids::rent_invoice_key(lease.id, window.period_start)),
        lease_id: lease.id,
        kind: InvoiceKind::Rent,
        period_start: window.period_start,
        period_end: window.period_end,
        due_at: window.due_at,
        amount: lease.monthly_rent,
        late_fee: Decimal::ZERO,
        status: InvoiceStatus::Unpaid,
        chain_id: None,
        tx_hash: None,
        created_at: now,
    }
}

/// Where the next rent period of `lease` starts, given its latest invoice.
pub(crate) fn next_anchor(lease: &Lease, latest: Option<&Invoice>) -> DateTime<Utc> {
    match latest {
        Some(last) => period::next_period_start(last.period_start),
        None => period::start_of_day(lease.start_at),
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn LedgerStore>,
    default_chain_id: String,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn LedgerStore>, default_chain_id: impl Into<String>) -> Self {
        Self {
            store,
            default_chain_id: default_chain_id.into(),
        }
    }

    /// First invoice of a lease, anchored at the start of its first day.
    /// Runs inside the caller's transaction (lease creation).
    pub(crate) async fn generate_initial_invoice_in(
        tx: &mut dyn LedgerTx,
        lease: &Lease,
        profile: &BillingProfile,
    ) -> Result<Invoice, AppError> {
        let invoice = rent_invoice(lease, period::start_of_day(lease.start_at), Utc::now());

        if !tx.insert_invoice(&invoice).await? {
            tracing::debug!(lease_id = %lease.id, "initial invoice already present");
            let existing = tx.invoice(invoice.id).await?;
            return existing.ok_or_else(|| AppError::not_found("invoice", invoice.id));
        }

        tracing::info!(
            lease_id = %lease.id,
            invoice_id = %invoice.id,
            due_at = %invoice.due_at,
            grace_days = profile.grace_days,
            "initial invoice generated"
        );
        Ok(invoice)
    }

    pub async fn generate_initial_invoice(
        &self,
        lease: &Lease,
        profile: &BillingProfile,
    ) -> Result<Invoice, AppError> {
        let mut tx = self.store.begin().await?;
        let invoice = Self::generate_initial_invoice_in(&mut *tx, lease, profile).await?;
        tx.commit().await?;
        Ok(invoice)
    }

    /// Creates at most one invoice per lease: the period after the lease's
    /// latest invoice (or its first period), provided that period has begun
    /// and does not start after the lease ends. Re-running without time
    /// passing creates nothing new.
    pub async fn generate_due_invoices(
        &self,
        leases: &[Lease],
        profile: &BillingProfile,
        now: DateTime<Utc>,
    ) -> Result<Vec<Invoice>, AppError> {
        let mut created = Vec::new();

        for lease in leases {
            // One transaction per lease: leases are independent.
            let mut tx = self.store.begin().await?;
            let latest = tx.latest_rent_invoice(lease.id).await?;
            let anchor = next_anchor(lease, latest.as_ref());

            if anchor > lease.end_at {
                tracing::debug!(lease_id = %lease.id, anchor = %anchor, "lease ended; not invoicing");
                continue;
            }
            if anchor > now {
                continue;
            }

            let invoice = rent_invoice(lease, anchor, now);
            if tx.insert_invoice(&invoice).await? {
                tx.commit().await?;
                tracing::info!(
                    lease_id = %lease.id,
                    invoice_id = %invoice.id,
                    period_start = %invoice.period_start,
                    amount = %invoice.amount,
                    grace_days = profile.grace_days,
                    "invoice generated"
                );
                created.push(invoice);
            } else {
                // A concurrent run won the insert.
                tracing::debug!(lease_id = %lease.id, period_start = %anchor, "period already invoiced");
            }
        }

        Ok(created)
    }

    /// Invoices every lease (of one owner, or all owners), each against its
    /// owner's billing profile.
    pub async fn sweep(&self, owner_id: Option<Uuid>, now: DateTime<Utc>) -> Result<Vec<Invoice>, AppError> {
        let (leases, profiles) = {
            let mut tx = self.store.begin().await?;
            let leases = tx.leases(owner_id).await?;
            let mut profiles: HashMap<Uuid, BillingProfile> = HashMap::new();
            for lease in &leases {
                if !profiles.contains_key(&lease.owner_id) {
                    profiles.insert(lease.owner_id, tx.billing_profile(lease.owner_id).await?);
                }
            }
            (leases, profiles)
        };

        let mut by_owner: HashMap<Uuid, Vec<Lease>> = HashMap::new();
        for lease in leases {
            by_owner.entry(lease.owner_id).or_default().push(lease);
        }

        let mut created = Vec::new();
        for (owner, owner_leases) in by_owner {
            let profile = profiles
                .get(&owner)
                .cloned()
                .unwrap_or_else(|| BillingProfile::default_for(owner));
            created.extend(self.generate_due_invoices(&owner_leases, &profile, now).await?);
        }

        tracing::info!(created = created.len(), "invoice sweep finished");
        Ok(created)
    }

    /// Every invoice of a lease with its overdue status and late fee at `now`.
    pub async fn standings(&self, lease_id: Uuid, now: DateTime<Utc>) -> Result<Vec<InvoiceStanding>, AppError> {
        let mut tx = self.store.begin().await?;
        let lease = tx
            .lease(lease_id)
            .await?
            .ok_or_else(|| AppError::not_found("lease", lease_id))?;
        let profile = tx.billing_profile(lease.owner_id).await?;
        let invoices = tx.invoices(lease_id).await?;

        Ok(invoices
            .iter()
            .map(|invoice| fee_policy::assess(invoice, &profile, now))
            .collect())
    }

    pub async fn payment_instructions(&self, invoice_id: Uuid) -> Result<PaymentInstructions, AppError> {
        let mut tx = self.store.begin().await?;
        let invoice = tx
            .invoice(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found("invoice", invoice_id))?;
        let lease = tx
            .lease(invoice.lease_id)
            .await?
            .ok_or_else(|| AppError::not_found("lease", invoice.lease_id))?;

        let chain_id = invoice
            .chain_id
            .clone()
            .or(lease.chain_id)
            .unwrap_or_else(|| self.default_chain_id.clone());

        Ok(PaymentInstructions {
            invoice_id: invoice.id,
            lease_id: invoice.lease_id,
            amount: invoice.amount,
            period_start: invoice.period_start,
            period_end: invoice.period_end,
            due_at: invoice.due_at,
            chain_id,
        })
    }
}
