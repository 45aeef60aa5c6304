// src/services/reconciler.rs

use std::sync::Arc;

use chrono::{Months, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, ids},
    db::store::{LedgerStore, LedgerTx},
    models::{
        invoice::{Invoice, InvoiceKind, InvoiceStatus},
        lease::{Lease, LeaseStatus},
        receipt::{Receipt, Reconciliation},
        settlement::{AdHocKind, SettlementConfirmation, SettlementRef},
    },
    services::{deposit_ledger, period},
};

/// Turns confirmed on-chain payments into paid invoices and receipts.
/// Every call is an upsert keyed by deterministic ids, so a redelivered
/// confirmation is answered from what is already on file.
#[derive(Clone)]
pub struct PaymentReconciler {
    store: Arc<dyn LedgerStore>,
}

impl PaymentReconciler {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn reconcile_invoice(
        &self,
        invoice_id: Uuid,
        settlement: SettlementRef,
        paid_amount: Decimal,
    ) -> Result<Reconciliation, AppError> {
        settlement.validate()?;
        if paid_amount <= Decimal::ZERO {
            return Err(AppError::Validation("paid amount must be positive".into()));
        }

        let mut tx = self.store.begin().await?;
        let mut invoice = tx
            .invoice_for_update(invoice_id)
            .await?
            .ok_or_else(|| AppError::not_found("invoice", invoice_id))?;

        let receipt_key = receipt_key_of(&invoice);

        if let Some(existing) = invoice.settlement() {
            if existing != settlement {
                tracing::warn!(
                    invoice_id = %invoice_id,
                    existing_tx = %existing.tx_hash,
                    offered_tx = %settlement.tx_hash,
                    "invoice already settled by another transaction"
                );
                return Err(AppError::already_settled("invoice", invoice_id, &existing));
            }
            let receipt = tx
                .receipt(ids::synthetic_id(&receipt_key))
                .await?
                .ok_or_else(|| AppError::not_found("receipt", ids::synthetic_id(&receipt_key)))?;
            tracing::debug!(invoice_id = %invoice_id, "invoice reconciliation replayed");
            return Ok(Reconciliation { invoice, receipt, replayed: true });
        }

        let now = Utc::now();
        invoice.status = InvoiceStatus::Paid;
        invoice.chain_id = Some(settlement.chain_id.clone());
        invoice.tx_hash = Some(settlement.tx_hash.clone());
        tx.update_invoice(&invoice).await?;

        let receipt = Receipt {
            id: ids::synthetic_id(&receipt_key),
            lease_id: invoice.lease_id,
            invoice_id: Some(invoice.id),
            synthetic_key: receipt_key,
            paid_amount,
            paid_at: now,
            chain_id: settlement.chain_id,
            tx_hash: settlement.tx_hash,
            created_at: now,
        };
        tx.insert_receipt(&receipt).await?;

        activate_if_funded(&mut *tx, invoice.lease_id).await?;
        tx.commit().await?;

        tracing::info!(
            invoice_id = %invoice.id,
            lease_id = %invoice.lease_id,
            paid_amount = %receipt.paid_amount,
            tx_hash = %receipt.tx_hash,
            "invoice reconciled"
        );
        Ok(Reconciliation { invoice, receipt, replayed: false })
    }

    pub async fn reconcile_ad_hoc_payment(
        &self,
        lease_id: Uuid,
        kind: AdHocKind,
        confirmation: &SettlementConfirmation,
    ) -> Result<Reconciliation, AppError> {
        confirmation.validate()?;

        let mut tx = self.store.begin().await?;
        let lease = tx
            .lease_for_update(lease_id)
            .await?
            .ok_or_else(|| AppError::not_found("lease", lease_id))?;

        let reconciliation = match kind {
            AdHocKind::Deposit => reconcile_deposit(&mut *tx, &lease, confirmation).await?,
            AdHocKind::AnnualRent => reconcile_annual_rent(&mut *tx, &lease, confirmation).await?,
        };

        // A replayed credit may still have written the invoice row.
        tx.commit().await?;
        Ok(reconciliation)
    }
}

/// Key of the receipt that settles `invoice`. Ad hoc invoices reuse the key
/// their payment was recorded under; annual rent is keyed by its confirmation
/// instant, which is the invoice's `due_at`.
fn receipt_key_of(invoice: &Invoice) -> String {
    let invoice_key = match invoice.kind {
        InvoiceKind::Rent => invoice.id.to_string(),
        InvoiceKind::Deposit => ids::deposit_key(invoice.lease_id),
        InvoiceKind::AnnualRent => ids::annual_rent_key(invoice.lease_id, invoice.due_at),
    };
    ids::receipt_key(&invoice_key)
}

// ============================================================================
//  AD-HOC PAYMENTS
// ============================================================================

/// Writes the invoice as paid unless it already exists, in which case the
/// stored one is returned.
async fn upsert_paid_invoice(tx: &mut dyn LedgerTx, invoice: Invoice) -> Result<Invoice, AppError> {
    if let Some(existing) = tx.invoice_for_update(invoice.id).await? {
        return Ok(existing);
    }
    tx.insert_invoice(&invoice).await?;
    Ok(invoice)
}

fn paid_invoice(
    key: &str,
    lease: &Lease,
    kind: InvoiceKind,
    amount: Decimal,
    window: (chrono::DateTime<Utc>, chrono::DateTime<Utc>),
    confirmation: &SettlementConfirmation,
) -> Invoice {
    let (period_start, period_end) = window;
    Invoice {
        id: ids::synthetic_id(key),
        lease_id: lease.id,
        kind,
        period_start,
        period_end,
        due_at: confirmation.confirmed_at,
        amount,
        late_fee: Decimal::ZERO,
        status: InvoiceStatus::Paid,
        chain_id: Some(confirmation.settlement.chain_id.clone()),
        tx_hash: Some(confirmation.settlement.tx_hash.clone()),
        created_at: Utc::now(),
    }
}

async fn reconcile_deposit(
    tx: &mut dyn LedgerTx,
    lease: &Lease,
    confirmation: &SettlementConfirmation,
) -> Result<Reconciliation, AppError> {
    let key = ids::deposit_key(lease.id);
    let start = period::start_of_day(lease.start_at);
    let end = start + chrono::Duration::days(1) - chrono::Duration::seconds(1);
    let candidate = paid_invoice(
        &key,
        lease,
        InvoiceKind::Deposit,
        lease.security_deposit,
        (start, end),
        confirmation,
    );

    let invoice = upsert_paid_invoice(tx, candidate).await?;
    match invoice.settlement() {
        Some(existing) if existing != confirmation.settlement => {
            tracing::warn!(lease_id = %lease.id, existing_tx = %existing.tx_hash, "deposit invoice settled elsewhere");
            return Err(AppError::already_settled("invoice", invoice.id, &existing));
        }
        _ => {}
    }

    let credit = deposit_ledger::credit_in_tx(tx, lease.id, confirmation, Some(invoice.id)).await?;
    Ok(Reconciliation {
        invoice,
        receipt: credit.receipt,
        replayed: credit.replayed,
    })
}

async fn reconcile_annual_rent(
    tx: &mut dyn LedgerTx,
    lease: &Lease,
    confirmation: &SettlementConfirmation,
) -> Result<Reconciliation, AppError> {
    if confirmation.confirmed_amount <= Decimal::ZERO {
        return Err(AppError::Validation("confirmed amount must be positive".into()));
    }

    let key = ids::annual_rent_key(lease.id, confirmation.confirmed_at);
    let start = period::start_of_day(confirmation.confirmed_at);
    let end = start
        .checked_add_months(Months::new(12))
        .ok_or_else(|| AppError::Validation("confirmation date out of range".into()))?
        - chrono::Duration::seconds(1);
    let candidate = paid_invoice(
        &key,
        lease,
        InvoiceKind::AnnualRent,
        lease.annual_rent,
        (start, end),
        confirmation,
    );
    let invoice = upsert_paid_invoice(tx, candidate).await?;

    let receipt_key = ids::receipt_key(&key);
    let receipt_id = ids::synthetic_id(&receipt_key);
    if let Some(existing) = tx.receipt(receipt_id).await? {
        if existing.settlement() != confirmation.settlement {
            tracing::warn!(lease_id = %lease.id, existing_tx = %existing.tx_hash, "annual rent settled elsewhere");
            return Err(AppError::already_settled("invoice", invoice.id, &existing.settlement()));
        }
        tracing::debug!(lease_id = %lease.id, "annual rent confirmation replayed");
        return Ok(Reconciliation { invoice, receipt: existing, replayed: true });
    }

    let receipt = Receipt {
        id: receipt_id,
        lease_id: lease.id,
        invoice_id: Some(invoice.id),
        synthetic_key: receipt_key,
        paid_amount: confirmation.confirmed_amount,
        paid_at: confirmation.confirmed_at,
        chain_id: confirmation.settlement.chain_id.clone(),
        tx_hash: confirmation.settlement.tx_hash.clone(),
        created_at: Utc::now(),
    };
    tx.insert_receipt(&receipt).await?;
    activate_if_funded(tx, lease.id).await?;

    tracing::info!(
        lease_id = %lease.id,
        invoice_id = %invoice.id,
        paid_amount = %receipt.paid_amount,
        "annual rent reconciled"
    );
    Ok(Reconciliation { invoice, receipt, replayed: false })
}

/// A confirmed rent payment on a funded lease makes it active.
async fn activate_if_funded(tx: &mut dyn LedgerTx, lease_id: Uuid) -> Result<(), AppError> {
    let Some(mut lease) = tx.lease_for_update(lease_id).await? else {
        return Err(AppError::not_found("lease", lease_id));
    };
    if lease.status == LeaseStatus::DepositPaid && lease.advance(LeaseStatus::Active) {
        tx.update_lease(&lease).await?;
        tracing::info!(lease_id = %lease_id, "lease active");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory_store::MemoryLedgerStore,
        models::billing::BillingProfile,
        services::{
            deposit_ledger::DepositLedger,
            invoice_service::InvoiceService,
            test_support::{dec, lease_fixture, seed_lease},
        },
    };
    use chrono::{DateTime, TimeZone};

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn confirmation(tx_hash: &str, amount: &str) -> SettlementConfirmation {
        SettlementConfirmation {
            settlement: SettlementRef::new("1337", tx_hash),
            confirmed_amount: dec(amount),
            confirmed_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
        }
    }

    async fn lease_with_invoice(store: &MemoryLedgerStore) -> (Lease, Invoice) {
        let lease = seed_lease(store, lease_fixture(jan(1), 5)).await;
        let invoice = InvoiceService::new(Arc::new(store.clone()), "1337")
            .generate_initial_invoice(&lease, &BillingProfile::default_for(lease.owner_id))
            .await
            .unwrap();
        (lease, invoice)
    }

    async fn stored_lease(store: &MemoryLedgerStore, id: Uuid) -> Lease {
        let mut tx = store.begin().await.unwrap();
        tx.lease(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn reconciling_marks_invoice_paid_with_receipt() {
        let store = MemoryLedgerStore::new();
        let (_, invoice) = lease_with_invoice(&store).await;
        let reconciler = PaymentReconciler::new(Arc::new(store.clone()));

        let result = reconciler
            .reconcile_invoice(invoice.id, SettlementRef::new("1337", "0xrent-00001"), dec("1.0"))
            .await
            .unwrap();

        assert!(!result.replayed);
        assert!(result.invoice.is_paid());
        assert_eq!(result.receipt.invoice_id, Some(invoice.id));
        assert_eq!(result.receipt.synthetic_key, format!("receipt-{}", invoice.id));
    }

    #[tokio::test]
    async fn same_settlement_twice_is_replayed() {
        let store = MemoryLedgerStore::new();
        let (lease, invoice) = lease_with_invoice(&store).await;
        let reconciler = PaymentReconciler::new(Arc::new(store.clone()));
        let settlement = SettlementRef::new("1337", "0xrent-00001");

        let first = reconciler.reconcile_invoice(invoice.id, settlement.clone(), dec("1.0")).await.unwrap();
        let second = reconciler.reconcile_invoice(invoice.id, settlement, dec("1.0")).await.unwrap();

        assert!(second.replayed);
        assert_eq!(first.receipt.id, second.receipt.id);
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.receipts(lease.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_settlement_on_paid_invoice_conflicts() {
        let store = MemoryLedgerStore::new();
        let (_, invoice) = lease_with_invoice(&store).await;
        let reconciler = PaymentReconciler::new(Arc::new(store.clone()));

        reconciler
            .reconcile_invoice(invoice.id, SettlementRef::new("1337", "0xrent-00001"), dec("1.0"))
            .await
            .unwrap();
        let err = reconciler
            .reconcile_invoice(invoice.id, SettlementRef::new("1337", "0xrent-00002"), dec("1.0"))
            .await
            .unwrap_err();

        match err {
            AppError::AlreadySettled { existing_tx, .. } => assert_eq!(existing_tx, "0xrent-00001"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rent_payment_activates_funded_lease_only() {
        let store = MemoryLedgerStore::new();
        let (lease, invoice) = lease_with_invoice(&store).await;
        let reconciler = PaymentReconciler::new(Arc::new(store.clone()));

        // Pending lease stays pending.
        reconciler
            .reconcile_invoice(invoice.id, SettlementRef::new("1337", "0xrent-00001"), dec("1.0"))
            .await
            .unwrap();
        assert_eq!(stored_lease(&store, lease.id).await.status, LeaseStatus::Pending);

        DepositLedger::new(Arc::new(store.clone()))
            .credit_deposit(lease.id, &confirmation("0xdeposit-0001", "2.0"))
            .await
            .unwrap();
        let next = InvoiceService::new(Arc::new(store.clone()), "1337")
            .generate_due_invoices(&[lease.clone()], &BillingProfile::default_for(lease.owner_id), jan(1) + Months::new(1))
            .await
            .unwrap();
        reconciler
            .reconcile_invoice(next[0].id, SettlementRef::new("1337", "0xrent-00002"), dec("1.0"))
            .await
            .unwrap();

        assert_eq!(stored_lease(&store, lease.id).await.status, LeaseStatus::Active);
    }

    #[tokio::test]
    async fn ad_hoc_deposit_records_paid_invoice_and_credits() {
        let store = MemoryLedgerStore::new();
        let lease = seed_lease(&store, lease_fixture(jan(1), 5)).await;
        let reconciler = PaymentReconciler::new(Arc::new(store.clone()));
        let paid = confirmation("0xdeposit-0001", "2.0");

        let result = reconciler.reconcile_ad_hoc_payment(lease.id, AdHocKind::Deposit, &paid).await.unwrap();

        assert_eq!(result.invoice.id, ids::synthetic_id(&format!("deposit-{}", lease.id)));
        assert_eq!(result.invoice.kind, InvoiceKind::Deposit);
        assert_eq!(result.invoice.amount, dec("2.0"));
        assert_eq!(result.invoice.period_start, jan(1));
        assert_eq!(result.receipt.invoice_id, Some(result.invoice.id));

        let stored = stored_lease(&store, lease.id).await;
        assert_eq!(stored.deposit_balance, dec("2.0"));
        assert_eq!(stored.status, LeaseStatus::DepositPaid);

        let replay = reconciler.reconcile_ad_hoc_payment(lease.id, AdHocKind::Deposit, &paid).await.unwrap();
        assert!(replay.replayed);

        let other = confirmation("0xdeposit-0002", "2.0");
        let err = reconciler.reconcile_ad_hoc_payment(lease.id, AdHocKind::Deposit, &other).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadySettled { .. }));
    }

    #[tokio::test]
    async fn ad_hoc_annual_rent_is_idempotent_and_activates() {
        let store = MemoryLedgerStore::new();
        let lease = seed_lease(&store, lease_fixture(jan(1), 5)).await;
        let reconciler = PaymentReconciler::new(Arc::new(store.clone()));

        reconciler
            .reconcile_ad_hoc_payment(lease.id, AdHocKind::Deposit, &confirmation("0xdeposit-0001", "2.0"))
            .await
            .unwrap();
        let paid = confirmation("0xannual-0001", "12.0");
        let first = reconciler.reconcile_ad_hoc_payment(lease.id, AdHocKind::AnnualRent, &paid).await.unwrap();
        let second = reconciler.reconcile_ad_hoc_payment(lease.id, AdHocKind::AnnualRent, &paid).await.unwrap();

        assert_eq!(first.invoice.kind, InvoiceKind::AnnualRent);
        assert_eq!(first.invoice.amount, dec("12.0"));
        assert_eq!(first.invoice.period_start, jan(2));
        assert_eq!(first.invoice.period_end, Utc.with_ymd_and_hms(2025, 1, 1, 23, 59, 59).unwrap());
        assert!(second.replayed);
        assert_eq!(first.receipt.id, second.receipt.id);
        assert_eq!(stored_lease(&store, lease.id).await.status, LeaseStatus::Active);
    }

    #[tokio::test]
    async fn ad_hoc_invoices_replay_through_invoice_reconciliation() {
        let store = MemoryLedgerStore::new();
        let lease = seed_lease(&store, lease_fixture(jan(1), 5)).await;
        let reconciler = PaymentReconciler::new(Arc::new(store.clone()));

        let deposit = confirmation("0xdeposit-0001", "2.0");
        let first = reconciler.reconcile_ad_hoc_payment(lease.id, AdHocKind::Deposit, &deposit).await.unwrap();
        let again = reconciler
            .reconcile_invoice(first.invoice.id, deposit.settlement.clone(), dec("2.0"))
            .await
            .unwrap();
        assert!(again.replayed);
        assert_eq!(again.receipt.id, first.receipt.id);

        let annual = confirmation("0xannual-0001", "12.0");
        let first = reconciler.reconcile_ad_hoc_payment(lease.id, AdHocKind::AnnualRent, &annual).await.unwrap();
        let again = reconciler
            .reconcile_invoice(first.invoice.id, annual.settlement.clone(), dec("12.0"))
            .await
            .unwrap();
        assert!(again.replayed);
        assert_eq!(again.receipt.id, first.receipt.id);

        {
            let mut tx = store.begin().await.unwrap();
            assert_eq!(tx.receipts(lease.id).await.unwrap().len(), 2);
        }
        assert_eq!(stored_lease(&store, lease.id).await.deposit_balance, dec("2.0"));
    }

    #[tokio::test]
    async fn ad_hoc_deposit_after_direct_credit_stores_its_invoice() {
        let store = MemoryLedgerStore::new();
        let lease = seed_lease(&store, lease_fixture(jan(1), 5)).await;
        let paid = confirmation("0xdeposit-0001", "2.0");
        DepositLedger::new(Arc::new(store.clone())).credit_deposit(lease.id, &paid).await.unwrap();

        let reconciler = PaymentReconciler::new(Arc::new(store.clone()));
        let result = reconciler.reconcile_ad_hoc_payment(lease.id, AdHocKind::Deposit, &paid).await.unwrap();
        assert!(result.replayed);
        {
            let mut tx = store.begin().await.unwrap();
            let stored = tx.invoice(result.invoice.id).await.unwrap();
            assert_eq!(stored.as_ref(), Some(&result.invoice));
        }

        let again = reconciler
            .reconcile_invoice(result.invoice.id, paid.settlement.clone(), dec("2.0"))
            .await
            .unwrap();
        assert!(again.replayed);
        assert_eq!(stored_lease(&store, lease.id).await.deposit_balance, dec("2.0"));
    }

    #[tokio::test]
    async fn unknown_invoice_is_not_found() {
        let store = MemoryLedgerStore::new();
        let reconciler = PaymentReconciler::new(Arc::new(store));
        let err = reconciler
            .reconcile_invoice(Uuid::new_v4(), SettlementRef::new("1337", "0xrent-00001"), dec("1.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "invoice", .. }));
    }
}
