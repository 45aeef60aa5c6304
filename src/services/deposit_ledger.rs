// src/services/deposit_ledger.rs

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{error::AppError, ids},
    db::store::{LedgerStore, LedgerTx},
    models::{
        lease::{Lease, LeaseStatus},
        receipt::Receipt,
        repair::{DeductionOutcome, Repair},
        settlement::SettlementConfirmation,
    },
};

/// Result of crediting a deposit. `replayed` means the same settlement had
/// already been credited and nothing changed.
#[derive(Debug, Clone)]
pub struct DepositCredit {
    pub lease: Lease,
    pub receipt: Receipt,
    pub replayed: bool,
}

// ============================================================================
//  IN-TRANSACTION STEPS
// ============================================================================

/// Credits the security deposit inside `tx`. The deposit receipt id is fixed
/// per lease, so at most one deposit is ever credited.
pub(crate) async fn credit_in_tx(
    tx: &mut dyn LedgerTx,
    lease_id: Uuid,
    confirmation: &SettlementConfirmation,
    invoice_id: Option<Uuid>,
) -> Result<DepositCredit, AppError> {
    confirmation.validate()?;
    if confirmation.confirmed_amount <= Decimal::ZERO {
        return Err(AppError::Validation("confirmed amount must be positive".into()));
    }

    let mut lease = tx
        .lease_for_update(lease_id)
        .await?
        .ok_or_else(|| AppError::not_found("lease", lease_id))?;

    let key = ids::receipt_key(&ids::deposit_key(lease_id));
    let receipt_id = ids::synthetic_id(&key);

    if let Some(existing) = tx.receipt(receipt_id).await? {
        if existing.settlement() != confirmation.settlement {
            tracing::warn!(
                lease_id = %lease_id,
                existing_tx = %existing.tx_hash,
                offered_tx = %confirmation.settlement.tx_hash,
                "deposit already settled by another transaction"
            );
            return Err(AppError::already_settled("deposit", lease_id, &existing.settlement()));
        }
        // Balance is left alone: deductions since then must not be undone.
        tracing::debug!(lease_id = %lease_id, "deposit confirmation replayed");
        return Ok(DepositCredit { lease, receipt: existing, replayed: true });
    }

    let receipt = Receipt {
        id: receipt_id,
        lease_id,
        invoice_id,
        synthetic_key: key,
        paid_amount: confirmation.confirmed_amount,
        paid_at: confirmation.confirmed_at,
        chain_id: confirmation.settlement.chain_id.clone(),
        tx_hash: confirmation.settlement.tx_hash.clone(),
        created_at: Utc::now(),
    };
    tx.insert_receipt(&receipt).await?;

    lease.deposit_balance = confirmation.confirmed_amount.min(lease.security_deposit);
    lease.advance(LeaseStatus::DepositPaid);
    tx.update_lease(&lease).await?;

    tracing::info!(
        lease_id = %lease_id,
        balance = %lease.deposit_balance,
        tx_hash = %receipt.tx_hash,
        "deposit credited"
    );
    Ok(DepositCredit { lease, receipt, replayed: false })
}

/// Charges `cost` against the deposit of the repair's lease. `repair` must
/// already be locked by the caller; the lease is locked here.
pub(crate) async fn deduct_in_tx(
    tx: &mut dyn LedgerTx,
    repair: &mut Repair,
    cost: Decimal,
) -> Result<DeductionOutcome, AppError> {
    if let Some(amount) = repair.deducted_amount {
        tracing::debug!(repair_id = %repair.id, deduction = %amount, "repair already deducted");
        return Ok(DeductionOutcome::AlreadyDeducted { amount });
    }

    let mut lease = tx
        .lease_for_update(repair.lease_id)
        .await?
        .ok_or_else(|| AppError::not_found("lease", repair.lease_id))?;

    if lease.deposit_balance <= Decimal::ZERO || cost <= Decimal::ZERO {
        tracing::debug!(
            repair_id = %repair.id,
            balance = %lease.deposit_balance,
            cost = %cost,
            "nothing to deduct"
        );
        return Ok(DeductionOutcome::NothingToDeduct);
    }

    let amount = lease.deposit_balance.min(cost);
    lease.deposit_balance -= amount;
    tx.update_lease(&lease).await?;

    repair.deducted_amount = Some(amount);
    repair.deducted_at = Some(Utc::now());
    tx.update_repair(repair).await?;

    tracing::info!(
        lease_id = %lease.id,
        repair_id = %repair.id,
        deduction = %amount,
        remaining = %lease.deposit_balance,
        "deposit deducted for repair"
    );
    Ok(DeductionOutcome::Deducted { amount, remaining: lease.deposit_balance })
}

// ============================================================================
//  SERVICE
// ============================================================================

#[derive(Clone)]
pub struct DepositLedger {
    store: Arc<dyn LedgerStore>,
}

impl DepositLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn credit_deposit(
        &self,
        lease_id: Uuid,
        confirmation: &SettlementConfirmation,
    ) -> Result<DepositCredit, AppError> {
        let mut tx = self.store.begin().await?;
        let credit = credit_in_tx(&mut *tx, lease_id, confirmation, None).await?;
        if !credit.replayed {
            tx.commit().await?;
        }
        Ok(credit)
    }

    pub async fn deduct_for_repair(&self, repair_id: Uuid, cost: Decimal) -> Result<DeductionOutcome, AppError> {
        let mut tx = self.store.begin().await?;
        let mut repair = tx
            .repair_for_update(repair_id)
            .await?
            .ok_or_else(|| AppError::not_found("repair", repair_id))?;

        let outcome = deduct_in_tx(&mut *tx, &mut repair, cost).await?;
        if matches!(outcome, DeductionOutcome::Deducted { .. }) {
            tx.commit().await?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory_store::MemoryLedgerStore,
        models::{
            repair::{RepairPriority, RepairStatus},
            settlement::SettlementRef,
        },
        services::test_support::{dec, lease_fixture, seed_lease},
    };
    use chrono::TimeZone;

    fn confirmation(tx_hash: &str, amount: &str) -> SettlementConfirmation {
        SettlementConfirmation {
            settlement: SettlementRef::new("1337", tx_hash),
            confirmed_amount: dec(amount),
            confirmed_at: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
        }
    }

    async fn seed_repair(store: &MemoryLedgerStore, lease_id: Uuid, cost: &str) -> Repair {
        let now = Utc::now();
        let repair = Repair {
            id: Uuid::new_v4(),
            lease_id,
            title: "Broken window".into(),
            detail: "Cracked pane in the bedroom".into(),
            priority: RepairPriority::Normal,
            category: "general".into(),
            status: RepairStatus::Resolved,
            cost: Some(dec(cost)),
            scheduled_at: None,
            assigned_to: None,
            deducted_amount: None,
            deducted_at: None,
            created_at: now,
            updated_at: now,
        };
        let mut tx = store.begin().await.unwrap();
        tx.insert_repair(&repair).await.unwrap();
        tx.commit().await.unwrap();
        repair
    }

    async fn funded_lease(store: &MemoryLedgerStore) -> (DepositLedger, Lease) {
        let lease = seed_lease(store, lease_fixture(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 5)).await;
        let ledger = DepositLedger::new(Arc::new(store.clone()));
        ledger.credit_deposit(lease.id, &confirmation("0xdeposit-0001", "2.0")).await.unwrap();
        (ledger, lease)
    }

    async fn balance(store: &MemoryLedgerStore, lease_id: Uuid) -> Decimal {
        let mut tx = store.begin().await.unwrap();
        tx.lease(lease_id).await.unwrap().unwrap().deposit_balance
    }

    #[tokio::test]
    async fn credit_sets_balance_and_advances_lease() {
        let store = MemoryLedgerStore::new();
        let lease = seed_lease(&store, lease_fixture(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 5)).await;
        let ledger = DepositLedger::new(Arc::new(store.clone()));

        let credit = ledger.credit_deposit(lease.id, &confirmation("0xdeposit-0001", "2.0")).await.unwrap();

        assert!(!credit.replayed);
        assert_eq!(credit.lease.deposit_balance, dec("2.0"));
        assert_eq!(credit.lease.status, LeaseStatus::DepositPaid);
        assert_eq!(credit.receipt.synthetic_key, format!("receipt-deposit-{}", lease.id));
    }

    #[tokio::test]
    async fn credit_caps_at_security_deposit() {
        let store = MemoryLedgerStore::new();
        let lease = seed_lease(&store, lease_fixture(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 5)).await;
        let ledger = DepositLedger::new(Arc::new(store.clone()));

        ledger.credit_deposit(lease.id, &confirmation("0xdeposit-0001", "5.0")).await.unwrap();
        assert_eq!(balance(&store, lease.id).await, dec("2.0"));
    }

    #[tokio::test]
    async fn credit_twice_writes_one_receipt() {
        let store = MemoryLedgerStore::new();
        let (ledger, lease) = funded_lease(&store).await;

        let again = ledger.credit_deposit(lease.id, &confirmation("0xdeposit-0001", "2.0")).await.unwrap();
        assert!(again.replayed);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.receipts(lease.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replayed_credit_does_not_restore_deducted_balance() {
        let store = MemoryLedgerStore::new();
        let (ledger, lease) = funded_lease(&store).await;
        let repair = seed_repair(&store, lease.id, "1.5").await;

        ledger.deduct_for_repair(repair.id, dec("1.5")).await.unwrap();
        ledger.credit_deposit(lease.id, &confirmation("0xdeposit-0001", "2.0")).await.unwrap();

        assert_eq!(balance(&store, lease.id).await, dec("0.5"));
    }

    #[tokio::test]
    async fn credit_with_other_settlement_is_rejected() {
        let store = MemoryLedgerStore::new();
        let (ledger, lease) = funded_lease(&store).await;

        let err = ledger
            .credit_deposit(lease.id, &confirmation("0xdeposit-9999", "2.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadySettled { entity: "deposit", .. }));
    }

    #[tokio::test]
    async fn credit_rejects_non_positive_amounts() {
        let store = MemoryLedgerStore::new();
        let lease = seed_lease(&store, lease_fixture(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 5)).await;
        let ledger = DepositLedger::new(Arc::new(store.clone()));

        let err = ledger.credit_deposit(lease.id, &confirmation("0xdeposit-0001", "0")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = ledger.credit_deposit(lease.id, &confirmation("0xshort", "1.0")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationErrors(_)));
    }

    #[tokio::test]
    async fn deductions_cap_at_remaining_balance() {
        let store = MemoryLedgerStore::new();
        let (ledger, lease) = funded_lease(&store).await;
        let a = seed_repair(&store, lease.id, "1.5").await;
        let b = seed_repair(&store, lease.id, "1.0").await;

        let first = ledger.deduct_for_repair(a.id, dec("1.5")).await.unwrap();
        assert_eq!(first, DeductionOutcome::Deducted { amount: dec("1.5"), remaining: dec("0.5") });

        let second = ledger.deduct_for_repair(b.id, dec("1.0")).await.unwrap();
        assert_eq!(second, DeductionOutcome::Deducted { amount: dec("0.5"), remaining: dec("0") });
        assert_eq!(balance(&store, lease.id).await, Decimal::ZERO);

        let c = seed_repair(&store, lease.id, "0.3").await;
        assert_eq!(ledger.deduct_for_repair(c.id, dec("0.3")).await.unwrap(), DeductionOutcome::NothingToDeduct);
    }

    #[tokio::test]
    async fn deducting_twice_charges_once() {
        let store = MemoryLedgerStore::new();
        let (ledger, lease) = funded_lease(&store).await;
        let repair = seed_repair(&store, lease.id, "0.7").await;

        ledger.deduct_for_repair(repair.id, dec("0.7")).await.unwrap();
        let again = ledger.deduct_for_repair(repair.id, dec("0.7")).await.unwrap();

        assert_eq!(again, DeductionOutcome::AlreadyDeducted { amount: dec("0.7") });
        assert_eq!(balance(&store, lease.id).await, dec("1.3"));
    }

    #[tokio::test]
    async fn zero_cost_deducts_nothing() {
        let store = MemoryLedgerStore::new();
        let (ledger, lease) = funded_lease(&store).await;
        let repair = seed_repair(&store, lease.id, "0").await;

        let outcome = ledger.deduct_for_repair(repair.id, Decimal::ZERO).await.unwrap();
        assert_eq!(outcome, DeductionOutcome::NothingToDeduct);

        let mut tx = store.begin().await.unwrap();
        let stored = tx.repair_for_update(repair.id).await.unwrap().unwrap();
        assert!(stored.deducted_amount.is_none());
    }
}
