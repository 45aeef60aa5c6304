// src/services/fee_policy.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::models::{
    billing::{BillingProfile, LateFeeType},
    invoice::{Invoice, InvoiceStanding},
};

/// Native precision of the on-chain unit (wei).
pub const MONEY_SCALE: u32 = 18;

fn grace_deadline(due_at: DateTime<Utc>, profile: &BillingProfile) -> DateTime<Utc> {
    due_at + Duration::days(i64::from(profile.grace_days.max(0)))
}

/// True once `now` is strictly past the due date plus the grace window.
pub fn is_overdue(due_at: DateTime<Utc>, profile: &BillingProfile, now: DateTime<Utc>) -> bool {
    now > grace_deadline(due_at, profile)
}

/// Whole days elapsed since the grace window closed; 0 while not overdue.
pub fn late_days(due_at: DateTime<Utc>, profile: &BillingProfile, now: DateTime<Utc>) -> i64 {
    if !is_overdue(due_at, profile, now) {
        return 0;
    }
    // Any part of a day past the deadline counts as one day late.
    let late = now - grace_deadline(due_at, profile);
    let days = late.num_days();
    if late > Duration::days(days) { days + 1 } else { days }
}

/// Late fee for one invoice. A fixed fee is flat: charged once, whatever the
/// number of late days.
pub fn compute_late_fee(profile: &BillingProfile, base_amount: Decimal, late_days: i64) -> Decimal {
    if late_days <= 0 {
        return Decimal::ZERO;
    }
    match profile.late_fee_type {
        LateFeeType::Percent => {
            (base_amount * profile.late_fee_value / Decimal::ONE_HUNDRED).round_dp(MONEY_SCALE)
        }
        LateFeeType::Fixed => profile.late_fee_value,
    }
}

/// Late-fee view of an invoice at `now`. Paid invoices are never overdue.
pub fn assess(invoice: &Invoice, profile: &BillingProfile, now: DateTime<Utc>) -> InvoiceStanding {
    let days = if invoice.is_paid() {
        0
    } else {
        late_days(invoice.due_at, profile, now)
    };
    let late_fee = compute_late_fee(profile, invoice.amount, days);

    InvoiceStanding {
        invoice: invoice.clone(),
        overdue: days > 0,
        late_days: days,
        assessed_late_fee: late_fee,
        total_due: if invoice.is_paid() { Decimal::ZERO } else { invoice.amount + late_fee },
    }
}
