// src/common/ids.rs

//! Deterministic record ids. Every record that must be written at most once
//! per business event gets a UUID v5 derived from a readable synthetic key,
//! so a redelivered confirmation lands on the same row.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Namespace for all synthetic ledger ids.
pub const LEDGER_NAMESPACE: Uuid = Uuid::from_u128(0x6c65_6173_652d_6c65_6467_6572_2d76_3031);

pub fn synthetic_id(key: &str) -> Uuid {
    Uuid::new_v5(&LEDGER_NAMESPACE, key.as_bytes())
}

pub fn rent_invoice_key(lease_id: Uuid, period_start: DateTime<Utc>) -> String {
    format!("rent-{}-{}", lease_id, period_start.timestamp())
}

pub fn deposit_key(lease_id: Uuid) -> String {
    format!("deposit-{lease_id}")
}

pub fn annual_rent_key(lease_id: Uuid, confirmed_at: DateTime<Utc>) -> String {
    format!("annual-{}-{}", lease_id, confirmed_at.timestamp())
}

/// Receipt key for whatever `invoice_key` names.
pub fn receipt_key(invoice_key: &str) -> String {
    format!("receipt-{invoice_key}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn same_key_same_id() {
        let lease = Uuid::new_v4();
        assert_eq!(synthetic_id(&deposit_key(lease)), synthetic_id(&deposit_key(lease)));
        assert_ne!(
            synthetic_id(&deposit_key(lease)),
            synthetic_id(&receipt_key(&deposit_key(lease)))
        );
    }

    #[test]
    fn annual_keys_differ_across_years() {
        let lease = Uuid::new_v4();
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        assert_ne!(annual_rent_key(lease, first), annual_rent_key(lease, second));
        assert!(deposit_key(lease).starts_with("deposit-"));
    }
}
