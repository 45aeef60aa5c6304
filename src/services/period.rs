// src/services/period.rs

//! Billing period arithmetic. Everything here is UTC and pure.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::{invoice::InvoicePeriod, lease::Lease};

/// Due instants sit at noon so no timezone offset can move them to another day.
const DUE_HOUR: u32 = 12;

pub fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&at.date_naive().and_time(NaiveTime::MIN))
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    // 23:59:59 is always a valid time
    let time = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(time))
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    match first.checked_add_months(Months::new(1)) {
        Some(next_first) => next_first.signed_duration_since(first).num_days() as u32,
        None => 31,
    }
}

/// `min(max(due_day, 1), days in the month of `date`)`, applied to `date`.
pub fn clamp_due_day(date: NaiveDate, due_day: i32) -> NaiveDate {
    let max_day = days_in_month(date);
    let target = (due_day.max(1) as u32).min(max_day);
    date.with_day(target).unwrap_or(date)
}

/// Start of the period that follows the one beginning at `last_period_start`.
/// chrono clamps to the last day of shorter months (Jan 31 -> Feb 29).
pub fn next_period_start(last_period_start: DateTime<Utc>) -> DateTime<Utc> {
    let next = last_period_start
        .checked_add_months(Months::new(1))
        .unwrap_or(last_period_start);
    start_of_day(next)
}

/// Billing window starting at `period_start` (already start-of-day UTC).
pub fn build_period(lease: &Lease, period_start: DateTime<Utc>) -> InvoicePeriod {
    let start_date = period_start.date_naive();

    let end_date = start_date
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(start_date);

    let due_date = clamp_due_day(start_date, lease.due_day);
    let due_time = NaiveTime::from_hms_opt(DUE_HOUR, 0, 0).unwrap_or(NaiveTime::MIN);

    InvoicePeriod {
        period_start,
        period_end: end_of_day(end_date),
        due_at: Utc.from_utc_datetime(&due_date.and_time(due_time)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::lease_fixture;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
    }

    #[test]
    fn first_period_of_a_january_lease() {
        let lease = lease_fixture(utc(2024, 1, 1, 0, 0, 0), 5);
        let period = build_period(&lease, start_of_day(lease.start_at));

        assert_eq!(period.period_start, utc(2024, 1, 1, 0, 0, 0));
        assert_eq!(period.period_end, utc(2024, 1, 31, 23, 59, 59));
        assert_eq!(period.due_at, utc(2024, 1, 5, 12, 0, 0));
    }

    #[test]
    fn due_day_never_exceeds_month_length() {
        for year in [2023, 2024] {
            for month in 1..=12 {
                let first = date(year, month, 1);
                let max = days_in_month(first);
                for due_day in 1..=31 {
                    let clamped = clamp_due_day(first, due_day);
                    assert!(clamped.day() <= max, "{year}-{month} due {due_day}");
                    assert_eq!(clamped.day(), (due_day as u32).min(max));
                    assert_eq!(clamped.month(), month);
                }
            }
        }
    }

    #[test]
    fn clamps_31_to_short_months_and_floors_at_one() {
        assert_eq!(clamp_due_day(date(2024, 4, 1), 31), date(2024, 4, 30));
        assert_eq!(clamp_due_day(date(2024, 2, 10), 31), date(2024, 2, 29));
        assert_eq!(clamp_due_day(date(2023, 2, 10), 30), date(2023, 2, 28));
        assert_eq!(clamp_due_day(date(2024, 6, 10), 0), date(2024, 6, 1));
    }

    #[test]
    fn days_in_month_handles_leap_years_and_december() {
        assert_eq!(days_in_month(date(2024, 2, 1)), 29);
        assert_eq!(days_in_month(date(2023, 2, 15)), 28);
        assert_eq!(days_in_month(date(2024, 12, 31)), 31);
        assert_eq!(days_in_month(date(2024, 9, 30)), 30);
    }

    #[test]
    fn next_period_start_keeps_day_of_month() {
        let start = utc(2024, 1, 15, 0, 0, 0);
        let mut current = start;
        for n in 0..36 {
            assert_eq!(current.day(), 15, "after {n} periods");
            current = next_period_start(current);
        }
        assert_eq!(current, utc(2027, 1, 15, 0, 0, 0));
    }

    #[test]
    fn next_period_start_clamps_at_month_end() {
        let next = next_period_start(utc(2024, 1, 31, 0, 0, 0));
        assert_eq!(next, utc(2024, 2, 29, 0, 0, 0));
        // Day never exceeds the anchor day
        let mut current = utc(2024, 1, 31, 0, 0, 0);
        for _ in 0..24 {
            current = next_period_start(current);
            assert!(current.day() <= 31);
            assert!(current.day() >= 28);
        }
    }

    #[test]
    fn next_period_start_normalizes_to_midnight() {
        let next = next_period_start(utc(2024, 3, 10, 17, 45, 3));
        assert_eq!(next, utc(2024, 4, 10, 0, 0, 0));
    }

    #[test]
    fn period_end_is_last_second_before_next_start() {
        let lease = lease_fixture(utc(2024, 2, 10, 0, 0, 0), 31);
        let period = build_period(&lease, utc(2024, 2, 10, 0, 0, 0));

        assert_eq!(period.period_end, utc(2024, 3, 9, 23, 59, 59));
        // Due day 31 in February clamps to the 29th
        assert_eq!(period.due_at, utc(2024, 2, 29, 12, 0, 0));
        assert_eq!(
            next_period_start(period.period_start) - period.period_end,
            chrono::Duration::seconds(1)
        );
    }
}
