// src/services/scheduler.rs

use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};

use crate::services::invoice_service::InvoiceService;

/// Periodically invoices every lease whose next period has begun.
///
/// A failed sweep is logged and retried on the next tick; it never stops
/// the loop. Each sweep creates at most one invoice per lease, so a server
/// that was down for months catches up one period per tick.
pub async fn run_invoice_scheduler(invoices: InvoiceService, every: Duration) {
    tracing::info!(interval_secs = every.as_secs(), "invoice scheduler started");

    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match invoices.sweep(None, Utc::now()).await {
            Ok(created) if !created.is_empty() => {
                tracing::info!(created = created.len(), "scheduler: invoices generated");
            }
            Ok(_) => {}
            Err(err) => tracing::error!(error = %err, "scheduler: invoice sweep failed"),
        }
    }
}
