// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    db::{LedgerStore, PgLedgerStore},
    services::{BillingService, InvoiceService, LeaseService, PaymentReconciler, RepairService},
};

/// Process configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub bind_addr: String,
    /// Chain quoted in payment instructions when neither invoice nor lease name one.
    pub default_chain_id: String,
    /// `None` disables the background invoice sweep.
    pub sweep_interval: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let number = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("{key} must be a non-negative integer, got {raw:?}")),
                None => Ok(default),
            }
        };

        let max_connections = u32::try_from(number("DATABASE_MAX_CONNECTIONS", 5)?)
            .context("DATABASE_MAX_CONNECTIONS is too large")?;
        let acquire_timeout = Duration::from_secs(number("DATABASE_ACQUIRE_TIMEOUT_SECS", 3)?);
        let sweep_secs = number("INVOICE_SWEEP_INTERVAL_SECS", 3600)?;

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            default_chain_id: lookup("CHAIN_ID").unwrap_or_else(|| "1337".to_string()),
            sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub lease_service: LeaseService,
    pub invoice_service: InvoiceService,
    pub reconciler: PaymentReconciler,
    pub repair_service: RepairService,
    pub billing_service: BillingService,
}

impl AppState {
    /// Connects to PostgreSQL, applies pending migrations and wires the services.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .context("failed to connect to the database")?;

        tracing::info!("database connection established");

        sqlx::migrate!()
            .run(&db_pool)
            .await
            .context("failed to run database migrations")?;

        tracing::info!("database migrations applied");

        Ok(Self::with_store(config, Arc::new(PgLedgerStore::new(db_pool))))
    }

    /// Wires every service against `store`.
    pub fn with_store(config: AppConfig, store: Arc<dyn LedgerStore>) -> Self {
        Self {
            lease_service: LeaseService::new(store.clone()),
            invoice_service: InvoiceService::new(store.clone(), config.default_chain_id.clone()),
            reconciler: PaymentReconciler::new(store.clone()),
            repair_service: RepairService::new(store.clone()),
            billing_service: BillingService::new(store),
            config: Arc::new(config),
        }
    }
}
