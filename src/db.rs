pub mod store;
pub use store::{LedgerStore, LedgerTx};
pub mod memory_store;
pub use memory_store::MemoryLedgerStore;
pub mod pg_store;
pub use pg_store::PgLedgerStore;

pub mod lease_repo;
pub mod invoice_repo;
pub mod receipt_repo;
pub mod repair_repo;
pub mod billing_repo;
