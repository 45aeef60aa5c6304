pub mod period;
pub mod fee_policy;
pub mod invoice_service;
pub use invoice_service::InvoiceService;
pub mod deposit_ledger;
pub use deposit_ledger::DepositLedger;
pub mod reconciler;
pub use reconciler::PaymentReconciler;
pub mod lease_service;
pub use lease_service::LeaseService;
pub mod repair_service;
pub use repair_service::RepairService;
pub mod billing_service;
pub use billing_service::BillingService;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;
