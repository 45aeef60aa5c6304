pub mod leases;
pub mod invoices;
pub mod repairs;
pub mod settings;
