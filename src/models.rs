pub mod billing;
pub mod invoice;
pub mod lease;
pub mod receipt;
pub mod repair;
pub mod settlement;
