pub mod error;
pub mod ids;
