//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, validation, and balance bookkeeping.

pub mod balance_effect;
pub mod ledger_service;
pub mod stats;
