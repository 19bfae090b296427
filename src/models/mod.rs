//! Data models representing database entities and API payloads.

/// Account model
pub mod account;
/// Category taxonomy model
pub mod category;
/// Decimal amount parsing
pub mod money;
/// Listing period filters
pub mod period;
/// Statistics queries and responses
pub mod stats;
/// Ledger transaction model
pub mod transaction;
