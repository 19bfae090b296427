//! Persistence for the three ledger tables.
//!
//! Stores hold no state; they are plain async functions over a PostgreSQL
//! executor. Storage faults are returned unchanged as `sqlx::Error`.

pub mod accounts;
pub mod categories;
pub mod transactions;
