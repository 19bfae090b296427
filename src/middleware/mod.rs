//! HTTP middleware components.
//!
//! Middleware run before route handlers. They can:
//! - Resolve who a request acts for
//! - Short-circuit requests that lack it

/// Owner id resolution from the gateway header
pub mod owner;
