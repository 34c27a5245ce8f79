//! HTTP middleware: identity resolution, rate limiting, tracing.

pub mod identity;
pub mod rate_limit;
pub mod tracing;
