//! HTTP middleware for the catalog service.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added by the binary)
//! 2. `TraceLayer` (request span with `request_id`, status, latency)
//! 3. Request ID (fills the span's `request_id`, echoes it in the response)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
