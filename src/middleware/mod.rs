//! Cross-cutting request concerns applied by the server around every handler.
//!
//! - [`trace`]: per-request span with method and path; status and latency
//!   recorded when the response is ready.

pub mod trace;
