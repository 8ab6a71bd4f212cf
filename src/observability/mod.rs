//! Logging and metrics infrastructure.
//!
//! Structured logging via `tracing` and measurement recording via the
//! `metrics` facade. The crate records measurements unconditionally; the
//! embedding host decides whether to install a recorder and where the
//! numbers go.

pub mod logging;
pub mod metrics;

pub use logging::{ColorChoice, LogFormat, init_logging};
pub use metrics::describe_metrics;
