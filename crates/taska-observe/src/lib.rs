//! Observability for Taska.
//!
//! Tracing subscriber setup (structured logs, optional OpenTelemetry
//! export) and the GenAI semantic convention attribute names used on
//! chat spans.

pub mod genai_attrs;
pub mod tracing_setup;
