//! Shared domain types for Taska.
//!
//! This crate contains the core domain types used across the Taska service:
//! session records, index entries, chat backend shapes, identity, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod backend;
pub mod config;
pub mod error;
pub mod identity;
pub mod session;
