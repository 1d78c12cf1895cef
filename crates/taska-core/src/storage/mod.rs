//! Storage abstractions for Taska.
//!
//! Defines the blob store trait all durable state goes through and the
//! storage key layout shared by every caller. Implementations live in
//! taska-infra.

pub mod blob_store;
pub mod keys;
