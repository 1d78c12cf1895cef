//! Infrastructure implementations for Taska.
//!
//! Concrete adapters behind the taska-core ports: the filesystem blob
//! store, the Dify chat backend client, the identity providers, and
//! config loading.

pub mod config;
pub mod dify;
pub mod identity;
pub mod storage;
