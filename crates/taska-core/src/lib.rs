//! Business logic and port definitions for Taska.
//!
//! This crate defines the "ports" (blob store, chat backend, identity
//! provider traits) that the infrastructure layer implements, plus the
//! session record/index stores and the chat turn orchestrator built on
//! top of them. It depends only on `taska-types` -- never on
//! `taska-infra` or any HTTP/filesystem crate.

pub mod chat;
pub mod identity;
pub mod session;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
