//! Dify chat backend client.

pub mod client;
pub mod types;

pub use client::DifyBackend;
