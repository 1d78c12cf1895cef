//! Chat turn orchestration.
//!
//! `backend` defines the trait to the external chat service, `turn` the
//! service that drives one full turn: uploads, backend call, then the
//! session record and index writes.

pub mod backend;
pub mod turn;
