//! Session persistence services.
//!
//! Two stores share the blob store underneath: the record store owns the
//! full per-session transcript documents, the index store owns the
//! per-user listing document the history screen reads.

pub mod index_store;
pub mod record_store;
pub mod title;

/// Attempts per read-modify-write cycle before a conflicted key is
/// reported to the caller. With one successful write per concurrent
/// writer, a writer can lose at most one race per peer, so three
/// attempts absorb two simultaneous peers.
pub(crate) const CAS_ATTEMPTS: u32 = 3;
