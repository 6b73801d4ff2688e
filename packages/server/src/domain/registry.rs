//! Client registry abstraction.
//!
//! The domain defines the contract; `infrastructure::registry` provides the
//! implementation (dependency inversion).

use super::{endpoint::Endpoint, value_object::ClientName};

/// Who is connected: one live endpoint per client name.
///
/// Every operation is a point operation that never awaits, so it is safe to
/// call from any number of sessions concurrently.
#[cfg_attr(test, mockall::automock)]
pub trait ClientRegistry: Send + Sync {
    /// Insert or replace. Returns the superseded endpoint, which the caller
    /// must close.
    fn register(&self, name: ClientName, endpoint: Endpoint) -> Option<Endpoint>;

    /// Remove `name` only while it still maps to exactly `endpoint`.
    fn remove_if_current(&self, name: &ClientName, endpoint: &Endpoint) -> Option<Endpoint>;

    fn lookup(&self, name: &ClientName) -> Option<Endpoint>;

    /// Sorted snapshot of the registered names.
    fn names(&self) -> Vec<ClientName>;

    /// Snapshot of every entry except `excluded`, taken before the caller
    /// touches any endpoint.
    fn snapshot_except(&self, excluded: &ClientName) -> Vec<(ClientName, Endpoint)>;

    /// Remove and return every entry.
    fn drain(&self) -> Vec<(ClientName, Endpoint)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
