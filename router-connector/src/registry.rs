use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::endpoint::{Endpoint, FailoverList};

/// Holds the failover list learned by one connector together with the
/// connector's own configured endpoint.
///
/// The list sits behind an [`ArcSwap`]: an update is a single pointer swap,
/// so readers see either the old or the new list in full and are never held
/// up by the writer.
#[derive(Debug)]
pub struct FailoverRegistry {
    primary: Endpoint,
    current: ArcSwap<FailoverList>,
}

impl FailoverRegistry {
    pub fn new(primary: Endpoint) -> Self {
        Self {
            primary,
            current: ArcSwap::from_pointee(FailoverList::empty()),
        }
    }

    pub fn primary(&self) -> &Endpoint {
        &self.primary
    }

    /// Replaces the stored list, an empty list included. Lists are never
    /// merged.
    pub fn update(&self, list: FailoverList) {
        self.current.store(Arc::new(list));
    }

    pub fn snapshot(&self) -> Arc<FailoverList> {
        self.current.load_full()
    }

    /// Full search order: the primary endpoint first, then the failover list.
    pub fn next_candidates(&self) -> Vec<Endpoint> {
        let current = self.current.load();
        let mut candidates = Vec::with_capacity(current.len() + 1);
        candidates.push(self.primary.clone());
        candidates.extend(current.endpoints().iter().cloned());
        candidates
    }
}
