//! ## hushlist-core::blocklist
//! **Set of blocked application identifiers shared between callback contexts**
//!
//! The host event callback and the command worker both touch this set, possibly
//! from different threads. Every operation takes the lock exactly once, so a
//! lookup sees either the whole of a mutation or none of it.

use std::collections::HashSet;

use parking_lot::RwLock;

#[derive(Debug, Default)]
pub struct BlockList {
    apps: RwLock<HashSet<String>>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `app_id`. Returns `true` when it was not already blocked.
    pub fn add(&self, app_id: &str) -> bool {
        self.apps.write().insert(app_id.to_owned())
    }

    /// Removes `app_id`. Returns `true` when it was blocked.
    pub fn remove(&self, app_id: &str) -> bool {
        self.apps.write().remove(app_id)
    }

    #[inline]
    pub fn contains(&self, app_id: &str) -> bool {
        self.apps.read().contains(app_id)
    }

    pub fn len(&self) -> usize {
        self.apps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.read().is_empty()
    }

    /// Sorted copy of the current members.
    pub fn snapshot(&self) -> Vec<String> {
        let mut apps: Vec<String> = self.apps.read().iter().cloned().collect();
        apps.sort_unstable();
        apps
    }

    pub fn clear(&self) {
        self.apps.write().clear();
    }
}
