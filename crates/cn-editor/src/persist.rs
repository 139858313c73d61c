//! Dirty-flag gating between local edits and the store.
//!
//! Every local change bumps `revision`. A save carries the revision it was
//! taken at, and only that revision is marked saved when it completes, so
//! an edit that lands while a save is in flight keeps the document dirty.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveGate {
    revision: u64,
    saved: u64,
    sent: u64,
}

impl SaveGate {
    /// Record a local change. Returns the new revision.
    pub fn touch(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn saved_revision(&self) -> u64 {
        self.saved
    }

    /// Local changes exist that the store has not acknowledged.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved
    }

    /// The current revision, if it has not been handed to the saver yet.
    pub fn take_unsent(&mut self) -> Option<u64> {
        if self.sent == self.revision {
            return None;
        }
        self.sent = self.revision;
        Some(self.revision)
    }

    /// Forget the changes made after `revision`, provided none of them was
    /// handed to the saver. Used when a gesture leaves the document as it was.
    pub fn rewind(&mut self, revision: u64) {
        if revision >= self.sent && revision >= self.saved && revision <= self.revision {
            self.revision = revision;
        }
    }

    /// Acknowledge a completed save of `revision`. Out-of-order or unknown
    /// acknowledgements are ignored.
    pub fn mark_saved(&mut self, revision: u64) {
        if revision > self.saved && revision <= self.revision {
            self.saved = revision;
        }
    }
}
