//! Linear undo/redo history of diagram snapshots.
//!
//! The history is a list of committed `{elements, connections}` snapshots
//! and a cursor. Entry 0 is the state the document was opened with.
//! Snapshots share structure with the document (`Arc` + copy-on-write), so
//! keeping 200 of them costs only the elements that actually changed.

use cn_core::model::DiagramSnapshot;

pub struct History {
    entries: Vec<DiagramSnapshot>,
    cursor: usize,
    /// Maximum number of undo steps.
    max_depth: usize,
}

impl History {
    pub fn new(initial: DiagramSnapshot, max_depth: usize) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state after a committed operation. Drops any redo
    /// entries. Returns `false` (and records nothing) when `snapshot` equals
    /// the current entry.
    pub fn commit(&mut self, snapshot: DiagramSnapshot) -> bool {
        if self.entries[self.cursor] == snapshot {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        if self.entries.len() > self.max_depth + 1 {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
        log::debug!("history commit ({} undo step(s))", self.cursor);
        true
    }

    pub fn undo(&mut self) -> Option<DiagramSnapshot> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn redo(&mut self) -> Option<DiagramSnapshot> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The snapshot the document should match when no gesture is pending.
    pub fn current(&self) -> &DiagramSnapshot {
        &self.entries[self.cursor]
    }

    /// Forget everything and start over from `initial` (e.g. after a
    /// remote document replaced the local one).
    pub fn reset(&mut self, initial: DiagramSnapshot) {
        self.entries.clear();
        self.entries.push(initial);
        self.cursor = 0;
    }
}
