//! The set of selected elements, in selection order.

use cn_core::id::ElementId;
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: SmallVec<[ElementId; 4]>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The selected element when exactly one is selected.
    pub fn single(&self) -> Option<ElementId> {
        match self.ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn set_only(&mut self, id: ElementId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Shift-click: add if absent, remove if present.
    pub fn toggle(&mut self, id: ElementId) {
        if let Some(pos) = self.ids.iter().position(|s| *s == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id);
        }
    }

    /// Add ids not already present, keeping order.
    pub fn extend_unique(&mut self, ids: impl IntoIterator<Item = ElementId>) {
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids for which `keep` is false (e.g. elements that no longer exist).
    pub fn retain(&mut self, mut keep: impl FnMut(ElementId) -> bool) {
        self.ids.retain(|id| keep(*id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_adds_and_removes() {
        let a = ElementId::intern("sel_a");
        let b = ElementId::intern("sel_b");
        let mut sel = Selection::new();
        sel.toggle(a);
        sel.toggle(b);
        assert_eq!(sel.ids(), &[a, b]);
        assert_eq!(sel.single(), None);
        sel.toggle(a);
        assert_eq!(sel.single(), Some(b));
    }

    #[test]
    fn extend_unique_keeps_base_order() {
        let a = ElementId::intern("sel_c");
        let b = ElementId::intern("sel_d");
        let mut sel = Selection::new();
        sel.set_only(b);
        sel.extend_unique([a, b, a]);
        assert_eq!(sel.ids(), &[b, a]);
    }
}
