//! Selection state: references to drawables targeted by editor operations.

use crate::shapes::ShapeId;

/// The set of selected drawables, in selection order.
///
/// Holds ids only; the scene owns the drawables. The most recently selected id
/// is the *active* drawable used by single-target operations such as reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ShapeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection with a single drawable.
    pub fn set_single(&mut self, id: ShapeId) {
        self.ids.clear();
        self.ids.push(id);
    }

    /// Add a drawable, making it active. Re-adding moves it to the active slot.
    pub fn add(&mut self, id: ShapeId) {
        self.ids.retain(|&s| s != id);
        self.ids.push(id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.ids.contains(&id)
    }

    /// The active drawable, if any.
    pub fn active(&self) -> Option<ShapeId> {
        self.ids.last().copied()
    }

    /// Selected ids in selection order.
    pub fn ids(&self) -> &[ShapeId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_starts_empty() {
        let selection = Selection::new();
        assert!(selection.is_empty());
        assert_eq!(selection.active(), None);
    }

    #[test]
    fn test_set_single_replaces() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut selection = Selection::new();
        selection.add(a);
        selection.set_single(b);
        assert_eq!(selection.ids(), &[b]);
        assert_eq!(selection.active(), Some(b));
    }

    #[test]
    fn test_add_moves_to_active() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let mut selection = Selection::new();
        selection.add(a);
        selection.add(b);
        selection.add(a);
        assert_eq!(selection.ids(), &[b, a]);
        assert_eq!(selection.active(), Some(a));
    }
}
