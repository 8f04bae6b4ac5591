//! Ordered entity collections with a single selection cursor.
//!
//! Order is display order and, for graphs, chart z-order. The store knows
//! nothing about references between entities; callers unlink before removal.

use kt_core::{EntityId, IdSequence};

/// Something that lives in an [`EntityStore`].
pub trait Entity {
    type Id: EntityId;

    fn id(&self) -> Self::Id;
}

/// Result of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The entity moved to the given index.
    Moved { to: usize },
    /// The entity was already first (move up) or last (move down).
    AtBoundary,
    NotFound,
}

impl MoveOutcome {
    pub fn moved(self) -> bool {
        matches!(self, MoveOutcome::Moved { .. })
    }
}

#[derive(Debug, Clone)]
pub struct EntityStore<T: Entity> {
    items: Vec<T>,
    selected: Option<T::Id>,
    ids: IdSequence,
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            ids: IdSequence::new(),
        }
    }

    /// Append an entity built around a freshly allocated handle.
    pub fn insert(&mut self, build: impl FnOnce(T::Id) -> T) -> T::Id {
        let id = self.ids.next::<T::Id>();
        self.items.push(build(id));
        id
    }

    /// Number of handles ever allocated, used for default names.
    pub fn issued(&self) -> u32 {
        self.ids.issued()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.items.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.items.iter_mut().find(|e| e.id() == id)
    }

    pub fn at(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: T::Id) -> Option<usize> {
        self.items.iter().position(|e| e.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn ids(&self) -> Vec<T::Id> {
        self.items.iter().map(Entity::id).collect()
    }

    /// Remove by handle. Clears the selection when the removed entity was selected.
    pub fn remove(&mut self, id: T::Id) -> Option<T> {
        let index = self.index_of(id)?;
        self.remove_at(index)
    }

    /// Remove by position. Clears the selection when the removed entity was selected.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.items.len() {
            return None;
        }
        let removed = self.items.remove(index);
        if self.selected == Some(removed.id()) {
            self.selected = None;
        }
        Some(removed)
    }

    pub fn move_up(&mut self, id: T::Id) -> MoveOutcome {
        match self.index_of(id) {
            None => MoveOutcome::NotFound,
            Some(0) => MoveOutcome::AtBoundary,
            Some(i) => {
                self.items.swap(i, i - 1);
                MoveOutcome::Moved { to: i - 1 }
            }
        }
    }

    pub fn move_down(&mut self, id: T::Id) -> MoveOutcome {
        match self.index_of(id) {
            None => MoveOutcome::NotFound,
            Some(i) if i + 1 == self.items.len() => MoveOutcome::AtBoundary,
            Some(i) => {
                self.items.swap(i, i + 1);
                MoveOutcome::Moved { to: i + 1 }
            }
        }
    }

    pub fn selected(&self) -> Option<T::Id> {
        self.selected
    }

    pub fn selected_entity(&self) -> Option<&T> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Point the cursor at `id`, or clear it with `None`.
    ///
    /// Returns false (and leaves the cursor alone) when `id` is not in the store.
    pub fn select(&mut self, id: Option<T::Id>) -> bool {
        match id {
            Some(id) if !self.contains(id) => false,
            _ => {
                self.selected = id;
                true
            }
        }
    }

    pub fn select_first(&mut self) -> Option<T::Id> {
        self.selected = self.items.first().map(Entity::id);
        self.selected
    }

    pub fn select_last(&mut self) -> Option<T::Id> {
        self.selected = self.items.last().map(Entity::id);
        self.selected
    }

    /// Select the entity at `index`, clamped to the last one; `None` when empty.
    pub fn select_nearest(&mut self, index: usize) -> Option<T::Id> {
        let last = self.items.len().checked_sub(1)?;
        self.selected = Some(self.items[index.min(last)].id());
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kt_core::TraceId;

    #[derive(Debug)]
    struct Item(TraceId);

    impl Entity for Item {
        type Id = TraceId;
        fn id(&self) -> TraceId {
            self.0
        }
    }

    fn store_of(n: usize) -> (EntityStore<Item>, Vec<TraceId>) {
        let mut store = EntityStore::new();
        let ids = (0..n).map(|_| store.insert(Item)).collect();
        (store, ids)
    }

    #[test]
    fn moves_at_boundaries_are_noops() {
        let (mut store, ids) = store_of(3);
        assert_eq!(store.move_up(ids[0]), MoveOutcome::AtBoundary);
        assert_eq!(store.move_down(ids[2]), MoveOutcome::AtBoundary);
        assert_eq!(store.ids(), ids);
    }

    #[test]
    fn move_keeps_selection() {
        let (mut store, ids) = store_of(3);
        store.select(Some(ids[1]));
        assert_eq!(store.move_up(ids[1]), MoveOutcome::Moved { to: 0 });
        assert_eq!(store.selected(), Some(ids[1]));
        assert_eq!(store.ids(), vec![ids[1], ids[0], ids[2]]);
    }

    #[test]
    fn removing_selected_clears_cursor() {
        let (mut store, ids) = store_of(2);
        store.select(Some(ids[0]));
        assert!(store.remove(ids[1]).is_some());
        assert_eq!(store.selected(), Some(ids[0]));
        assert!(store.remove_at(0).is_some());
        assert_eq!(store.selected(), None);
        assert!(store.remove_at(0).is_none());
    }

    #[test]
    fn handles_are_not_reused() {
        let (mut store, ids) = store_of(1);
        store.remove(ids[0]);
        let fresh = store.insert(Item);
        assert_ne!(fresh, ids[0]);
        assert!(store.get(ids[0]).is_none());
    }

    #[test]
    fn select_unknown_is_rejected() {
        let (mut store, ids) = store_of(1);
        store.remove(ids[0]);
        assert!(!store.select(Some(ids[0])));
        assert!(store.select(None));
        assert_eq!(store.select_first(), None);
    }

    #[test]
    fn select_nearest_clamps() {
        let (mut store, ids) = store_of(3);
        assert_eq!(store.select_nearest(7), Some(ids[2]));
        assert_eq!(store.select_nearest(0), Some(ids[0]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use kt_core::GraphId;
    use proptest::prelude::*;

    #[derive(Debug)]
    struct Item(GraphId);

    impl Entity for Item {
        type Id = GraphId;
        fn id(&self) -> GraphId {
            self.0
        }
    }

    proptest! {
        #[test]
        fn moves_preserve_members_and_selection(
            n in 1usize..8,
            ops in prop::collection::vec((any::<bool>(), 0usize..8), 0..40),
        ) {
            let mut store = EntityStore::new();
            let ids: Vec<GraphId> = (0..n).map(|_| store.insert(Item)).collect();

            for (up, pick) in ops {
                let id = ids[pick % n];
                store.select(Some(id));
                let before = store.index_of(id).unwrap();
                let outcome = if up { store.move_up(id) } else { store.move_down(id) };
                match outcome {
                    MoveOutcome::Moved { to } => {
                        prop_assert_eq!(store.index_of(id), Some(to));
                        prop_assert_eq!(to.abs_diff(before), 1);
                    }
                    MoveOutcome::AtBoundary => {
                        prop_assert_eq!(store.index_of(id), Some(before));
                        prop_assert!(before == 0 || before == n - 1);
                    }
                    MoveOutcome::NotFound => prop_assert!(false, "id vanished"),
                }
                prop_assert_eq!(store.selected(), Some(id));
                prop_assert_eq!(store.len(), n);
            }

            let mut sorted = store.ids();
            sorted.sort();
            prop_assert_eq!(sorted, ids);
        }
    }
}
