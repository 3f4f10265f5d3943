//! Component storage - one column per component kind.
//!
//! Each column maps entity IDs to the attached component of that kind.
//! Columns are type-erased behind [`ErasedColumn`] so the store can purge an
//! entity from every kind without knowing the concrete types.

use std::{any::Any, any::TypeId, collections::BTreeMap, fmt};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::{
    component::{Attached, Component, ComponentKind},
    entity::EntityId,
};

/// A column of components of a single kind, keyed by entity.
pub struct Column<T> {
    entries: BTreeMap<EntityId, Attached<T>>,
}

impl<T: Component> Column<T> {
    /// Create an empty column.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Get the component attached to `entity`.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&Attached<T>> {
        self.entries.get(&entity)
    }

    /// Get the component attached to `entity` mutably.
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut Attached<T>> {
        self.entries.get_mut(&entity)
    }

    /// Attach `component` to `entity`, returning the one it replaced.
    pub fn insert(&mut self, entity: EntityId, component: T) -> Option<Attached<T>> {
        self.entries.insert(entity, Attached::new(entity, component))
    }

    /// Remove the component attached to `entity`.
    pub fn remove(&mut self, entity: EntityId) -> Option<Attached<T>> {
        self.entries.remove(&entity)
    }

    /// Iterate over every component in ascending entity order.
    pub fn iter(&self) -> impl Iterator<Item = &Attached<T>> {
        self.entries.values()
    }

    /// Iterate mutably over every component in ascending entity order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Attached<T>> {
        self.entries.values_mut()
    }

    /// Number of components stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the column is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Component> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`Column`].
pub trait ErasedColumn: Send + Sync {
    /// Kind stored in this column.
    fn kind(&self) -> ComponentKind;

    /// Remove the component of `entity`, returning whether one was present.
    fn remove_entity(&mut self, entity: EntityId) -> bool;

    /// Check whether `entity` has a component in this column.
    fn contains(&self, entity: EntityId) -> bool;

    /// Number of components stored.
    fn len(&self) -> usize;

    /// Check if the column is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ErasedColumn for Column<T> {
    fn kind(&self) -> ComponentKind {
        ComponentKind::of::<T>()
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.entries.remove(&entity).is_some()
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Mapping from component kind to entity to component.
///
/// The store knows nothing about entity liveness; that is layered on top by
/// [`World`](crate::World). Every component reachable from the store carries
/// the entity ID it is stored under.
#[derive(Default)]
pub struct ComponentStore {
    columns: HashMap<TypeId, Box<dyn ErasedColumn>, FxBuildHasher>,
}

impl ComponentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.columns
            .get(&TypeId::of::<T>())
            .and_then(|column| column.as_any().downcast_ref())
    }

    fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        self.columns
            .get_mut(&TypeId::of::<T>())
            .and_then(|column| column.as_any_mut().downcast_mut())
    }

    fn column_or_insert<T: Component>(&mut self) -> &mut Column<T> {
        let column = self
            .columns
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Column::<T>::new()));

        match column.as_any_mut().downcast_mut() {
            Some(column) => column,
            // Columns are keyed by the TypeId of their element type.
            None => unreachable!("column registered under the wrong TypeId"),
        }
    }

    /// Attach `component` to `entity`, replacing any component of the same kind.
    ///
    /// Returns the replaced component, if any.
    pub fn attach<T: Component>(&mut self, entity: EntityId, component: T) -> Option<Attached<T>> {
        self.column_or_insert::<T>().insert(entity, component)
    }

    /// Remove the `T` component of `entity`, if present.
    pub fn detach<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        self.column_mut::<T>()?.remove(entity).map(Attached::into_inner)
    }

    /// Remove the component of the given kind from `entity`.
    ///
    /// Returns whether a component was removed.
    pub fn detach_kind(&mut self, entity: EntityId, kind: ComponentKind) -> bool {
        self.columns
            .get_mut(&kind.type_id())
            .is_some_and(|column| column.remove_entity(entity))
    }

    /// Get the `T` component of `entity`.
    #[must_use]
    pub fn get<T: Component>(&self, entity: EntityId) -> Option<&Attached<T>> {
        self.column::<T>()?.get(entity)
    }

    /// Get the `T` component of `entity` mutably.
    pub fn get_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut Attached<T>> {
        self.column_mut::<T>()?.get_mut(entity)
    }

    /// Check whether `entity` has a `T` component.
    #[must_use]
    pub fn contains<T: Component>(&self, entity: EntityId) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// Check whether `entity` has a component of the given kind.
    #[must_use]
    pub fn contains_kind(&self, entity: EntityId, kind: ComponentKind) -> bool {
        self.columns
            .get(&kind.type_id())
            .is_some_and(|column| column.contains(entity))
    }

    /// Iterate over every `T` component in ascending entity order.
    pub fn all<T: Component>(&self) -> impl Iterator<Item = &Attached<T>> {
        self.column::<T>().into_iter().flat_map(|column| column.iter())
    }

    /// Iterate mutably over every `T` component in ascending entity order.
    pub fn iter_mut<T: Component>(&mut self) -> impl Iterator<Item = &mut Attached<T>> {
        self.column_mut::<T>().into_iter().flat_map(|column| column.iter_mut())
    }

    /// Remove every component of `entity` across all kinds.
    ///
    /// Returns the number of components removed.
    pub fn purge(&mut self, entity: EntityId) -> usize {
        self.columns
            .values_mut()
            .map(|column| usize::from(column.remove_entity(entity)))
            .sum()
    }

    /// Number of `T` components stored.
    #[must_use]
    pub fn count<T: Component>(&self) -> usize {
        self.column::<T>().map_or(0, Column::len)
    }

    /// Every kind that has had a column created.
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.columns.values().map(|column| column.kind())
    }

    /// Kinds currently attached to `entity`.
    #[must_use]
    pub fn kinds_of(&self, entity: EntityId) -> Vec<ComponentKind> {
        self.columns
            .values()
            .filter(|column| column.contains(entity))
            .map(|column| column.kind())
            .collect()
    }

    /// Check whether no component is stored at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.values().all(|column| column.is_empty())
    }
}

impl fmt::Debug for ComponentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for column in self.columns.values() {
            map.entry(&column.kind().name(), &column.len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use sprocket_ecs_derive::Component;

    use super::*;

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Position {
        x: i64,
        y: i64,
    }

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Health(u32);

    fn e(raw: u64) -> EntityId {
        EntityId::from_raw(raw)
    }

    #[test]
    fn test_attach_sets_back_reference() {
        let mut store = ComponentStore::new();

        store.attach(e(4), Position { x: 1, y: 2 });

        let pos = store.get::<Position>(e(4)).unwrap();
        assert_eq!(pos.entity(), e(4));
        assert_eq!(pos.get(), &Position { x: 1, y: 2 });
    }

    #[test]
    fn test_attach_overwrites_same_kind() {
        let mut store = ComponentStore::new();

        assert!(store.attach(e(0), Health(10)).is_none());
        let previous = store.attach(e(0), Health(20)).unwrap();

        assert_eq!(previous.into_inner(), Health(10));
        assert_eq!(store.get::<Health>(e(0)).unwrap().get(), &Health(20));
        assert_eq!(store.count::<Health>(), 1);
    }

    #[test]
    fn test_detach_missing_is_noop() {
        let mut store = ComponentStore::new();

        assert_eq!(store.detach::<Health>(e(0)), None);
        assert!(!store.detach_kind(e(0), ComponentKind::of::<Health>()));

        store.attach(e(0), Health(1));
        assert!(!store.detach_kind(e(1), ComponentKind::of::<Health>()));
        assert!(store.detach_kind(e(0), ComponentKind::of::<Health>()));
        assert!(!store.contains::<Health>(e(0)));
    }

    #[test]
    fn test_all_is_ordered_by_entity() {
        let mut store = ComponentStore::new();

        store.attach(e(2), Health(2));
        store.attach(e(0), Health(0));
        store.attach(e(1), Health(1));

        let ids: Vec<u64> = store.all::<Health>().map(|h| h.entity().raw()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(store.all::<Position>().count(), 0);
    }

    #[test]
    fn test_purge_removes_every_kind() {
        let mut store = ComponentStore::new();

        store.attach(e(0), Position { x: 0, y: 0 });
        store.attach(e(0), Health(5));
        store.attach(e(1), Health(6));

        assert_eq!(store.purge(e(0)), 2);
        assert!(store.get::<Position>(e(0)).is_none());
        assert!(store.get::<Health>(e(0)).is_none());
        assert_eq!(store.count::<Health>(), 1);
        assert_eq!(store.purge(e(0)), 0);
    }

    #[test]
    fn test_iter_mut_updates_in_place() {
        let mut store = ComponentStore::new();

        store.attach(e(0), Position { x: 0, y: 0 });
        store.attach(e(1), Position { x: 69, y: 420 });

        for pos in store.iter_mut::<Position>() {
            pos.x += 1;
            pos.y += 1;
        }

        assert_eq!(store.get::<Position>(e(1)).unwrap().get(), &Position { x: 70, y: 421 });
    }

    #[test]
    fn test_kinds_of_entity() {
        let mut store = ComponentStore::new();

        store.attach(e(0), Position { x: 0, y: 0 });
        store.attach(e(0), Health(5));
        store.attach(e(1), Health(6));

        assert_eq!(store.kinds().count(), 2);
        assert_eq!(store.kinds_of(e(1)), vec![ComponentKind::of::<Health>()]);
        assert!(store.contains_kind(e(0), ComponentKind::of::<Position>()));
        assert!(!store.is_empty());

        store.purge(e(0));
        store.purge(e(1));
        assert!(store.is_empty());
    }
}
