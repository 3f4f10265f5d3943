//! Groups of components attached in one call.
//!
//! `()` is the empty bundle, any single [`Component`] is a bundle of one, and
//! tuples of up to eight components are bundles attached left to right.

use crate::{
    component::{Component, ComponentKind},
    entity::EntityId,
    storage::ComponentStore,
};

/// A set of components that can be attached to an entity together.
///
/// Elements are attached in order, so when two elements share a kind the
/// later one wins.
pub trait ComponentBundle: Send + 'static {
    /// Attach every component of the bundle to `entity`.
    fn attach_to(self, entity: EntityId, store: &mut ComponentStore);

    /// Kinds contained in the bundle, in attach order.
    fn kinds() -> Vec<ComponentKind>;
}

impl ComponentBundle for () {
    fn attach_to(self, _entity: EntityId, _store: &mut ComponentStore) {}

    fn kinds() -> Vec<ComponentKind> {
        Vec::new()
    }
}

impl<C: Component> ComponentBundle for C {
    fn attach_to(self, entity: EntityId, store: &mut ComponentStore) {
        store.attach(entity, self);
    }

    fn kinds() -> Vec<ComponentKind> {
        vec![ComponentKind::of::<C>()]
    }
}

macro_rules! impl_bundle_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentBundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn attach_to(self, entity: EntityId, store: &mut ComponentStore) {
                let ($($name,)+) = self;
                $(store.attach(entity, $name);)+
            }

            fn kinds() -> Vec<ComponentKind> {
                vec![$(ComponentKind::of::<$name>()),+]
            }
        }
    };
}

impl_bundle_for_tuple!(C0);
impl_bundle_for_tuple!(C0, C1);
impl_bundle_for_tuple!(C0, C1, C2);
impl_bundle_for_tuple!(C0, C1, C2, C3);
impl_bundle_for_tuple!(C0, C1, C2, C3, C4);
impl_bundle_for_tuple!(C0, C1, C2, C3, C4, C5);
impl_bundle_for_tuple!(C0, C1, C2, C3, C4, C5, C6);
impl_bundle_for_tuple!(C0, C1, C2, C3, C4, C5, C6, C7);
