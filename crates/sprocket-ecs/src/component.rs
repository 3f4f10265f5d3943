//! Component kinds and the stored form of a component.
//!
//! Components are plain data records. Each concrete type is one *kind*;
//! an entity holds at most one component of a given kind.

use std::{
    any::TypeId,
    fmt,
    hash::{Hash, Hasher},
    ops::{Deref, DerefMut},
};

use crate::entity::EntityId;

/// Marker trait for types that can be attached to entities.
///
/// Implement it with `#[derive(Component)]`. Components are returned to
/// callers as owned clones, hence the `Clone` bound.
///
/// # Example
///
/// ```
/// use sprocket_ecs::Component;
///
/// #[derive(Component, Clone, Debug, PartialEq)]
/// struct Position {
///     x: i64,
///     y: i64,
/// }
/// ```
pub trait Component: Clone + Send + Sync + 'static {}

/// Runtime tag identifying a component kind.
///
/// Two kinds are equal iff they describe the same Rust type.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    /// The kind of `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Rust `TypeId` of the kind.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full type name, for logs and debugging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Check if this kind is `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.name)
    }
}

/// A component together with the entity it is attached to.
///
/// The owning entity is fixed when the store attaches the component and
/// cannot be changed afterwards. The value itself is reachable through
/// `Deref`/`DerefMut`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Attached<T> {
    entity: EntityId,
    component: T,
}

impl<T> Attached<T> {
    pub(crate) const fn new(entity: EntityId, component: T) -> Self {
        Self { entity, component }
    }

    /// The entity this component belongs to.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        self.entity
    }

    /// Borrow the component value.
    #[must_use]
    pub const fn get(&self) -> &T {
        &self.component
    }

    /// Borrow the component value mutably.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.component
    }

    /// Detach the value from its entity.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.component
    }
}

impl<T> Deref for Attached<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.component
    }
}

impl<T> DerefMut for Attached<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.component
    }
}

impl<T: fmt::Debug> fmt::Debug for Attached<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attached")
            .field("entity", &self.entity)
            .field("component", &self.component)
            .finish()
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

    #[derive(Component, Clone)]
    struct Velocity {
        x: i64,
        y: i64,
    }

    #[test]
    fn test_kind_identity() {
        let pos = ComponentKind::of::<Position>();
        let vel = ComponentKind::of::<Velocity>();

        assert_eq!(pos, ComponentKind::of::<Position>());
        assert_ne!(pos, vel);
        assert!(pos.is::<Position>());
        assert!(!pos.is::<Velocity>());
        assert!(pos.name().ends_with("Position"));
    }

    #[test]
    fn test_attached_back_reference() {
        let mut attached = Attached::new(EntityId::from_raw(3), Position { x: 1, y: 2 });

        attached.x += 10;

        assert_eq!(attached.entity(), EntityId::from_raw(3));
        assert_eq!(attached.get(), &Position { x: 11, y: 2 });
        assert_eq!(attached.into_inner(), Position { x: 11, y: 2 });
    }
}
