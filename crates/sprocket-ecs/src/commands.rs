//! Deferred world mutations.
//!
//! Processors queue commands while a tick runs; the world applies them in
//! FIFO order once every processor of the tick has finished. This is also
//! the way to mutate the world from inside a `modify_component` or
//! `for_each_component_mut` closure, which hold the store lock.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::warn;

use crate::{
    bundle::ComponentBundle,
    component::Component,
    entity::{EntityAllocator, EntityId},
    world::World,
};

type Command<I> = Box<dyn FnOnce(&World<I>) + Send>;

/// Queue of deferred world mutations.
pub struct Commands<I> {
    allocator: Arc<EntityAllocator>,
    queue: Mutex<Vec<Command<I>>>,
}

impl<I: Send + Sync + 'static> Commands<I> {
    pub(crate) fn new(allocator: Arc<EntityAllocator>) -> Self {
        Self {
            allocator,
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Queue an arbitrary mutation.
    pub fn push<F>(&self, command: F)
    where
        F: FnOnce(&World<I>) + Send + 'static,
    {
        self.queue.lock().push(Box::new(command));
    }

    /// Queue the creation of an entity.
    ///
    /// The ID is reserved immediately; the entity becomes live when the
    /// queue is applied.
    pub fn create_entity<B: ComponentBundle>(&self, bundle: B) -> EntityId {
        let entity = self.allocator.next();
        self.push(move |world| world.spawn_reserved(entity, bundle));
        entity
    }

    /// Queue the deletion of an entity.
    pub fn delete_entity(&self, entity: EntityId) {
        self.push(move |world| {
            world.delete_entity(entity);
        });
    }

    /// Queue attaching components to an entity.
    ///
    /// Dropped with a warning if the entity is not live when applied.
    pub fn add_components<B: ComponentBundle>(&self, entity: EntityId, bundle: B) {
        self.push(move |world| {
            if let Err(err) = world.add_components(entity, bundle) {
                warn!(%err, "dropping deferred add_components");
            }
        });
    }

    /// Queue removing the `T` component from an entity.
    pub fn remove_component<T: Component>(&self, entity: EntityId) {
        self.push(move |world| {
            if let Err(err) = world.remove_component::<T>(entity) {
                warn!(%err, "dropping deferred remove_component");
            }
        });
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Take every queued command, leaving the queue empty.
    pub(crate) fn drain(&self) -> Vec<Command<I>> {
        std::mem::take(&mut *self.queue.lock())
    }
}

impl<I> fmt::Debug for Commands<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commands")
            .field("queued", &self.queue.lock().len())
            .finish()
    }
}
