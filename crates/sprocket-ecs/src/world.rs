//! World - the container for all ECS data.
//!
//! The World owns the live-entity set, the component store, the processor
//! registry and the deferred command queue. Every operation takes `&self`;
//! entity and component state sits behind one `RwLock`, so each operation is
//! atomic with respect to every other, including ones issued by processors
//! running in parallel.
//!
//! Closures passed to `modify_component` and `for_each_component_mut` run
//! while that lock is held. Calling back into the same world from inside one
//! panics instead of deadlocking; during a tick the panic is reported as a
//! processor failure. Use [`Commands`] for follow-up mutations.
//!
//! Entity-scoped mutations (`add_components`, `remove_components`,
//! `remove_component`, `modify_component`) require a live entity and fail with
//! [`EcsError::UnknownEntity`] otherwise. Reads never fail: a non-live entity
//! simply has no components.

use std::{
    cell::RefCell,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use hashbrown::HashSet;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxBuildHasher;
use tracing::{debug, debug_span, trace};

use crate::{
    bundle::ComponentBundle,
    commands::Commands,
    component::{Attached, Component, ComponentKind},
    entity::{EntityAllocator, EntityId},
    error::{EcsError, EcsResult},
    processor::{Processor, ProcessorRef, ProcessorRegistry, ProcessorResult},
    schedule::{self, SchedulingMode, TickContext, TickReport},
    storage::ComponentStore,
};

/// Construction options for a [`World`].
#[derive(Debug, Clone, Default)]
pub struct WorldConfig {
    /// How `tick` runs processors.
    pub mode: SchedulingMode,
    /// Allocator to draw entity IDs from. A fresh one is created when `None`.
    pub allocator: Option<Arc<EntityAllocator>>,
}

impl WorldConfig {
    /// Use the given scheduling mode.
    pub fn mode(mut self, mode: SchedulingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Share an allocator with other worlds.
    pub fn allocator(mut self, allocator: Arc<EntityAllocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }
}

#[derive(Default)]
struct WorldState {
    live: HashSet<EntityId, FxBuildHasher>,
    store: ComponentStore,
}

thread_local! {
    /// Worlds whose store lock this thread holds while running a caller's closure.
    static LOCKED_STORES: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a world's store as locked by the current thread until dropped.
struct StoreCallback {
    world: usize,
}

impl StoreCallback {
    fn enter(world: usize) -> Self {
        LOCKED_STORES.with_borrow_mut(|locked| locked.push(world));
        Self { world }
    }

    fn is_active(world: usize) -> bool {
        LOCKED_STORES.with_borrow(|locked| locked.contains(&world))
    }
}

impl Drop for StoreCallback {
    fn drop(&mut self) {
        LOCKED_STORES.with_borrow_mut(|locked| {
            if let Some(idx) = locked.iter().rposition(|&world| world == self.world) {
                locked.remove(idx);
            }
        });
    }
}

/// The ECS world.
///
/// `I` is the input snapshot type handed to processors on every tick.
pub struct World<I = ()> {
    allocator: Arc<EntityAllocator>,
    state: RwLock<WorldState>,
    processors: RwLock<ProcessorRegistry<I>>,
    commands: Commands<I>,
    mode: SchedulingMode,
    ticks: AtomicU64,
}

impl<I> World<I> {
    fn store_id(&self) -> usize {
        std::ptr::from_ref(&self.state).addr()
    }

    fn check_not_in_callback(&self) {
        assert!(
            !StoreCallback::is_active(self.store_id()),
            "world accessed from inside one of its own component closures; \
             queue the change on `commands()` instead"
        );
    }

    fn read_state(&self) -> RwLockReadGuard<'_, WorldState> {
        self.check_not_in_callback();
        self.state.read()
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, WorldState> {
        self.check_not_in_callback();
        self.state.write()
    }
}

impl<I: Send + Sync + 'static> Default for World<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Send + Sync + 'static> World<I> {
    /// Create an empty world with sequential scheduling.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create an empty world with the given scheduling mode.
    #[must_use]
    pub fn with_mode(mode: SchedulingMode) -> Self {
        Self::with_config(WorldConfig::default().mode(mode))
    }

    /// Create an empty world from a config.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let allocator = config.allocator.unwrap_or_default();

        Self {
            commands: Commands::new(Arc::clone(&allocator)),
            allocator,
            state: RwLock::new(WorldState::default()),
            processors: RwLock::new(ProcessorRegistry::new()),
            mode: config.mode,
            ticks: AtomicU64::new(0),
        }
    }

    /// Scheduling mode used by [`tick`](Self::tick).
    #[must_use]
    pub const fn mode(&self) -> SchedulingMode {
        self.mode
    }

    /// The allocator entity IDs are drawn from.
    #[must_use]
    pub const fn allocator(&self) -> &Arc<EntityAllocator> {
        &self.allocator
    }

    // ==================== Entity Operations ====================

    /// Create a live entity carrying `bundle`.
    ///
    /// Components are attached in bundle order; a later component of the
    /// same kind overwrites an earlier one. Pass `()` for an empty entity.
    pub fn create_entity<B: ComponentBundle>(&self, bundle: B) -> EntityId {
        let entity = self.allocator.next();
        self.spawn_reserved(entity, bundle);
        entity
    }

    /// Make an already allocated ID live and attach `bundle`.
    pub(crate) fn spawn_reserved<B: ComponentBundle>(&self, entity: EntityId, bundle: B) {
        let mut guard = self.write_state();
        let state = &mut *guard;

        state.live.insert(entity);
        bundle.attach_to(entity, &mut state.store);

        trace!(%entity, kinds = ?B::kinds(), "created entity");
    }

    /// Delete an entity and every component attached to it.
    ///
    /// Returns `false` (and does nothing) if the entity is not live.
    pub fn delete_entity(&self, entity: EntityId) -> bool {
        let mut guard = self.write_state();
        let state = &mut *guard;

        if !state.live.remove(&entity) {
            return false;
        }
        let purged = state.store.purge(entity);

        trace!(%entity, purged, "deleted entity");
        true
    }

    /// Check if an entity is live.
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.read_state().live.contains(&entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.read_state().live.len()
    }

    /// Every live entity, in ascending ID order.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        let mut entities: Vec<_> = self.read_state().live.iter().copied().collect();
        entities.sort_unstable();
        entities
    }

    // ==================== Component Operations ====================

    /// Attach `bundle` to a live entity, overwriting components of the same kinds.
    pub fn add_components<B: ComponentBundle>(&self, entity: EntityId, bundle: B) -> EcsResult<()> {
        let mut guard = self.write_state();
        let state = &mut *guard;

        if !state.live.contains(&entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        bundle.attach_to(entity, &mut state.store);
        Ok(())
    }

    /// Detach the given kinds from a live entity.
    ///
    /// Kinds the entity does not have are skipped. Returns how many
    /// components were removed.
    pub fn remove_components(&self, entity: EntityId, kinds: &[ComponentKind]) -> EcsResult<usize> {
        let mut guard = self.write_state();
        let state = &mut *guard;

        if !state.live.contains(&entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        Ok(kinds
            .iter()
            .filter(|&&kind| state.store.detach_kind(entity, kind))
            .count())
    }

    /// Detach and return the `T` component of a live entity.
    pub fn remove_component<T: Component>(&self, entity: EntityId) -> EcsResult<Option<T>> {
        let mut state = self.write_state();

        if !state.live.contains(&entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        Ok(state.store.detach::<T>(entity))
    }

    /// Get a copy of the `T` component of an entity.
    ///
    /// Returns `None` when the entity is not live or has no `T`.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Option<Attached<T>> {
        let state = self.read_state();

        if !state.live.contains(&entity) {
            return None;
        }
        state.store.get::<T>(entity).cloned()
    }

    /// Check whether an entity has a `T` component.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        let state = self.read_state();
        state.live.contains(&entity) && state.store.contains::<T>(entity)
    }

    /// Copies of every `T` component, in ascending entity order.
    #[must_use]
    pub fn get_components<T: Component>(&self) -> Vec<Attached<T>> {
        self.read_state().store.all::<T>().cloned().collect()
    }

    /// Number of `T` components.
    #[must_use]
    pub fn component_count<T: Component>(&self) -> usize {
        self.read_state().store.count::<T>()
    }

    /// Mutate the `T` component of a live entity in place.
    ///
    /// Returns `Ok(None)` when the entity has no `T`. `f` runs under the
    /// store's write lock and must not call back into this world; queue
    /// follow-up mutations on [`commands`](Self::commands) instead.
    ///
    /// # Panics
    ///
    /// If `f` calls into this world.
    pub fn modify_component<T, R, F>(&self, entity: EntityId, f: F) -> EcsResult<Option<R>>
    where
        T: Component,
        F: FnOnce(&mut T) -> R,
    {
        let mut state = self.write_state();

        if !state.live.contains(&entity) {
            return Err(EcsError::UnknownEntity(entity));
        }
        let _callback = StoreCallback::enter(self.store_id());
        Ok(state.store.get_mut::<T>(entity).map(|attached| f(attached.get_mut())))
    }

    /// Mutate every `T` component in place, in ascending entity order.
    ///
    /// Returns how many components were visited. The same locking rule as
    /// [`modify_component`](Self::modify_component) applies to `f`.
    pub fn for_each_component_mut<T, F>(&self, mut f: F) -> usize
    where
        T: Component,
        F: FnMut(EntityId, &mut T),
    {
        let mut state = self.write_state();
        let _callback = StoreCallback::enter(self.store_id());
        let mut visited = 0;

        for attached in state.store.iter_mut::<T>() {
            let entity = attached.entity();
            f(entity, attached.get_mut());
            visited += 1;
        }
        visited
    }

    /// Every component kind the world has stored so far.
    #[must_use]
    pub fn component_kinds(&self) -> Vec<ComponentKind> {
        self.read_state().store.kinds().collect()
    }

    /// Kinds currently attached to an entity (empty for non-live entities).
    #[must_use]
    pub fn kinds_of(&self, entity: EntityId) -> Vec<ComponentKind> {
        let state = self.read_state();

        if !state.live.contains(&entity) {
            return Vec::new();
        }
        state.store.kinds_of(entity)
    }

    // ==================== Processor Operations ====================

    /// Register a processor.
    ///
    /// Returns `false` if this handle is already registered. Changes made
    /// during a tick take effect on the next tick.
    pub fn register_processor(&self, processor: &ProcessorRef<I>) -> bool {
        let added = self.processors.write().register(processor);
        if added {
            debug!(processor = processor.name(), "registered processor");
        }
        added
    }

    /// Remove a processor.
    ///
    /// Returns `false` if this handle was not registered.
    pub fn remove_processor(&self, processor: &ProcessorRef<I>) -> bool {
        let removed = self.processors.write().remove(processor);
        if removed {
            debug!(processor = processor.name(), "removed processor");
        }
        removed
    }

    /// Wrap `processor` in a handle, register it and return the handle.
    pub fn add_processor<P: Processor<I>>(&self, processor: P) -> ProcessorRef<I> {
        let handle: ProcessorRef<I> = Arc::new(processor);
        self.register_processor(&handle);
        handle
    }

    /// Register a closure as a processor and return its handle.
    pub fn add_processor_fn<F>(&self, f: F) -> ProcessorRef<I>
    where
        F: Fn(&TickContext<'_, I>) -> ProcessorResult + Send + Sync + 'static,
    {
        self.add_processor(f)
    }

    /// Check whether a processor handle is registered.
    #[must_use]
    pub fn has_processor(&self, processor: &ProcessorRef<I>) -> bool {
        self.processors.read().contains(processor)
    }

    /// Number of registered processors.
    #[must_use]
    pub fn processor_count(&self) -> usize {
        self.processors.read().len()
    }

    /// Names of the registered processors, in registration order.
    #[must_use]
    pub fn processor_names(&self) -> Vec<String> {
        self.processors.read().names()
    }

    // ==================== Commands ====================

    /// The deferred command queue.
    #[must_use]
    pub const fn commands(&self) -> &Commands<I> {
        &self.commands
    }

    /// Apply every queued command, in FIFO order.
    ///
    /// Commands queued while flushing wait for the next flush. Returns how
    /// many commands were applied.
    pub fn flush_commands(&self) -> usize {
        let queued = self.commands.drain();
        let applied = queued.len();
        for command in queued {
            command(self);
        }
        applied
    }

    // ==================== Ticking ====================

    /// Run every registered processor once.
    ///
    /// The processor set is snapshotted first, so registrations and removals
    /// made by processors only affect later ticks. Failing processors are
    /// logged and reported; the others still run. Returns after every
    /// processor has finished and the deferred commands have been applied.
    pub fn tick(&self, elapsed: Duration, input: &I) -> TickReport {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        let span = debug_span!("tick", tick);
        let _enter = span.enter();

        let snapshot = self.processors.read().snapshot();
        let ctx = TickContext {
            tick,
            elapsed,
            input,
            world: self,
        };

        let failures = schedule::run_processors(self.mode, &snapshot, &ctx);
        let commands_applied = self.flush_commands();

        trace!(
            processors = snapshot.len(),
            failures = failures.len(),
            commands_applied,
            "tick complete"
        );

        TickReport {
            tick,
            processors_run: snapshot.len(),
            failures,
            commands_applied,
        }
    }

    /// Number of ticks started so far.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl<I: 'static> fmt::Debug for World<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("World")
            .field("entities", &state.live.len())
            .field("store", &state.store)
            .field("processors", &*self.processors.read())
            .field("mode", &self.mode)
            .field("ticks", &self.ticks.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
