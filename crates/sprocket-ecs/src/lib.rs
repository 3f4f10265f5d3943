#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_fields_in_debug)]

//! Sprocket ECS - a minimal Entity Component System driven by ticks.
//!
//! # Key Concepts
//!
//! - **Entity**: An opaque, never-reused ID
//! - **Component**: A plain data record attached to an entity; one per kind
//! - **Processor**: A routine run once per tick against the world
//! - **World**: Owns entities, components, processors and the command queue
//!
//! # Access Patterns
//!
//! Component reads return owned copies, wrapped in [`Attached`] so the
//! owning entity travels with the value:
//! - `get_component::<T>(entity)` - one entity's `T`
//! - `get_components::<T>()` - every `T`, in ascending entity order
//! - `modify_component::<T, _, _>(entity, f)` - mutate in place
//! - `for_each_component_mut::<T, _>(f)` - mutate every `T` in place
//!
//! # Ticking
//!
//! ```
//! use std::time::Duration;
//!
//! use sprocket_ecs::prelude::*;
//!
//! #[derive(Component, Clone, Debug, PartialEq)]
//! struct Position {
//!     x: i64,
//! }
//!
//! let world = World::<()>::new();
//! let entity = world.create_entity(Position { x: 0 });
//!
//! world.add_processor_fn(|ctx| {
//!     ctx.world.for_each_component_mut::<Position, _>(|_, pos| pos.x += 1);
//!     Ok(())
//! });
//!
//! world.tick(Duration::from_millis(50), &());
//!
//! assert_eq!(world.get_component::<Position>(entity).unwrap().x, 1);
//! ```

// Lets `#[derive(Component)]` in the unit tests name `::sprocket_ecs`.
#[cfg(test)]
extern crate self as sprocket_ecs;

mod bundle;
mod commands;
mod component;
mod entity;
mod error;
mod processor;
mod schedule;
mod storage;
mod world;

pub use bundle::ComponentBundle;
pub use commands::Commands;
pub use component::{Attached, Component, ComponentKind};
pub use entity::{EntityAllocator, EntityId};
pub use error::{BoxError, EcsError, EcsResult, FailureCause, ProcessorFailure};
pub use processor::{
    Named, Processor, ProcessorRef, ProcessorRegistry, ProcessorResult, named, named_fn,
};
pub use schedule::{SchedulingMode, TickContext, TickReport};
pub use sprocket_ecs_derive::Component;
pub use storage::{Column, ComponentStore};
pub use world::{World, WorldConfig};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Attached, Component, ComponentKind, EntityId, Processor, ProcessorRef, ProcessorResult,
        SchedulingMode, TickContext, World, named, named_fn,
    };
}
