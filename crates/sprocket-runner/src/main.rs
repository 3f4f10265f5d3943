//! Demo runner for Sprocket ECS.
//!
//! This binary:
//! 1. Builds a world with a few `Position` entities, one of them short-lived
//! 2. Deletes the first entity before the first tick
//! 3. Registers movement, lifetime and retirement processors
//! 4. Ticks the world at a fixed rate until Ctrl-C or `MAX_TICKS`
//!
//! Environment:
//! - `TICK_RATE` - ticks per second (default 20)
//! - `MAX_TICKS` - stop after this many ticks (default: run until Ctrl-C)
//! - `SCHEDULING` - `sequential` (default) or `parallel`

use std::time::{Duration, Instant};

use crossbeam::channel;
use sprocket_ecs::{Component, EntityId, SchedulingMode, World, WorldConfig, named_fn};
use sprocket_tick::{TickConfig, TickDriver};
use tracing::{debug, info, warn};

/// How long the movement processor stays registered.
const MOVE_FOR: Duration = Duration::from_secs(2);

#[derive(Component, Clone, Debug, PartialEq, Eq)]
struct Position {
    x: i64,
    y: i64,
}

/// Deletes its entity once `remaining` runs out.
#[derive(Component, Clone, Debug)]
struct TimeToLive {
    remaining: Duration,
}

fn scheduling_from_env() -> SchedulingMode {
    match std::env::var("SCHEDULING").as_deref() {
        Err(_) | Ok("sequential") => SchedulingMode::Sequential,
        Ok("parallel") => SchedulingMode::Parallel,
        Ok(other) => {
            warn!(value = other, "unknown SCHEDULING, using sequential");
            SchedulingMode::Sequential
        }
    }
}

/// Speed of an entity: one unit, plus one per ID step.
fn speed(entity: EntityId) -> i64 {
    1 + i64::try_from(entity.raw()).unwrap_or(i64::MAX - 1)
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sprocket_runner=info".parse()?)
                .add_directive("sprocket_tick=info".parse()?)
                .add_directive("sprocket_ecs=info".parse()?),
        )
        .init();

    let config = TickConfig::from_env();
    let mode = scheduling_from_env();
    info!(rate_hz = config.tick_rate_hz, ?mode, "starting sprocket runner");

    let world = World::<()>::with_config(WorldConfig::default().mode(mode));

    let first = world.create_entity(Position { x: 0, y: 0 });
    world.create_entity(Position { x: 0, y: 0 });
    world.create_entity((
        Position { x: 0, y: 0 },
        TimeToLive {
            remaining: Duration::from_secs(1),
        },
    ));
    world.delete_entity(first);

    let movement = world.add_processor(named_fn("movement", |ctx| {
        ctx.world.for_each_component_mut::<Position, _>(|entity, pos| {
            let step = speed(entity);
            pos.x += step;
            pos.y += step;
            debug!(%entity, x = pos.x, y = pos.y, "moved");
        });
        Ok(())
    }));

    world.add_processor(named_fn("lifetime", |ctx| {
        ctx.world.for_each_component_mut::<TimeToLive, _>(|entity, ttl| {
            ttl.remaining = ttl.remaining.saturating_sub(ctx.elapsed);
            if ttl.remaining.is_zero() {
                info!(%entity, "expired");
                ctx.commands().delete_entity(entity);
            }
        });
        Ok(())
    }));

    let deadline = Instant::now() + MOVE_FOR;
    world.add_processor(named_fn("retire-movement", move |ctx| {
        if Instant::now() >= deadline && ctx.world.remove_processor(&movement) {
            info!(tick = ctx.tick, "movement processor retired");
        }
        Ok(())
    }));

    let (stop_tx, stop_rx) = channel::bounded(1);
    ctrlc::set_handler(move || {
        // A second Ctrl-C finds the slot full; the first one is enough.
        let _ = stop_tx.try_send(());
    })?;

    let summary = TickDriver::without_input(config).run(&world, &stop_rx);
    info!(ticks = summary.ticks, failures = summary.failures, "shutting down");

    for pos in world.get_components::<Position>() {
        info!(entity = %pos.entity(), x = pos.x, y = pos.y, "final position");
    }

    Ok(())
}
