//! Tick execution.
//!
//! # Scheduling Models
//!
//! ```text
//! Sequential (default)              Parallel
//! ┌──────────────────────┐          ┌──────────────────────────────┐
//! │ snapshot processors  │          │ snapshot processors          │
//! │ run P0 ─► P1 ─► P2   │          │ fan out P0 | P1 | P2 (rayon) │
//! │                      │          │ join                         │
//! │ apply deferred cmds  │          │ apply deferred cmds          │
//! └──────────────────────┘          └──────────────────────────────┘
//! ```
//!
//! Sequential runs processors in registration order, so writes made by one
//! are visible to every later one in the same tick. Parallel gives no
//! ordering between processors; every world operation is serialized by the
//! store lock, so a component is never observed half-written. Processors
//! that mutate the same kind in parallel mode race at the operation level.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    time::Duration,
};

use rayon::prelude::*;
use tracing::{Span, warn};

use crate::{
    commands::Commands,
    error::{FailureCause, ProcessorFailure},
    processor::ProcessorRef,
    world::World,
};

/// How a tick runs its processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingMode {
    /// One after another, in registration order.
    #[default]
    Sequential,
    /// All at once on the rayon pool, joined before the tick returns.
    Parallel,
}

/// Everything a processor receives for one tick.
pub struct TickContext<'a, I = ()> {
    /// Tick number, starting at `0`.
    pub tick: u64,
    /// Time since the previous tick, as measured by the caller.
    pub elapsed: Duration,
    /// Input snapshot for this tick.
    pub input: &'a I,
    /// The world being ticked.
    pub world: &'a World<I>,
}

impl<'a, I: Send + Sync + 'static> TickContext<'a, I> {
    /// Deferred command queue, applied once every processor of this tick is done.
    pub fn commands(&self) -> &'a Commands<I> {
        self.world.commands()
    }
}

/// Outcome of one tick.
#[derive(Debug)]
pub struct TickReport {
    /// Tick number.
    pub tick: u64,
    /// Number of processors that were scheduled.
    pub processors_run: usize,
    /// Processors that returned an error or panicked.
    pub failures: Vec<ProcessorFailure>,
    /// Deferred commands applied at the end of the tick.
    pub commands_applied: usize,
}

impl TickReport {
    /// Check whether every processor succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run every processor in `processors` once, collecting failures.
pub(crate) fn run_processors<I: Send + Sync + 'static>(
    mode: SchedulingMode,
    processors: &[ProcessorRef<I>],
    ctx: &TickContext<'_, I>,
) -> Vec<ProcessorFailure> {
    match mode {
        SchedulingMode::Sequential => processors
            .iter()
            .filter_map(|processor| run_isolated(processor, ctx).err())
            .collect(),
        SchedulingMode::Parallel => {
            let parent = Span::current();
            processors
                .par_iter()
                .filter_map(|processor| parent.in_scope(|| run_isolated(processor, ctx).err()))
                .collect()
        }
    }
}

fn run_isolated<I: 'static>(
    processor: &ProcessorRef<I>,
    ctx: &TickContext<'_, I>,
) -> Result<(), ProcessorFailure> {
    let cause = match panic::catch_unwind(AssertUnwindSafe(|| processor.run(ctx))) {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(err)) => FailureCause::Error(err),
        Err(payload) => FailureCause::Panic(panic_message(&*payload)),
    };

    let failure = ProcessorFailure {
        processor: processor.name().to_owned(),
        tick: ctx.tick,
        cause,
    };
    warn!(
        processor = %failure.processor,
        tick = failure.tick,
        cause = %failure.cause,
        "processor failed"
    );
    Err(failure)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
