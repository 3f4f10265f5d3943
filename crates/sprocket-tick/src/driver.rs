//! The fixed-rate tick loop.

use std::{
    any::Any,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};

use crossbeam::channel::{self, Receiver, Sender, select};
use sprocket_ecs::World;
use thiserror::Error;
use tracing::{info, warn};

use crate::{config::TickConfig, input::InputSource};

/// Totals for one driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriverSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Processor failures across all ticks.
    pub failures: usize,
}

/// Errors from a driver running on its own thread.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("failed to spawn tick thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("tick thread panicked: {0}")]
    Panicked(String),
}

/// Ticks a [`World`] at a fixed rate.
pub struct TickDriver<I> {
    config: TickConfig,
    input: Box<dyn InputSource<I>>,
}

impl TickDriver<()> {
    /// Driver for worlds that take no input.
    #[must_use]
    pub fn without_input(config: TickConfig) -> Self {
        Self::new(config, || ())
    }
}

impl<I: Send + Sync + 'static> TickDriver<I> {
    /// Create a driver reading each tick's input from `input`.
    pub fn new(config: TickConfig, input: impl InputSource<I> + 'static) -> Self {
        Self {
            config,
            input: Box::new(input),
        }
    }

    /// The driver's configuration.
    #[must_use]
    pub const fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Tick `world` until `stop` yields a message or is disconnected, or
    /// until `max_ticks` is reached.
    ///
    /// Each tick is handed the wall-clock time since the previous one (for
    /// the first tick, since the loop started).
    pub fn run(&mut self, world: &World<I>, stop: &Receiver<()>) -> DriverSummary {
        let period = self.config.period();
        let ticker = channel::tick(period);
        let mut summary = DriverSummary::default();
        let mut last = Instant::now();

        info!(rate_hz = self.config.tick_rate_hz, max_ticks = ?self.config.max_ticks, "tick driver started");

        loop {
            if self.config.max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }

            let stopped = select! {
                recv(stop) -> _ => true,
                recv(ticker) -> _ => false,
            };
            if stopped {
                break;
            }

            let start = Instant::now();
            let elapsed = start.duration_since(last);
            last = start;

            let input = self.input.snapshot();
            let report = world.tick(elapsed, &input);

            summary.ticks += 1;
            summary.failures += report.failures.len();

            let busy = start.elapsed();
            if busy > period {
                warn!(tick = report.tick, ?busy, ?period, "tick overran its period");
            }
        }

        info!(ticks = summary.ticks, failures = summary.failures, "tick driver stopped");
        summary
    }

    /// Run the loop on a dedicated thread.
    ///
    /// The returned handle stops the loop and hands back its summary.
    pub fn spawn(mut self, world: Arc<World<I>>) -> Result<DriverHandle, DriverError> {
        let (stop_tx, stop_rx) = channel::bounded(1);

        let thread = thread::Builder::new()
            .name("sprocket-tick".to_owned())
            .spawn(move || self.run(&world, &stop_rx))?;

        Ok(DriverHandle {
            stop: stop_tx,
            thread,
        })
    }
}

/// Handle to a driver running on its own thread.
#[derive(Debug)]
pub struct DriverHandle {
    stop: Sender<()>,
    thread: JoinHandle<DriverSummary>,
}

impl DriverHandle {
    /// Check whether the loop has already returned (e.g. `max_ticks` reached).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Signal the loop to stop after the current tick and wait for it.
    pub fn stop(self) -> Result<DriverSummary, DriverError> {
        // The loop may have exited already, in which case nobody is listening.
        let _ = self.stop.send(());
        self.join()
    }

    /// Wait for the loop to return on its own.
    pub fn join(self) -> Result<DriverSummary, DriverError> {
        self.thread
            .join()
            .map_err(|payload| DriverError::Panicked(panic_message(&*payload)))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| (*msg).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicU64, Ordering},
        },
        time::Duration,
    };

    use sprocket_ecs::{Component, SchedulingMode, WorldConfig};

    use super::*;
    use crate::input::ChannelInput;

    #[derive(Component, Clone, Debug, PartialEq)]
    struct Counter(u64);

    fn fast(max_ticks: u64) -> TickConfig {
        TickConfig {
            tick_rate_hz: 1000.0,
            max_ticks: Some(max_ticks),
        }
    }

    #[test]
    fn test_runs_until_max_ticks() {
        let world = World::<()>::new();
        let entity = world.create_entity(Counter(0));
        world.add_processor_fn(|ctx| {
            ctx.world.for_each_component_mut::<Counter, _>(|_, c| c.0 += 1);
            Ok(())
        });

        let summary = TickDriver::without_input(fast(3)).run(&world, &channel::never());

        assert_eq!(summary, DriverSummary { ticks: 3, failures: 0 });
        assert_eq!(world.tick_count(), 3);
        assert_eq!(world.get_component::<Counter>(entity).unwrap().get(), &Counter(3));
    }

    #[test]
    fn test_stop_before_first_tick() {
        let world = World::<()>::new();
        let (stop_tx, stop_rx) = channel::bounded(1);
        stop_tx.send(()).unwrap();

        // One tick per second, so the stop signal is the only ready event.
        let config = TickConfig::new(1.0).unwrap();
        let summary = TickDriver::without_input(config).run(&world, &stop_rx);

        assert_eq!(summary.ticks, 0);
        assert_eq!(world.tick_count(), 0);
    }

    #[test]
    fn test_disconnected_stop_channel_ends_loop() {
        let world = World::<()>::new();
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        drop(stop_tx);

        let summary = TickDriver::without_input(TickConfig::new(1.0).unwrap()).run(&world, &stop_rx);

        assert_eq!(summary.ticks, 0);
    }

    #[test]
    fn test_counts_failures() {
        let world = World::<()>::new();
        world.add_processor_fn(|_| Err("always broken".into()));
        world.add_processor_fn(|_| Ok(()));

        let summary = TickDriver::without_input(fast(4)).run(&world, &channel::never());

        assert_eq!(summary, DriverSummary { ticks: 4, failures: 4 });
    }

    #[test]
    fn test_channel_input_reaches_processors() {
        let world = World::<Vec<u32>>::new();
        let total = Arc::new(AtomicU64::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sum = Arc::clone(&total);
        let log = Arc::clone(&seen);
        world.add_processor_fn(move |ctx| {
            log.lock().unwrap().push(ctx.input.len());
            sum.fetch_add(ctx.input.iter().map(|&n| u64::from(n)).sum(), Ordering::SeqCst);
            Ok(())
        });

        let (tx, input) = ChannelInput::<u32>::channel();
        for n in [1, 2, 3] {
            tx.send(n).unwrap();
        }

        let summary = TickDriver::new(fast(2), input).run(&world, &channel::never());

        assert_eq!(summary.ticks, 2);
        assert_eq!(total.load(Ordering::SeqCst), 6);
        assert_eq!(*seen.lock().unwrap(), vec![3, 0]);
    }

    #[test]
    fn test_elapsed_is_measured() {
        let world = World::<()>::new();
        let longest = Arc::new(AtomicU64::new(0));

        let max = Arc::clone(&longest);
        world.add_processor_fn(move |ctx| {
            let nanos = u64::try_from(ctx.elapsed.as_nanos()).unwrap_or(u64::MAX);
            max.fetch_max(nanos, Ordering::SeqCst);
            Ok(())
        });

        let config = TickConfig {
            tick_rate_hz: 100.0,
            max_ticks: Some(3),
        };
        TickDriver::without_input(config).run(&world, &channel::never());

        // The ticker never fires early, so some gap reaches a full period.
        assert!(longest.load(Ordering::SeqCst) >= 9_000_000);
    }

    #[test]
    fn test_spawned_driver_stops() {
        let world = Arc::new(World::<()>::with_config(
            WorldConfig::default().mode(SchedulingMode::Parallel),
        ));
        world.create_entity(Counter(0));
        world.add_processor_fn(|ctx| {
            ctx.world.for_each_component_mut::<Counter, _>(|_, c| c.0 += 1);
            Ok(())
        });

        let handle = TickDriver::without_input(TickConfig::new(200.0).unwrap())
            .spawn(Arc::clone(&world))
            .unwrap();
        thread::sleep(Duration::from_millis(30));
        let summary = handle.stop().unwrap();

        assert_eq!(summary.ticks, world.tick_count());
        assert_eq!(
            world.get_components::<Counter>()[0].get(),
            &Counter(summary.ticks)
        );
    }

    #[test]
    fn test_spawned_driver_finishes_on_its_own() {
        let world = Arc::new(World::<()>::new());

        let handle = TickDriver::without_input(fast(5)).spawn(Arc::clone(&world)).unwrap();
        let summary = handle.join().unwrap();

        assert_eq!(summary.ticks, 5);
    }
}
