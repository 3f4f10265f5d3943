//! Per-tick input snapshots.

use crossbeam::channel::{self, Receiver, Sender};

/// Produces the input value handed to processors on each tick.
pub trait InputSource<I>: Send {
    /// Input for the tick about to run.
    fn snapshot(&mut self) -> I;
}

impl<I, F> InputSource<I> for F
where
    F: FnMut() -> I + Send,
{
    fn snapshot(&mut self) -> I {
        self()
    }
}

/// Input gathered from a channel.
///
/// Each snapshot drains the events sent since the previous one, in send order.
#[derive(Debug)]
pub struct ChannelInput<E> {
    rx: Receiver<E>,
}

impl<E> ChannelInput<E> {
    /// Wrap an existing receiver.
    #[must_use]
    pub const fn new(rx: Receiver<E>) -> Self {
        Self { rx }
    }

    /// Create an unbounded channel and the input reading from it.
    #[must_use]
    pub fn channel() -> (Sender<E>, Self) {
        let (tx, rx) = channel::unbounded();
        (tx, Self::new(rx))
    }
}

impl<E: Send> InputSource<Vec<E>> for ChannelInput<E> {
    fn snapshot(&mut self) -> Vec<E> {
        self.rx.try_iter().collect()
    }
}
