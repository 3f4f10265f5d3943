//! Processors - per-tick update routines - and the registry holding them.

use std::{fmt, sync::Arc};

use crate::{error::BoxError, schedule::TickContext};

/// Result returned by a processor run.
pub type ProcessorResult = Result<(), BoxError>;

/// A per-tick update routine.
///
/// Processors read and write the world through the [`TickContext`] they are
/// given. Returning an error (or panicking) marks the run as failed; the
/// scheduler logs it and keeps running the remaining processors.
///
/// Closures taking `&TickContext<'_, I>` implement this trait. Give them a
/// readable name with [`named`].
pub trait Processor<I = ()>: Send + Sync + 'static {
    /// Run once for the current tick.
    fn run(&self, ctx: &TickContext<'_, I>) -> ProcessorResult;

    /// Name used in logs and failure reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<I, F> Processor<I> for F
where
    F: Fn(&TickContext<'_, I>) -> ProcessorResult + Send + Sync + 'static,
{
    fn run(&self, ctx: &TickContext<'_, I>) -> ProcessorResult {
        self(ctx)
    }
}

/// Shared handle to a registered processor.
///
/// Registry identity is the `Arc` allocation: clones of the same handle are
/// the same processor, two separately built handles are not.
pub type ProcessorRef<I = ()> = Arc<dyn Processor<I>>;

/// A processor with an explicit name.
pub struct Named<P> {
    name: String,
    inner: P,
}

/// Wrap `processor` so logs and failure reports use `name`.
pub fn named<P>(name: impl Into<String>, processor: P) -> Named<P> {
    Named {
        name: name.into(),
        inner: processor,
    }
}

/// Like [`named`], for closures.
///
/// The `Fn` bound lets the compiler infer the closure's argument type, so
/// `named_fn("movement", |ctx| ...)` needs no annotations.
pub fn named_fn<I, F>(name: impl Into<String>, f: F) -> Named<F>
where
    F: Fn(&TickContext<'_, I>) -> ProcessorResult + Send + Sync + 'static,
{
    named(name, f)
}

impl<I, P: Processor<I>> Processor<I> for Named<P> {
    fn run(&self, ctx: &TickContext<'_, I>) -> ProcessorResult {
        self.inner.run(ctx)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<P> fmt::Debug for Named<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Named").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Ordered set of processors, keyed by handle identity.
pub struct ProcessorRegistry<I> {
    entries: Vec<ProcessorRef<I>>,
}

impl<I> Default for ProcessorRegistry<I> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<I: 'static> ProcessorRegistry<I> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, processor: &ProcessorRef<I>) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| std::ptr::addr_eq(Arc::as_ptr(entry), Arc::as_ptr(processor)))
    }

    /// Register a processor.
    ///
    /// Returns `false` if this handle is already registered.
    pub fn register(&mut self, processor: &ProcessorRef<I>) -> bool {
        if self.contains(processor) {
            return false;
        }
        self.entries.push(Arc::clone(processor));
        true
    }

    /// Remove a processor, keeping the order of the others.
    ///
    /// Returns `false` if the handle was not registered.
    pub fn remove(&mut self, processor: &ProcessorRef<I>) -> bool {
        match self.position(processor) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Check whether a handle is registered.
    #[must_use]
    pub fn contains(&self, processor: &ProcessorRef<I>) -> bool {
        self.position(processor).is_some()
    }

    /// Copy of the current processors, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ProcessorRef<I>> {
        self.entries.clone()
    }

    /// Names of the registered processors, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|p| p.name().to_owned()).collect()
    }

    /// Number of registered processors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no processor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I: 'static> fmt::Debug for ProcessorRegistry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|p| p.name()))
            .finish()
    }
}
