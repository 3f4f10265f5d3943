#![allow(clippy::missing_errors_doc)]

//! Fixed-rate tick driver for Sprocket ECS worlds.
//!
//! # Tick Loop
//!
//! ```text
//! loop:
//! ┌──────────────────────────────────────────────┐
//! │  wait for the next period (or a stop signal) │
//! │  measure wall-clock time since last tick     │
//! │  snapshot input                              │
//! │  world.tick(elapsed, &input)                 │
//! │  warn if the tick overran its period         │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! The driver is the only pacing mechanism: a tick is never interrupted once
//! it has started.

mod config;
mod driver;
mod input;

pub use config::{ConfigError, DEFAULT_TICK_RATE, TickConfig};
pub use driver::{DriverError, DriverHandle, DriverSummary, TickDriver};
pub use input::{ChannelInput, InputSource};
