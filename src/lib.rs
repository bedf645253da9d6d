//! tartex-runner library crate
//!
//! Plans, runs and reports tartex archive jobs. The binary wires these
//! modules to either the TUI or the headless runner; benchmarks use the
//! classifier and search paths directly.

pub mod app;
pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod job;
pub mod logging;
pub mod search;
pub mod ui;
pub mod util;

/// Directory name under the platform config/data dirs.
pub const APP_NAME: &str = "tartex-runner";
