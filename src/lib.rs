//! flakr - repeatedly run a command in parallel to check for flakiness
//!
//! flakr drives a user-supplied shell command across N parallel workers for
//! a bounded duration, funnels every outcome through a single results
//! listener into shared statistics, and reports progress on a fixed tick.
//! The first failing outcome can optionally stop the whole run.

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod listener;
pub mod outcome;
pub mod reporter;
pub mod runner;
pub mod sink;
pub mod stats;
pub mod worker;

pub use error::{FlakrError, Result};
