pub mod commands;
pub mod config;
pub mod daemon;
pub mod error;
pub mod fs;
pub mod git;
pub mod heartbeat;
pub mod logging;
pub mod process;
pub mod runner;
pub mod service;
pub mod shutdown;
pub mod sync;

pub use error::{Violation, WardenError, WardenResult};
