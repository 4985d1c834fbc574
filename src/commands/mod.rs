pub mod common;
pub mod config;
pub mod daemon;
pub mod heartbeat;
pub mod init;
pub mod run;
pub mod schema;
pub mod service;
pub mod watch;

pub use common::Context;
