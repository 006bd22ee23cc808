//! Command-line interface components
//!
//! This module contains CLI-specific code for the Meeting Media application,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, Commands, ConfigAction, ConfigArgs, FetchArgs, GlobalArgs};
pub use commands::{handle_config, handle_meeting};
pub use progress::TerminalProgress;
