//! Command-line interface components
//!
//! This module contains CLI-specific code for the HITRAN XSC application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{CacheAction, CacheArgs, Cli, Commands, GlobalArgs, ListArgs, XscAction, XscArgs};
pub use commands::{handle_cache, handle_xsc};
