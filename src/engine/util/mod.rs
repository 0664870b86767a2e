//! Shared utilities available to every formula action

pub mod command;
pub mod env;

pub use command::{run_output, run_status};
pub use env::{bin, exists, get_env, keg, libexec, prefix};
