//! Core infrastructure shared by the engine and the CLI

pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod receipt;
