//! Plain helpers with explicit inputs and outputs
//!
//! Nothing in here touches the engine's execution context.

pub mod download;
pub mod hash;
pub mod url;
