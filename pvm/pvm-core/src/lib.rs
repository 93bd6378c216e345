//! Core of the JAM Process Virtual Machine.
//!
//! Decodes program blobs, analyzes basic blocks, dispatches instructions through a static
//! registry and applies their state modifications to the execution context.
pub mod error;
pub mod gas;
pub mod interpreter;
pub mod program;
pub mod state;
pub mod utils;
