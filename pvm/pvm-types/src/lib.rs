pub mod common;
pub mod constants;
pub mod exit_reason;
