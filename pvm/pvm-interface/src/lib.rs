//! Invocation entry points of the PVM: plain execution, the host-call loop and argument
//! invocation of standard programs.

pub mod error;
pub mod host;
pub mod invoke;
pub mod pvm;
pub mod utils;

pub use invoke::{InvocationParams, PVMInterface, PVMInvocationOutput, PVMInvocationResult};
pub use jam_pvm_core::state::vm_state::{ExecutionContext, VMState};
pub use jam_pvm_types::exit_reason::ExitReason;
