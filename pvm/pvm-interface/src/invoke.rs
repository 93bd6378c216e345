use crate::{
    error::{HostCallError::InvalidExitReason, PVMError},
    host::{HostCallHandler, HostCallResult},
    pvm::PVM,
};
use jam_pvm_core::{
    interpreter::Interpreter,
    program::{
        loader::ProgramLoader,
        types::{formatted_program::FormattedProgram, program_state::ProgramState},
    },
    state::{state_change::VMStateMutator, vm_state::VMState},
};
use jam_pvm_types::{
    common::{HostCallId, RegValue, SignedGas, UnsignedGas},
    exit_reason::ExitReason,
};
use std::sync::Arc;
use tracing::instrument;

/// Entry parameters of an argument invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvocationParams {
    /// Initial program counter
    pub pc: RegValue,
    pub gas_limit: UnsignedGas,
    /// Argument data placed in the read-only arguments region
    pub args: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PVMInvocationResult {
    pub gas_used: UnsignedGas,
    pub output: PVMInvocationOutput,
}

impl PVMInvocationResult {
    pub fn with_output(output: Vec<u8>, gas_used: UnsignedGas) -> Self {
        Self {
            gas_used,
            output: PVMInvocationOutput::Output(output),
        }
    }

    pub fn no_output(gas_used: UnsignedGas) -> Self {
        Self {
            gas_used,
            output: PVMInvocationOutput::OutputUnavailable,
        }
    }

    pub fn out_of_gas(gas_used: UnsignedGas) -> Self {
        Self {
            gas_used,
            output: PVMInvocationOutput::OutOfGas,
        }
    }

    pub fn panic(gas_used: UnsignedGas) -> Self {
        Self {
            gas_used,
            output: PVMInvocationOutput::Panic,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PVMInvocationOutput {
    /// Regular halt with return value
    Output(Vec<u8>),
    /// Regular halt with no return value
    OutputUnavailable,
    /// Out of gas
    OutOfGas,
    /// Panic, page fault or a host call nobody answered
    Panic,
}

pub struct PVMInterface;
impl PVMInterface {
    /// Runs a loaded program from the given execution context until it stops.
    ///
    /// Host calls are not serviced: a `HostCall` exit is handed back with the context suspended
    /// right after `ecalli`, so passing the returned context in again resumes execution.
    pub fn invoke(
        program_state: &ProgramState,
        mut vm_state: VMState,
    ) -> Result<(VMState, ExitReason), PVMError> {
        let exit_reason = Interpreter::run(&mut vm_state, program_state)?;
        Ok((vm_state, exit_reason))
    }

    /// Decodes a program code blob and runs it with [`Self::invoke`].
    pub fn invoke_blob(
        program_blob: &[u8],
        vm_state: VMState,
    ) -> Result<(VMState, ExitReason), PVMError> {
        let program_state = ProgramLoader::load_program(program_blob)?;
        Self::invoke(&program_state, vm_state)
    }

    /// Runs a program, servicing every host call with `handler` until a terminal exit.
    ///
    /// Represents `Ψ_H` of the GP.
    pub fn invoke_with_host_calls<H: HostCallHandler + ?Sized>(
        program_state: &ProgramState,
        vm_state: &mut VMState,
        handler: &mut H,
    ) -> Result<ExitReason, PVMError> {
        loop {
            let exit_reason = Interpreter::run(vm_state, program_state)?;

            let host_call_result = match exit_reason {
                ExitReason::HostCall(h) => Self::execute_host_function(vm_state, handler, h)?,
                _ => return Ok(exit_reason),
            };

            match host_call_result.exit_reason {
                ExitReason::Continue => {
                    match VMStateMutator::apply_host_call_state_change(
                        vm_state,
                        host_call_result.vm_change,
                    )? {
                        ExitReason::Continue => continue,
                        exit_reason => {
                            tracing::debug!("Host call change rejected: {exit_reason}");
                            return Ok(exit_reason);
                        }
                    }
                }
                exit_reason @ (ExitReason::Panic
                | ExitReason::RegularHalt
                | ExitReason::OutOfGas) => {
                    VMStateMutator::apply_host_call_state_change(
                        vm_state,
                        host_call_result.vm_change,
                    )?;
                    return Ok(exit_reason);
                }
                exit_reason => return Err(PVMError::HostCallError(InvalidExitReason(exit_reason))),
            }
        }
    }

    #[instrument(level = "trace", name = "exe_hc", skip(vm_state, handler))]
    fn execute_host_function<H: HostCallHandler + ?Sized>(
        vm_state: &VMState,
        handler: &mut H,
        h: HostCallId,
    ) -> Result<HostCallResult, PVMError> {
        tracing::debug!("Host call {h} at pc={} gas={}", vm_state.pc, vm_state.gas_counter);
        handler.handle(h, vm_state)
    }

    /// Initializes a PVM instance from a standard program blob and some arguments, then runs it
    /// through the host-call loop.
    ///
    /// # Input Program
    /// The standard program blob is decoded into a `FormattedProgram`, which carries the memory
    /// layout needed for initialization. Its `code` section is loaded as the immutable program
    /// state of the `PVM`.
    ///
    /// Represents `Ψ_M` of the GP.
    pub fn invoke_with_args<H: HostCallHandler + ?Sized>(
        standard_program: &[u8],
        params: &InvocationParams,
        handler: &mut H,
    ) -> Result<PVMInvocationResult, PVMError> {
        tracing::info!(
            pc = params.pc,
            gas_limit = params.gas_limit,
            "Ψ_M invoked."
        );

        // Initialize mutable PVM states: memory, registers, pc and gas_counter
        let mut pvm = match Self::initialize(standard_program, &params.args) {
            Ok(pvm) => pvm,
            Err(e) => {
                tracing::warn!("Failed to initialize PVM instance: {e}");
                return Ok(PVMInvocationResult::panic(0));
            }
        };
        pvm.state.pc = params.pc;
        pvm.state.gas_counter = SignedGas::try_from(params.gas_limit).unwrap_or(SignedGas::MAX);

        let exit_reason =
            Self::invoke_with_host_calls(&pvm.program_state, &mut pvm.state, handler)?;
        let gas_used = params
            .gas_limit
            .saturating_sub(pvm.state.gas_counter.max(0) as UnsignedGas);

        tracing::debug!("Ψ_M Exit Reason: {exit_reason}, gas_used={gas_used}");
        Ok(match exit_reason {
            ExitReason::OutOfGas => PVMInvocationResult::out_of_gas(gas_used),
            ExitReason::RegularHalt => match pvm.read_output() {
                Some(bytes) => PVMInvocationResult::with_output(bytes, gas_used),
                None => PVMInvocationResult::no_output(gas_used),
            },
            _ => PVMInvocationResult::panic(gas_used),
        })
    }

    fn initialize(standard_program: &[u8], args: &[u8]) -> Result<PVM, PVMError> {
        let formatted_program = FormattedProgram::from_standard_program(standard_program)?;
        let program_state = ProgramLoader::load_program(&formatted_program.code)?;
        PVM::new_with_formatted_program(&formatted_program, Arc::new(program_state), args)
    }
}
