use crate::{
    error::{DecodeError, VMCoreError},
    gas::GasCharger,
    program::{
        instruction::registry::{InstructionEntry, InstructionRegistry},
        types::program_state::ProgramState,
    },
    state::{
        state_change::{Modification, VMStateMutator},
        vm_state::VMState,
    },
};
use jam_pvm_types::{
    common::{RegValue, UnsignedGas},
    constants::TRAP_GAS_CHARGE,
    exit_reason::ExitReason,
};

pub struct Interpreter;
impl Interpreter {
    /// Looks up the registry entry of the instruction at `pc` together with its operand span.
    fn entry_at(
        program_state: &ProgramState,
        pc: RegValue,
    ) -> Result<(&'static InstructionEntry, &[u8]), DecodeError> {
        let pc_usize = usize::try_from(pc).map_err(|_| DecodeError::NotInstructionStart(pc))?;
        let span = program_state
            .operand_span(pc_usize)
            .ok_or(DecodeError::NotInstructionStart(pc))?;
        let opcode = program_state.code()[pc_usize];
        let entry = InstructionRegistry::get(opcode).ok_or(DecodeError::UnknownOpcode(opcode))?;
        Ok((entry, span))
    }

    /// Single-step PVM state transition function.
    ///
    /// Returns `Continue` while the machine keeps running. Any other exit reason stops it: the
    /// program counter stays at the terminating instruction, except for `HostCall` which leaves it
    /// at the successor of `ecalli` so that the caller can resume.
    ///
    /// A program counter off any registered instruction costs the trap charge alone. A registered
    /// instruction whose operands fail to decode costs the trap charge plus its own gas cost.
    pub fn step(
        vm_state: &mut VMState,
        program_state: &ProgramState,
    ) -> Result<ExitReason, VMCoreError> {
        let pc = vm_state.pc;
        let (entry, span) = match Self::entry_at(program_state, pc) {
            Ok(found) => found,
            Err(e) => {
                tracing::trace!("pc={pc} trap: {e}");
                return Self::trap(vm_state, TRAP_GAS_CHARGE);
            }
        };
        let operands = match entry.decode(span, pc) {
            Ok(operands) => operands,
            Err(e) => {
                tracing::trace!("pc={pc} trap: {e}");
                let gas_charge = TRAP_GAS_CHARGE.saturating_add(entry.gas_cost);
                return Self::trap(vm_state, gas_charge);
            }
        };
        let next_pc = program_state.next_pc(pc);

        let exit_reason = match entry.evaluate(vm_state, program_state, &operands)? {
            Ok(mut changes) => {
                changes.push(Modification::Gas(entry.gas_cost));
                VMStateMutator::apply_state_change(vm_state, &changes, next_pc)?
            }
            Err(exit_reason) => {
                if GasCharger::apply_gas_cost(vm_state, entry.gas_cost)? < 0 {
                    ExitReason::OutOfGas
                } else {
                    if let ExitReason::HostCall(_) = exit_reason {
                        vm_state.pc = next_pc;
                    }
                    exit_reason
                }
            }
        };

        tracing::trace!(
            "{}  pc={} gas={} regs={:?}",
            entry.opcode,
            vm_state.pc,
            vm_state.gas_counter,
            vm_state.regs
        );
        Ok(exit_reason)
    }

    /// Charges a trap for an instruction that cannot be executed.
    fn trap(vm_state: &mut VMState, gas_charge: UnsignedGas) -> Result<ExitReason, VMCoreError> {
        if GasCharger::apply_gas_cost(vm_state, gas_charge)? < 0 {
            Ok(ExitReason::OutOfGas)
        } else {
            Ok(ExitReason::Panic)
        }
    }

    /// General PVM invocation function.
    ///
    /// Steps through the instruction sequence until an exit reason other than `Continue` is
    /// produced or the gas counter is exhausted. Calling it again after a `HostCall` exit resumes
    /// at the instruction following `ecalli`.
    ///
    /// Represents `Ψ` of the GP.
    pub fn run(
        vm_state: &mut VMState,
        program_state: &ProgramState,
    ) -> Result<ExitReason, VMCoreError> {
        loop {
            if vm_state.gas_counter <= 0 {
                tracing::debug!("Out of gas at pc={}", vm_state.pc);
                return Ok(ExitReason::OutOfGas);
            }
            match Self::step(vm_state, program_state)? {
                ExitReason::Continue => continue,
                exit_reason => {
                    tracing::debug!(
                        "Execution stopped: {exit_reason:?} (pc={}, gas={})",
                        vm_state.pc,
                        vm_state.gas_counter
                    );
                    return Ok(exit_reason);
                }
            }
        }
    }
}
