use crate::{
    error::VMCoreError,
    gas::GasCharger,
    state::{
        memory::MemoryError,
        vm_state::{RegIndex, VMState},
    },
};
use jam_pvm_types::{
    common::{MemAddress, RegValue, UnsignedGas},
    constants::{HOSTCALL_BASE_GAS_CHARGE, REGISTERS_COUNT},
    exit_reason::ExitReason,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemWrite {
    pub buf_offset: MemAddress,
    pub write_data: Vec<u8>,
}

impl MemWrite {
    pub fn new(buf_offset: MemAddress, write_data: Vec<u8>) -> Self {
        Self {
            buf_offset,
            write_data,
        }
    }
}

/// A single observable effect of an instruction.
///
/// Evaluators return these instead of mutating the VM state; only `VMStateMutator` applies them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Modification {
    /// Register write.
    Register(RegIndex, RegValue),
    /// Memory write.
    Memory(MemWrite),
    /// Instruction pointer jump. Without one, the pointer advances to the next instruction.
    Jump(RegValue),
    /// Gas deduction.
    Gas(UnsignedGas),
    /// Heap break advance to the given pointer.
    HeapGrow(MemAddress),
}

/// VM state change set resulting from a single host function execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostCallVMStateChange {
    pub gas_charge: UnsignedGas,
    pub r7_write: Option<RegValue>,
    pub r8_write: Option<RegValue>,
    pub memory_write: Option<MemWrite>,
}

impl Default for HostCallVMStateChange {
    fn default() -> Self {
        Self {
            gas_charge: HOSTCALL_BASE_GAS_CHARGE,
            r7_write: None,
            r8_write: None,
            memory_write: None,
        }
    }
}

impl HostCallVMStateChange {
    pub fn into_modifications(self) -> Vec<Modification> {
        let mut changes = vec![Modification::Gas(self.gas_charge)];
        if let Some(r7) = self.r7_write {
            changes.push(Modification::Register(7, r7));
        }
        if let Some(r8) = self.r8_write {
            changes.push(Modification::Register(8, r8));
        }
        if let Some(write) = self.memory_write {
            changes.push(Modification::Memory(write));
        }
        changes
    }
}

pub struct VMStateMutator;
impl VMStateMutator {
    /// Applies the modifications produced by a single step.
    ///
    /// Malformed change sets are rejected before anything is touched. Gas is deducted next. When
    /// the counter goes negative nothing else is applied and `OutOfGas` is returned. Memory writes
    /// are then validated, so a failing write leaves registers, memory and the program counter
    /// untouched and surfaces as `Panic` or `PageFault`. On success the program counter moves to the `Jump` target if any, or to
    /// `next_pc` otherwise, and `Continue` is returned.
    pub fn apply_state_change(
        vm_state: &mut VMState,
        changes: &[Modification],
        next_pc: RegValue,
    ) -> Result<ExitReason, VMCoreError> {
        for change in changes {
            match change {
                Modification::Register(reg_index, _) if *reg_index >= REGISTERS_COUNT => {
                    return Err(VMCoreError::InvalidRegIndex(*reg_index));
                }
                Modification::HeapGrow(requested) => {
                    let heap = vm_state.memory.heap;
                    if *requested < heap.pointer || *requested > heap.end {
                        return Err(MemoryError::InvalidSbrk {
                            pointer: heap.pointer,
                            requested: *requested,
                            end: heap.end,
                        }
                        .into());
                    }
                }
                _ => {}
            }
        }

        let gas_charge = changes
            .iter()
            .filter_map(|change| match change {
                Modification::Gas(charge) => Some(*charge),
                _ => None,
            })
            .try_fold(0 as UnsignedGas, |acc, charge| acc.checked_add(charge))
            .ok_or(VMCoreError::GasCounterOverflow)?;
        if gas_charge > 0 && GasCharger::apply_gas_cost(vm_state, gas_charge)? < 0 {
            return Ok(ExitReason::OutOfGas);
        }

        let mut new_pc = next_pc;
        for change in changes {
            match change {
                Modification::Memory(MemWrite {
                    buf_offset,
                    write_data,
                }) => {
                    if let Err(e) = vm_state
                        .memory
                        .check_writable(*buf_offset, write_data.len())
                    {
                        return Self::memory_failure(e);
                    }
                }
                Modification::Jump(target) => new_pc = *target,
                _ => {}
            }
        }

        for change in changes {
            match change {
                Modification::Register(reg_index, value) => vm_state.regs[*reg_index] = *value,
                Modification::Memory(MemWrite {
                    buf_offset,
                    write_data,
                }) => vm_state.memory.write_bytes(*buf_offset, write_data)?,
                Modification::HeapGrow(requested) => {
                    vm_state.memory.grow_heap(*requested)?;
                }
                Modification::Jump(_) | Modification::Gas(_) => {}
            }
        }
        vm_state.pc = new_pc;

        Ok(ExitReason::Continue)
    }

    /// Applies the change set of a host function. The program counter is left as is.
    pub fn apply_host_call_state_change(
        vm_state: &mut VMState,
        change: HostCallVMStateChange,
    ) -> Result<ExitReason, VMCoreError> {
        let pc = vm_state.pc;
        Self::apply_state_change(vm_state, &change.into_modifications(), pc)
    }

    fn memory_failure(e: MemoryError) -> Result<ExitReason, VMCoreError> {
        match e.as_exit_reason() {
            Some(exit_reason) => Ok(exit_reason),
            None => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::memory::{AccessType, Heap};
    use std::error::Error;

    const BASE: MemAddress = 0x2_0000;

    fn vm_state_with_page(gas: i64) -> Result<VMState, MemoryError> {
        let mut vm_state = VMState {
            gas_counter: gas,
            ..Default::default()
        };
        vm_state
            .memory
            .set_address_range_access(BASE..BASE + 1, AccessType::ReadWrite)?;
        Ok(vm_state)
    }

    #[test]
    fn test_apply_register_and_memory() -> Result<(), Box<dyn Error>> {
        let mut vm_state = vm_state_with_page(10)?;
        let changes = vec![
            Modification::Gas(1),
            Modification::Register(3, 42),
            Modification::Memory(MemWrite::new(BASE, vec![1, 2])),
        ];
        let exit = VMStateMutator::apply_state_change(&mut vm_state, &changes, 5)?;
        assert_eq!(exit, ExitReason::Continue);
        assert_eq!(vm_state.gas_counter, 9);
        assert_eq!(vm_state.regs[3], 42);
        assert_eq!(vm_state.pc, 5);
        assert_eq!(vm_state.memory.read_bytes(BASE, 2)?, vec![1, 2]);
        Ok(())
    }

    #[test]
    fn test_jump_overrides_next_pc() -> Result<(), Box<dyn Error>> {
        let mut vm_state = vm_state_with_page(10)?;
        let changes = vec![Modification::Gas(1), Modification::Jump(100)];
        VMStateMutator::apply_state_change(&mut vm_state, &changes, 5)?;
        assert_eq!(vm_state.pc, 100);
        Ok(())
    }

    #[test]
    fn test_out_of_gas_applies_nothing_else() -> Result<(), Box<dyn Error>> {
        let mut vm_state = vm_state_with_page(0)?;
        let changes = vec![Modification::Gas(1), Modification::Register(0, 1)];
        let exit = VMStateMutator::apply_state_change(&mut vm_state, &changes, 5)?;
        assert_eq!(exit, ExitReason::OutOfGas);
        assert_eq!(vm_state.gas_counter, -1);
        assert_eq!(vm_state.regs[0], 0);
        assert_eq!(vm_state.pc, 0);
        Ok(())
    }

    #[test]
    fn test_faulting_write_is_atomic() -> Result<(), Box<dyn Error>> {
        let mut vm_state = vm_state_with_page(10)?;
        let changes = vec![
            Modification::Gas(1),
            Modification::Register(1, 9),
            Modification::Memory(MemWrite::new(BASE, vec![7])),
            Modification::Memory(MemWrite::new(BASE + 0x1000, vec![7])),
        ];
        let exit = VMStateMutator::apply_state_change(&mut vm_state, &changes, 5)?;
        assert_eq!(exit, ExitReason::PageFault(BASE + 0x1000));
        assert_eq!(vm_state.gas_counter, 9);
        assert_eq!(vm_state.regs[1], 0);
        assert_eq!(vm_state.pc, 0);
        assert_eq!(vm_state.memory.read_bytes(BASE, 1)?, vec![0]);
        Ok(())
    }

    #[test]
    fn test_forbidden_write_panics() -> Result<(), Box<dyn Error>> {
        let mut vm_state = vm_state_with_page(10)?;
        let changes = vec![Modification::Memory(MemWrite::new(0x10, vec![7]))];
        let exit = VMStateMutator::apply_state_change(&mut vm_state, &changes, 5)?;
        assert_eq!(exit, ExitReason::Panic);
        Ok(())
    }

    #[test]
    fn test_heap_grow() -> Result<(), Box<dyn Error>> {
        let mut vm_state = VMState::default();
        vm_state.memory.heap = Heap::new(BASE, BASE + 0x4000);
        VMStateMutator::apply_state_change(
            &mut vm_state,
            &[Modification::HeapGrow(BASE + 0x1800)],
            1,
        )?;
        assert_eq!(vm_state.memory.heap.pointer, BASE + 0x1800);
        assert!(vm_state.memory.is_address_range_writable(BASE, 0x2000));
        Ok(())
    }

    #[test]
    fn test_invalid_heap_grow_charges_no_gas() {
        let mut vm_state = VMState {
            gas_counter: 10,
            ..Default::default()
        };
        vm_state.memory.heap = Heap::new(BASE, BASE + 0x4000);
        let before = vm_state.clone();
        let result = VMStateMutator::apply_state_change(
            &mut vm_state,
            &[
                Modification::Gas(1),
                Modification::Register(0, 1),
                Modification::HeapGrow(BASE + 0x5000),
            ],
            1,
        );
        assert!(matches!(
            result,
            Err(VMCoreError::MemoryError(MemoryError::InvalidSbrk { .. }))
        ));
        assert_eq!(vm_state, before);
    }

    #[test]
    fn test_host_call_change() -> Result<(), Box<dyn Error>> {
        let mut vm_state = vm_state_with_page(100)?;
        vm_state.pc = 7;
        let change = HostCallVMStateChange {
            r7_write: Some(1),
            r8_write: Some(2),
            memory_write: Some(MemWrite::new(BASE, vec![3])),
            ..Default::default()
        };
        let exit = VMStateMutator::apply_host_call_state_change(&mut vm_state, change)?;
        assert_eq!(exit, ExitReason::Continue);
        assert_eq!(vm_state.gas_counter, 100 - HOSTCALL_BASE_GAS_CHARGE as i64);
        assert_eq!((vm_state.regs[7], vm_state.regs[8]), (1, 2));
        assert_eq!(vm_state.pc, 7);
        assert_eq!(vm_state.memory.read_bytes(BASE, 1)?, vec![3]);
        Ok(())
    }
}
