use crate::{error::VMCoreError, state::memory::Memory};
use jam_pvm_types::{
    common::{MemAddress, RegValue, SignedGas},
    constants::REGISTERS_COUNT,
};

pub type RegIndex = usize;
pub type Registers = [RegValue; REGISTERS_COUNT];

/// Mutable VM state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VMState {
    /// `φ`: Registers
    pub regs: Registers,
    /// `μ`: RAM
    pub memory: Memory,
    /// `ı`: Program counter
    pub pc: RegValue,
    /// `ρ`: Gas counter
    pub gas_counter: SignedGas,
}

/// The execution context a single invocation owns.
pub type ExecutionContext = VMState;

impl VMState {
    pub fn new(pc: RegValue, gas_counter: SignedGas, regs: Registers, memory: Memory) -> Self {
        Self {
            regs,
            memory,
            pc,
            gas_counter,
        }
    }

    /// Reads a register. Register indices come out of operand decoding clamped to the
    /// register file, so this never goes out of bounds for decoded instructions.
    #[inline(always)]
    pub fn read_reg(&self, index: RegIndex) -> RegValue {
        self.regs[index.min(REGISTERS_COUNT - 1)]
    }

    #[inline(always)]
    pub fn read_reg_as_usize(&self, index: RegIndex) -> Result<usize, VMCoreError> {
        let reg = self
            .regs
            .get(index)
            .ok_or(VMCoreError::InvalidRegIndex(index))?;
        usize::try_from(*reg).map_err(|_| VMCoreError::InvalidRegVal(index, *reg))
    }

    #[inline(always)]
    pub fn read_reg_as_mem_address(&self, index: RegIndex) -> Result<MemAddress, VMCoreError> {
        let reg = self
            .regs
            .get(index)
            .ok_or(VMCoreError::InvalidRegIndex(index))?;
        MemAddress::try_from(*reg).map_err(|_| VMCoreError::InvalidRegVal(index, *reg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_reg_as_mem_address() {
        let mut state = VMState::default();
        state.regs[7] = 0x1_0000;
        state.regs[8] = 1 << 40;
        assert_eq!(state.read_reg_as_mem_address(7).ok(), Some(0x1_0000));
        assert!(matches!(
            state.read_reg_as_mem_address(8),
            Err(VMCoreError::InvalidRegVal(8, _))
        ));
        assert!(matches!(
            state.read_reg_as_mem_address(REGISTERS_COUNT),
            Err(VMCoreError::InvalidRegIndex(_))
        ));
    }
}
