use crate::error::PVMError;
use jam_pvm_core::{
    error::VMCoreError::*,
    program::types::{formatted_program::FormattedProgram, program_state::ProgramState},
    state::{
        memory::{AccessType, Heap, Memory},
        vm_state::VMState,
    },
    utils::VMUtils,
};
use jam_pvm_types::{
    common::{MemAddress, RegValue},
    constants::{INIT_INPUT_SIZE, INIT_ZONE_SIZE, PAGE_SIZE},
};
use std::sync::Arc;

/// Main stateful PVM struct.
#[derive(Debug)]
pub struct PVM {
    /// The mutable VM state
    pub state: VMState,
    /// The static program state shared by every run of the same standard program.
    pub program_state: Arc<ProgramState>,
}

/// Start and end addresses of the standard program memory regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryLayout {
    pub static_start: MemAddress,
    pub static_end: MemAddress,
    pub heap_start: MemAddress,
    pub heap_end: MemAddress,
    pub stack_start: MemAddress,
    pub stack_end: MemAddress,
    pub args_start: MemAddress,
    pub args_end: MemAddress,
}

impl MemoryLayout {
    fn new(fp: &FormattedProgram, args_len: usize) -> Self {
        let zone = INIT_ZONE_SIZE as u64;
        let input = INIT_INPUT_SIZE as u64;

        let static_start = zone;
        let static_end = static_start + VMUtils::page_align(fp.static_size as usize) as u64;

        let heap_start = 2 * zone + VMUtils::zone_align(fp.static_size as usize) as u64;
        let heap_end = heap_start
            + VMUtils::page_align(fp.heap_size as usize) as u64
            + fp.extra_heap_pages as u64 * PAGE_SIZE as u64;

        let stack_end = (1 << 32) - 2 * zone - input;
        let stack_start = stack_end - VMUtils::page_align(fp.stack_size as usize) as u64;

        let args_start = (1 << 32) - zone - input;
        let args_end = args_start + VMUtils::page_align(args_len) as u64;

        // Every bound fits in 32 bits once `is_program_size_valid` holds.
        Self {
            static_start: static_start as MemAddress,
            static_end: static_end as MemAddress,
            heap_start: heap_start as MemAddress,
            heap_end: heap_end as MemAddress,
            stack_start: stack_start as MemAddress,
            stack_end: stack_end as MemAddress,
            args_start: args_start as MemAddress,
            args_end: args_end as MemAddress,
        }
    }
}

impl PVM {
    /// Initialize memory and registers of PVM with provided program and arguments.
    ///
    /// Represents `Y` of the GP.
    pub fn new_with_formatted_program(
        formatted_program: &FormattedProgram,
        program_state: Arc<ProgramState>,
        args: &[u8],
    ) -> Result<Self, PVMError> {
        // Check argument data size limit
        if args.len() > INIT_INPUT_SIZE {
            return Err(PVMError::VMCoreError(ProgramArgsSizeLimitExceeded));
        }

        if !formatted_program.is_program_size_valid() {
            return Err(PVMError::VMCoreError(InvalidProgram));
        }

        let mut pvm = Self {
            state: VMState::default(),
            program_state,
        };
        pvm.setup_memory_layout(formatted_program, args)?;
        pvm.initialize_registers(args.len());

        tracing::info!(
            accessible_pages = pvm.state.memory.accessible_page_count(),
            args_len = args.len(),
            "PVM initialized."
        );
        Ok(pvm)
    }

    fn setup_memory_layout(&mut self, fp: &FormattedProgram, args: &[u8]) -> Result<(), PVMError> {
        let layout = MemoryLayout::new(fp, args.len());
        let mut memory = Memory::new();

        // Program-specific read-only static data (o)
        memory.set_address_range_access(
            layout.static_start..layout.static_end,
            AccessType::ReadWrite,
        )?;
        memory.write_bytes(layout.static_start, &fp.static_data)?;
        memory.set_address_range_access(
            layout.static_start..layout.static_end,
            AccessType::ReadOnly,
        )?;

        // Read-write heap data (w)
        memory
            .set_address_range_access(layout.heap_start..layout.heap_end, AccessType::ReadWrite)?;
        memory.write_bytes(layout.heap_start, &fp.heap_data)?;

        // Stack (s)
        memory.set_address_range_access(
            layout.stack_start..layout.stack_end,
            AccessType::ReadWrite,
        )?;

        // `sbrk` grows the heap from the end of `w` up to one zone below the stack
        memory.heap = Heap::new(
            layout.heap_end,
            layout.stack_start - INIT_ZONE_SIZE as MemAddress,
        );

        // Arguments (a)
        memory
            .set_address_range_access(layout.args_start..layout.args_end, AccessType::ReadWrite)?;
        memory.write_bytes(layout.args_start, args)?;
        memory
            .set_address_range_access(layout.args_start..layout.args_end, AccessType::ReadOnly)?;

        // Other addresses are inaccessible by default

        tracing::debug!("----------------- Memory Layout -----------------");
        for (name, start, end) in [
            ("Static    (o)", layout.static_start, layout.static_end),
            ("Heap      (w)", layout.heap_start, layout.heap_end),
            ("Stack     (s)", layout.stack_start, layout.stack_end),
            ("Arguments (a)", layout.args_start, layout.args_end),
        ] {
            tracing::debug!(
                "{name} page range: {}..{}",
                Memory::get_page_and_offset(start).0,
                Memory::get_page_and_offset(end).0
            );
        }
        tracing::debug!("-------------------------------------------------");
        self.state.memory = memory;
        Ok(())
    }

    pub fn initialize_registers(&mut self, args_len: usize) {
        self.state.regs[0] = (1 << 32) - (1 << 16);
        self.state.regs[1] = (1 << 32) - (2 * INIT_ZONE_SIZE + INIT_INPUT_SIZE) as RegValue;
        self.state.regs[7] = (1 << 32) - (INIT_ZONE_SIZE + INIT_INPUT_SIZE) as RegValue;
        self.state.regs[8] = args_len as RegValue;
    }

    /// Reads the `[r7, r7 + r8)` output range of a halted program, if it is readable.
    pub(crate) fn read_output(&self) -> Option<Vec<u8>> {
        let start_address = self.state.read_reg_as_mem_address(7).ok()?;
        let data_len = self.state.read_reg_as_usize(8).ok()?;
        self.state.memory.read_bytes(start_address, data_len).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jam_pvm_core::program::builder::ProgramBuilder;
    use jam_pvm_core::program::instruction::opcode::Opcode;
    use std::error::Error;

    fn formatted_program() -> Result<FormattedProgram, Box<dyn Error>> {
        let code = ProgramBuilder::new()
            .instruction(Opcode::TRAP, &[])
            .build_blob()?;
        Ok(FormattedProgram {
            static_size: 3,
            heap_size: 2,
            extra_heap_pages: 1,
            stack_size: 0x1800,
            static_data: vec![1, 2, 3],
            heap_data: vec![4, 5],
            code_size: code.len() as u32,
            code,
        })
    }

    fn init(fp: &FormattedProgram, args: &[u8]) -> Result<PVM, Box<dyn Error>> {
        let program_state = ProgramState::from_blob(&fp.code)?;
        Ok(PVM::new_with_formatted_program(
            fp,
            Arc::new(program_state),
            args,
        )?)
    }

    #[test]
    fn test_memory_layout() -> Result<(), Box<dyn Error>> {
        let layout = MemoryLayout::new(&formatted_program()?, 5);
        assert_eq!(layout.static_start, 0x1_0000);
        assert_eq!(layout.static_end, 0x1_1000);
        assert_eq!(layout.heap_start, 0x3_0000);
        assert_eq!(layout.heap_end, 0x3_2000);
        assert_eq!(layout.stack_end, 0xfefe_0000);
        assert_eq!(layout.stack_start, 0xfefd_e000);
        assert_eq!(layout.args_start, 0xfeff_0000);
        assert_eq!(layout.args_end, 0xfeff_1000);
        Ok(())
    }

    #[test]
    fn test_initial_state() -> Result<(), Box<dyn Error>> {
        let fp = formatted_program()?;
        let pvm = init(&fp, &[9, 8, 7, 6, 5])?;
        let state = &pvm.state;

        assert_eq!(state.regs[0], 0xffff_0000);
        assert_eq!(state.regs[1], 0xfefe_0000);
        assert_eq!(state.regs[7], 0xfeff_0000);
        assert_eq!(state.regs[8], 5);
        assert!(state
            .regs
            .iter()
            .enumerate()
            .all(|(i, &r)| matches!(i, 0 | 1 | 7 | 8) || r == 0));

        let memory = &state.memory;
        assert_eq!(memory.read_bytes(0x1_0000, 4)?, vec![1, 2, 3, 0]);
        assert!(!memory.is_address_range_writable(0x1_0000, 1));
        assert_eq!(memory.read_bytes(0x3_0000, 3)?, vec![4, 5, 0]);
        assert!(memory.is_address_range_writable(0x3_1fff, 1));
        assert!(!memory.is_address_range_readable(0x3_2000, 1));
        assert!(memory.is_address_range_writable(0xfefd_e000, 0x2000));
        assert!(!memory.is_address_range_readable(0xfefd_dfff, 1));
        assert_eq!(memory.read_bytes(0xfeff_0000, 5)?, vec![9, 8, 7, 6, 5]);
        assert!(!memory.is_address_range_writable(0xfeff_0000, 1));

        assert_eq!(memory.heap, Heap::new(0x3_2000, 0xfefc_e000));
        assert_eq!(pvm.read_output(), Some(vec![9, 8, 7, 6, 5]));
        Ok(())
    }

    #[test]
    fn test_init_rejects_oversized_args() -> Result<(), Box<dyn Error>> {
        let fp = formatted_program()?;
        let args = vec![0; INIT_INPUT_SIZE + 1];
        assert!(matches!(
            init(&fp, &args)
                .err()
                .and_then(|e| e.downcast::<PVMError>().ok())
                .map(|e| *e),
            Some(PVMError::VMCoreError(ProgramArgsSizeLimitExceeded))
        ));
        Ok(())
    }
}
