use jam_pvm_codec::prelude::*;
use jam_pvm_core::{
    interpreter::Interpreter,
    program::{
        builder::ProgramBuilder,
        instruction::registry::InstructionRegistry,
        types::{program::Program, program_state::ProgramState},
    },
    state::{
        memory::{AccessType, Memory},
        vm_state::VMState,
    },
};
use jam_pvm_types::{common::MemAddress, constants::PAGE_SIZE, exit_reason::ExitReason};
use proptest::{collection::vec, prelude::*};

const BASE: MemAddress = 0x2_0000;

/// A registered opcode followed by up to 10 arbitrary operand bytes.
fn instruction() -> impl Strategy<Value = (u8, Vec<u8>)> {
    let opcodes: Vec<u8> = InstructionRegistry::entries()
        .iter()
        .map(|entry| entry.opcode as u8)
        .collect();
    (prop::sample::select(opcodes), vec(any::<u8>(), 0..=10))
}

fn program_builder() -> impl Strategy<Value = ProgramBuilder> {
    (vec(instruction(), 1..32), vec(any::<u8>(), 0..4), 1u8..=4).prop_map(
        |(instructions, jump_targets, entry_width)| {
            let builder = instructions
                .into_iter()
                .fold(ProgramBuilder::new(), |builder, (opcode, operands)| {
                    builder.raw(opcode, &operands)
                });
            let code_len = builder.offset() as MemAddress;
            let jump_table = jump_targets
                .into_iter()
                .map(|target| target as MemAddress % code_len)
                .collect();
            builder.jump_table(jump_table, entry_width)
        },
    )
}

fn program_state() -> impl Strategy<Value = ProgramState> {
    program_builder().prop_filter_map("valid program", |builder| builder.build_state().ok())
}

fn vm_state(gas: i64, regs: Vec<u64>) -> VMState {
    let mut state = VMState {
        gas_counter: gas,
        ..Default::default()
    };
    for (reg, value) in state.regs.iter_mut().zip(regs) {
        *reg = value;
    }
    state
        .memory
        .set_address_range_access(BASE..BASE + 2 * PAGE_SIZE as MemAddress, AccessType::ReadWrite)
        .ok();
    state
}

proptest! {
    #[test]
    fn program_round_trip(builder in program_builder()) {
        let program = builder.build().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let blob = program.encode().map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(program.size_hint(), blob.len());
        prop_assert_eq!(Program::from_blob(&blob), Ok(program));
    }

    #[test]
    fn execution_is_deterministic(
        program_state in program_state(),
        gas in 0i64..200,
        regs in vec(any::<u64>(), 13),
    ) {
        let mut first = vm_state(gas, regs.clone());
        let mut second = vm_state(gas, regs);
        let first_exit = Interpreter::run(&mut first, &program_state);
        let second_exit = Interpreter::run(&mut second, &program_state);
        prop_assert_eq!(first_exit.ok(), second_exit.ok());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn gas_never_increases(
        program_state in program_state(),
        gas in 1i64..100,
        regs in vec(any::<u64>(), 13),
    ) {
        let mut state = vm_state(gas, regs);
        let mut steps = 0;
        loop {
            let gas_before = state.gas_counter;
            let exit_reason = Interpreter::step(&mut state, &program_state)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            steps += 1;
            prop_assert!(state.gas_counter < gas_before);
            if exit_reason != ExitReason::Continue || state.gas_counter <= 0 {
                break;
            }
        }
        prop_assert!(steps <= gas);
    }

    #[test]
    fn static_jump_targets_are_block_beginnings(
        program_state in program_state(),
        gas in 1i64..200,
        regs in vec(any::<u64>(), 13),
    ) {
        let mut state = vm_state(gas, regs);
        loop {
            let pc = state.pc;
            let exit_reason = Interpreter::step(&mut state, &program_state)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            match exit_reason {
                ExitReason::Continue => {
                    let fell_through = state.pc == program_state.next_pc(pc);
                    prop_assert!(fell_through || program_state.is_block_beginning(state.pc));
                }
                ExitReason::Panic | ExitReason::RegularHalt | ExitReason::PageFault(_) => {
                    prop_assert_eq!(state.pc, pc);
                    break;
                }
                _ => break,
            }
            if state.gas_counter <= 0 {
                break;
            }
        }
    }

    #[test]
    fn memory_writes_are_all_or_nothing(
        writable_pages in vec(any::<bool>(), 4),
        offset in 0u32..(4 * PAGE_SIZE as u32),
        data in vec(any::<u8>(), 1..(2 * PAGE_SIZE)),
    ) {
        let mut memory = Memory::new();
        for (i, &writable) in writable_pages.iter().enumerate() {
            if writable {
                let start = BASE + (i * PAGE_SIZE) as MemAddress;
                memory
                    .set_address_range_access(start..start + 1, AccessType::ReadWrite)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
        }
        let before = memory.clone();
        let address = BASE + offset;
        let allowed = memory.is_address_range_writable(address, data.len());

        match memory.write_bytes(address, &data) {
            Ok(()) => {
                prop_assert!(allowed);
                prop_assert_eq!(memory.read_bytes(address, data.len()).ok(), Some(data.clone()));
                if let Some(prev) = address.checked_sub(1) {
                    prop_assert_eq!(
                        memory.read_bytes(prev, 1).ok(),
                        before.read_bytes(prev, 1).ok()
                    );
                }
            }
            Err(_) => {
                prop_assert!(!allowed);
                prop_assert_eq!(&memory, &before);
            }
        }
    }
}
