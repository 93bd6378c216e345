use crate::{
    conditional_reg_write, continue_with_mem_write, continue_with_reg_write, jump_result,
    program::{
        instruction::{operands::*, Evaluation},
        types::program_state::ProgramState,
    },
    state::{state_change::Modification, vm_state::VMState},
    utils::VMUtils,
};
use jam_pvm_types::{
    common::{HostCallId, MemAddress, RegValue},
    constants::{JUMP_ALIGNMENT, SPECIAL_HALT_ADDRESS},
    exit_reason::ExitReason,
};

/// A collection of pure PVM instruction evaluators.
///
/// Every evaluator reads the VM state and returns the modifications the instruction makes, or the
/// exit reason that stops execution. None of them touches the state or charges gas.
pub struct InstructionSet;
impl InstructionSet {
    //
    // Group 0: Helper functions
    //

    /// Jumps to `target` when `condition` holds.
    ///
    /// The target must be the beginning of a basic block, otherwise the machine panics.
    fn branch(program_state: &ProgramState, target: RegValue, condition: bool) -> Evaluation {
        if !condition {
            return Ok(Vec::new());
        }
        if program_state.is_block_beginning(target) {
            jump_result!(target)
        } else {
            Err(ExitReason::Panic)
        }
    }

    /// Performs a dynamic jump through the jump table.
    ///
    /// Dynamic addresses are jump table indices incremented by one and multiplied by
    /// `JUMP_ALIGNMENT`. The reserved address `2^32 - 2^16` halts the machine.
    pub fn djump(program_state: &ProgramState, a: RegValue) -> Evaluation {
        let a = a as MemAddress as RegValue;
        if a == SPECIAL_HALT_ADDRESS {
            return Err(ExitReason::RegularHalt);
        }

        let alignment = JUMP_ALIGNMENT as RegValue;
        let jump_table = program_state.jump_table();
        if a == 0 || a > jump_table.len() as RegValue * alignment || a % alignment != 0 {
            return Err(ExitReason::Panic);
        }

        match jump_table.get((a / alignment - 1) as usize) {
            Some(&target) if program_state.is_block_beginning(target as RegValue) => {
                jump_result!(target as RegValue)
            }
            _ => Err(ExitReason::Panic),
        }
    }

    /// Reads `size` octets at `address` as a little-endian integer, sign-extending it if
    /// `signed` is set.
    fn load(
        vm_state: &VMState,
        address: MemAddress,
        size: usize,
        signed: bool,
    ) -> Result<RegValue, ExitReason> {
        let bytes = vm_state
            .memory
            .read_bytes(address, size)
            .map_err(|e| e.as_exit_reason().unwrap_or(ExitReason::Panic))?;
        let mut buf = [0u8; 8];
        buf[..size].copy_from_slice(&bytes);
        let val = u64::from_le_bytes(buf);
        Ok(if signed { VMUtils::sext(val, size) } else { val })
    }

    /// Writes the lowest `size` octets of `value` to `address`.
    fn store(address: MemAddress, value: RegValue, size: usize) -> Evaluation {
        continue_with_mem_write!(address, value.to_le_bytes()[..size].to_vec())
    }

    //
    // Group 1: Instructions without Arguments
    //

    /// `panic` with no mutation to the VM state
    ///
    /// Opcode: 0
    pub fn trap(
        _vm_state: &VMState,
        _program_state: &ProgramState,
    ) -> Evaluation {
        Err(ExitReason::Panic)
    }

    /// Continue program with no mutation to the VM state
    ///
    /// Opcode: 1
    pub fn fallthrough(
        _vm_state: &VMState,
        _program_state: &ProgramState,
    ) -> Evaluation {
        Ok(Vec::new())
    }

    //
    // Group 2: Instructions with Arguments of One Immediate
    //

    /// Invoke host function call
    ///
    /// Suspends execution; the pc moves past this instruction so that the invocation can resume.
    ///
    /// Opcode: 10
    pub fn ecalli(
        _vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneImmArgs,
    ) -> Evaluation {
        Err(ExitReason::HostCall(args.imm_x as HostCallId))
    }

    //
    // Group 3: Instructions with Arguments of One Register and One Extended Width Immediate
    //

    /// Load a 64-bit immediate value into a register
    ///
    /// Opcode: 20
    pub fn load_imm_64(
        _vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegExtImmArgs,
    ) -> Evaluation {
        continue_with_reg_write!(args.r_a, args.imm_x)
    }

    //
    // Group 4: Instructions with Arguments of Two Immediates
    //

    /// Store immediate 8-bit value to memory
    ///
    /// Opcode: 30
    pub fn store_imm_u8(
        _vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoImmArgs,
    ) -> Evaluation {
        Self::store(args.imm_x as MemAddress, args.imm_y, 1)
    }

    /// Store immediate 16-bit value to memory
    ///
    /// Opcode: 31
    pub fn store_imm_u16(
        _vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoImmArgs,
    ) -> Evaluation {
        Self::store(args.imm_x as MemAddress, args.imm_y, 2)
    }

    /// Store immediate 32-bit value to memory
    ///
    /// Opcode: 32
    pub fn store_imm_u32(
        _vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoImmArgs,
    ) -> Evaluation {
        Self::store(args.imm_x as MemAddress, args.imm_y, 4)
    }

    /// Store immediate 64-bit value to memory
    ///
    /// Opcode: 33
    pub fn store_imm_u64(
        _vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoImmArgs,
    ) -> Evaluation {
        Self::store(args.imm_x as MemAddress, args.imm_y, 8)
    }

    //
    // Group 5: Instructions with Arguments of One Offset
    //

    /// Unconditional jump
    ///
    /// Opcode: 40
    pub fn jump(
        _vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneOffsetArgs,
    ) -> Evaluation {
        Self::branch(program_state, args.target, true)
    }

    //
    // Group 6: Instructions with Arguments of One Register & One Immediate
    //

    /// Dynamic jump through the jump table
    ///
    /// Opcode: 50
    pub fn jump_ind(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        Self::djump(
            program_state,
            vm_state.read_reg(args.r_a).wrapping_add(args.imm_x),
        )
    }

    /// Load immediate value into a register
    ///
    /// Opcode: 51
    pub fn load_imm(
        _vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        continue_with_reg_write!(args.r_a, args.imm_x)
    }

    /// Load unsigned 8-bit value from memory into a register
    ///
    /// Opcode: 52
    pub fn load_u8(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        let val = Self::load(vm_state, args.imm_x as MemAddress, 1, false)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load signed 8-bit value from memory into a register
    ///
    /// Opcode: 53
    pub fn load_i8(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        let val = Self::load(vm_state, args.imm_x as MemAddress, 1, true)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load unsigned 16-bit value from memory into a register
    ///
    /// Opcode: 54
    pub fn load_u16(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        let val = Self::load(vm_state, args.imm_x as MemAddress, 2, false)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load signed 16-bit value from memory into a register
    ///
    /// Opcode: 55
    pub fn load_i16(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        let val = Self::load(vm_state, args.imm_x as MemAddress, 2, true)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load unsigned 32-bit value from memory into a register
    ///
    /// Opcode: 56
    pub fn load_u32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        let val = Self::load(vm_state, args.imm_x as MemAddress, 4, false)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load signed 32-bit value from memory into a register
    ///
    /// Opcode: 57
    pub fn load_i32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        let val = Self::load(vm_state, args.imm_x as MemAddress, 4, true)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load unsigned 64-bit value from memory into a register
    ///
    /// Opcode: 58
    pub fn load_u64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        let val = Self::load(vm_state, args.imm_x as MemAddress, 8, false)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Store 8-bit register value to memory
    ///
    /// Opcode: 59
    pub fn store_u8(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        Self::store(args.imm_x as MemAddress, vm_state.read_reg(args.r_a), 1)
    }

    /// Store 16-bit register value to memory
    ///
    /// Opcode: 60
    pub fn store_u16(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        Self::store(args.imm_x as MemAddress, vm_state.read_reg(args.r_a), 2)
    }

    /// Store 32-bit register value to memory
    ///
    /// Opcode: 61
    pub fn store_u32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        Self::store(args.imm_x as MemAddress, vm_state.read_reg(args.r_a), 4)
    }

    /// Store 64-bit register value to memory
    ///
    /// Opcode: 62
    pub fn store_u64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegOneImmArgs,
    ) -> Evaluation {
        Self::store(args.imm_x as MemAddress, vm_state.read_reg(args.r_a), 8)
    }

    //
    // Group 7: Instructions with Arguments of One Register & Two Immediates
    //

    /// Store immediate 8-bit value to memory indirectly
    ///
    /// Opcode: 70
    pub fn store_imm_ind_u8(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegTwoImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_a).wrapping_add(args.imm_x) as MemAddress;
        Self::store(address, args.imm_y, 1)
    }

    /// Store immediate 16-bit value to memory indirectly
    ///
    /// Opcode: 71
    pub fn store_imm_ind_u16(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegTwoImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_a).wrapping_add(args.imm_x) as MemAddress;
        Self::store(address, args.imm_y, 2)
    }

    /// Store immediate 32-bit value to memory indirectly
    ///
    /// Opcode: 72
    pub fn store_imm_ind_u32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegTwoImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_a).wrapping_add(args.imm_x) as MemAddress;
        Self::store(address, args.imm_y, 4)
    }

    /// Store immediate 64-bit value to memory indirectly
    ///
    /// Opcode: 73
    pub fn store_imm_ind_u64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &OneRegTwoImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_a).wrapping_add(args.imm_x) as MemAddress;
        Self::store(address, args.imm_y, 8)
    }

    //
    // Group 8: Instructions with Arguments of One Register, One Immediate and One Offset
    //

    /// Load immediate value and jump
    ///
    /// Opcode: 80
    pub fn load_imm_jump(
        _vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let mut changes = Self::branch(program_state, args.target, true)?;
        changes.push(Modification::Register(args.r_a, args.imm_x));
        Ok(changes)
    }

    /// Branch if equal to immediate
    ///
    /// Opcode: 81
    pub fn branch_eq_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition = vm_state.read_reg(args.r_a) == args.imm_x;
        Self::branch(program_state, args.target, condition)
    }

    /// Branch if not equal to immediate
    ///
    /// Opcode: 82
    pub fn branch_ne_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition = vm_state.read_reg(args.r_a) != args.imm_x;
        Self::branch(program_state, args.target, condition)
    }

    /// Branch if less than immediate (unsigned)
    ///
    /// Opcode: 83
    pub fn branch_lt_u_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition = vm_state.read_reg(args.r_a) < args.imm_x;
        Self::branch(program_state, args.target, condition)
    }

    /// Branch if less than or equal to immediate (unsigned)
    ///
    /// Opcode: 84
    pub fn branch_le_u_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition = vm_state.read_reg(args.r_a) <= args.imm_x;
        Self::branch(program_state, args.target, condition)
    }

    /// Branch if greater than or equal to immediate (unsigned)
    ///
    /// Opcode: 85
    pub fn branch_ge_u_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition = vm_state.read_reg(args.r_a) >= args.imm_x;
        Self::branch(program_state, args.target, condition)
    }

    /// Branch if greater than immediate (unsigned)
    ///
    /// Opcode: 86
    pub fn branch_gt_u_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition = vm_state.read_reg(args.r_a) > args.imm_x;
        Self::branch(program_state, args.target, condition)
    }

    /// Branch if less than immediate (signed)
    ///
    /// Opcode: 87
    pub fn branch_lt_s_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition =
            VMUtils::u64_to_i64(vm_state.read_reg(args.r_a)) < VMUtils::u64_to_i64(args.imm_x);
        Self::branch(program_state, args.target, condition)
    }

    /// Branch if less than or equal to immediate (signed)
    ///
    /// Opcode: 88
    pub fn branch_le_s_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition =
            VMUtils::u64_to_i64(vm_state.read_reg(args.r_a)) <= VMUtils::u64_to_i64(args.imm_x);
        Self::branch(program_state, args.target, condition)
    }

    /// Branch if greater than or equal to immediate (signed)
    ///
    /// Opcode: 89
    pub fn branch_ge_s_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition =
            VMUtils::u64_to_i64(vm_state.read_reg(args.r_a)) >= VMUtils::u64_to_i64(args.imm_x);
        Self::branch(program_state, args.target, condition)
    }

    /// Branch if greater than immediate (signed)
    ///
    /// Opcode: 90
    pub fn branch_gt_s_imm(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &OneRegImmOffsetArgs,
    ) -> Evaluation {
        let condition =
            VMUtils::u64_to_i64(vm_state.read_reg(args.r_a)) > VMUtils::u64_to_i64(args.imm_x);
        Self::branch(program_state, args.target, condition)
    }

    //
    // Group 9: Instructions with Arguments of Two Registers
    //

    /// Move value from one register to another
    ///
    /// Opcode: 100
    pub fn move_reg(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        continue_with_reg_write!(args.r_d, vm_state.read_reg(args.r_a))
    }

    /// System break (allocate heap memory)
    ///
    /// With a zero request, returns the current heap pointer. Otherwise advances the pointer by the
    /// requested size and returns its previous value, or zero if the heap cannot grow that far.
    ///
    /// Opcode: 101
    pub fn sbrk(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let requested = vm_state.read_reg(args.r_a);
        let heap = vm_state.memory.heap;
        if requested == 0 {
            return continue_with_reg_write!(args.r_d, heap.pointer as RegValue);
        }
        let new_pointer = MemAddress::try_from(requested)
            .ok()
            .and_then(|size| heap.pointer.checked_add(size))
            .filter(|&new_pointer| new_pointer <= heap.end);
        match new_pointer {
            Some(new_pointer) => Ok(vec![
                Modification::Register(args.r_d, heap.pointer as RegValue),
                Modification::HeapGrow(new_pointer),
            ]),
            None => continue_with_reg_write!(args.r_d, 0),
        }
    }

    /// Count the number of set bits of a 64-bit value
    ///
    /// Opcode: 102
    pub fn count_set_bits_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, a.count_ones() as RegValue)
    }

    /// Count the number of set bits of a 32-bit value
    ///
    /// Opcode: 103
    pub fn count_set_bits_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, (a as u32).count_ones() as RegValue)
    }

    /// Count the number of leading zeroes of a 64-bit value
    ///
    /// Opcode: 104
    pub fn leading_zero_bits_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, a.leading_zeros() as RegValue)
    }

    /// Count the number of leading zeroes of a 32-bit value
    ///
    /// Opcode: 105
    pub fn leading_zero_bits_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, (a as u32).leading_zeros() as RegValue)
    }

    /// Count the number of trailing zeroes of a 64-bit value
    ///
    /// Opcode: 106
    pub fn trailing_zero_bits_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, a.trailing_zeros() as RegValue)
    }

    /// Count the number of trailing zeroes of a 32-bit value
    ///
    /// Opcode: 107
    pub fn trailing_zero_bits_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, (a as u32).trailing_zeros() as RegValue)
    }

    /// Sign-extend the lowest octet
    ///
    /// Opcode: 108
    pub fn sign_extend_8(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, a as i8 as i64 as RegValue)
    }

    /// Sign-extend the lowest two octets
    ///
    /// Opcode: 109
    pub fn sign_extend_16(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, a as i16 as i64 as RegValue)
    }

    /// Zero-extend the lowest two octets
    ///
    /// Opcode: 110
    pub fn zero_extend_16(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, a as u16 as RegValue)
    }

    /// Reverse the byte order
    ///
    /// Opcode: 111
    pub fn reverse_bytes(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        continue_with_reg_write!(args.r_d, a.swap_bytes())
    }

    //
    // Group 10: Instructions with Arguments of Two Registers & One Immediate
    //

    /// Store 8-bit register value to memory indirectly
    ///
    /// Opcode: 120
    pub fn store_ind_u8(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        Self::store(address, vm_state.read_reg(args.r_a), 1)
    }

    /// Store 16-bit register value to memory indirectly
    ///
    /// Opcode: 121
    pub fn store_ind_u16(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        Self::store(address, vm_state.read_reg(args.r_a), 2)
    }

    /// Store 32-bit register value to memory indirectly
    ///
    /// Opcode: 122
    pub fn store_ind_u32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        Self::store(address, vm_state.read_reg(args.r_a), 4)
    }

    /// Store 64-bit register value to memory indirectly
    ///
    /// Opcode: 123
    pub fn store_ind_u64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        Self::store(address, vm_state.read_reg(args.r_a), 8)
    }

    /// Load unsigned 8-bit value from memory indirectly
    ///
    /// Opcode: 124
    pub fn load_ind_u8(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        let val = Self::load(vm_state, address, 1, false)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load signed 8-bit value from memory indirectly
    ///
    /// Opcode: 125
    pub fn load_ind_i8(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        let val = Self::load(vm_state, address, 1, true)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load unsigned 16-bit value from memory indirectly
    ///
    /// Opcode: 126
    pub fn load_ind_u16(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        let val = Self::load(vm_state, address, 2, false)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load signed 16-bit value from memory indirectly
    ///
    /// Opcode: 127
    pub fn load_ind_i16(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        let val = Self::load(vm_state, address, 2, true)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load unsigned 32-bit value from memory indirectly
    ///
    /// Opcode: 128
    pub fn load_ind_u32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        let val = Self::load(vm_state, address, 4, false)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load signed 32-bit value from memory indirectly
    ///
    /// Opcode: 129
    pub fn load_ind_i32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        let val = Self::load(vm_state, address, 4, true)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Load unsigned 64-bit value from memory indirectly
    ///
    /// Opcode: 130
    pub fn load_ind_u64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_x) as MemAddress;
        let val = Self::load(vm_state, address, 8, false)?;
        continue_with_reg_write!(args.r_a, val)
    }

    /// Add immediate (32-bit)
    ///
    /// Opcode: 131
    pub fn add_imm_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, VMUtils::sext_32(b.wrapping_add(args.imm_x)))
    }

    /// Bitwise AND with immediate
    ///
    /// Opcode: 132
    pub fn and_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, b & args.imm_x)
    }

    /// Bitwise XOR with immediate
    ///
    /// Opcode: 133
    pub fn xor_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, b ^ args.imm_x)
    }

    /// Bitwise OR with immediate
    ///
    /// Opcode: 134
    pub fn or_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, b | args.imm_x)
    }

    /// Multiply by immediate (32-bit)
    ///
    /// Opcode: 135
    pub fn mul_imm_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, VMUtils::sext_32(b.wrapping_mul(args.imm_x)))
    }

    /// Set if less than immediate (unsigned)
    ///
    /// Opcode: 136
    pub fn set_lt_u_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, (b < args.imm_x) as RegValue)
    }

    /// Set if less than immediate (signed)
    ///
    /// Opcode: 137
    pub fn set_lt_s_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            (VMUtils::u64_to_i64(b) < VMUtils::u64_to_i64(args.imm_x)) as RegValue
        )
    }

    /// Logical shift left by immediate (32-bit)
    ///
    /// Opcode: 138
    pub fn shlo_l_imm_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            VMUtils::sext_32((b as u32).wrapping_shl(args.imm_x as u32) as u64)
        )
    }

    /// Logical shift right by immediate (32-bit)
    ///
    /// Opcode: 139
    pub fn shlo_r_imm_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            VMUtils::sext_32((b as u32).wrapping_shr(args.imm_x as u32) as u64)
        )
    }

    /// Arithmetic shift right by immediate (32-bit)
    ///
    /// Opcode: 140
    pub fn shar_r_imm_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            (b as i32).wrapping_shr(args.imm_x as u32) as i64 as RegValue
        )
    }

    /// Negate register and add immediate (32-bit)
    ///
    /// Opcode: 141
    pub fn neg_add_imm_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, VMUtils::sext_32(args.imm_x.wrapping_sub(b)))
    }

    /// Set if greater than immediate (unsigned)
    ///
    /// Opcode: 142
    pub fn set_gt_u_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, (b > args.imm_x) as RegValue)
    }

    /// Set if greater than immediate (signed)
    ///
    /// Opcode: 143
    pub fn set_gt_s_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            (VMUtils::u64_to_i64(b) > VMUtils::u64_to_i64(args.imm_x)) as RegValue
        )
    }

    /// Logical shift left of immediate by register (32-bit)
    ///
    /// Opcode: 144
    pub fn shlo_l_imm_alt_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            VMUtils::sext_32((args.imm_x as u32).wrapping_shl(b as u32) as u64)
        )
    }

    /// Logical shift right of immediate by register (32-bit)
    ///
    /// Opcode: 145
    pub fn shlo_r_imm_alt_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            VMUtils::sext_32((args.imm_x as u32).wrapping_shr(b as u32) as u64)
        )
    }

    /// Arithmetic shift right of immediate by register (32-bit)
    ///
    /// Opcode: 146
    pub fn shar_r_imm_alt_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            (args.imm_x as i32).wrapping_shr(b as u32) as i64 as RegValue
        )
    }

    /// Conditional move of immediate if zero
    ///
    /// Opcode: 147
    pub fn cmov_iz_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        conditional_reg_write!(vm_state.read_reg(args.r_b) == 0, args.r_a, args.imm_x)
    }

    /// Conditional move of immediate if not zero
    ///
    /// Opcode: 148
    pub fn cmov_nz_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        conditional_reg_write!(vm_state.read_reg(args.r_b) != 0, args.r_a, args.imm_x)
    }

    /// Add immediate (64-bit)
    ///
    /// Opcode: 149
    pub fn add_imm_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, b.wrapping_add(args.imm_x))
    }

    /// Multiply by immediate (64-bit)
    ///
    /// Opcode: 150
    pub fn mul_imm_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, b.wrapping_mul(args.imm_x))
    }

    /// Logical shift left by immediate (64-bit)
    ///
    /// Opcode: 151
    pub fn shlo_l_imm_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, b.wrapping_shl(args.imm_x as u32))
    }

    /// Logical shift right by immediate (64-bit)
    ///
    /// Opcode: 152
    pub fn shlo_r_imm_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, b.wrapping_shr(args.imm_x as u32))
    }

    /// Arithmetic shift right by immediate (64-bit)
    ///
    /// Opcode: 153
    pub fn shar_r_imm_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, (b as i64).wrapping_shr(args.imm_x as u32) as RegValue)
    }

    /// Negate register and add immediate (64-bit)
    ///
    /// Opcode: 154
    pub fn neg_add_imm_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, args.imm_x.wrapping_sub(b))
    }

    /// Logical shift left of immediate by register (64-bit)
    ///
    /// Opcode: 155
    pub fn shlo_l_imm_alt_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, args.imm_x.wrapping_shl(b as u32))
    }

    /// Logical shift right of immediate by register (64-bit)
    ///
    /// Opcode: 156
    pub fn shlo_r_imm_alt_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, args.imm_x.wrapping_shr(b as u32))
    }

    /// Arithmetic shift right of immediate by register (64-bit)
    ///
    /// Opcode: 157
    pub fn shar_r_imm_alt_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, (args.imm_x as i64).wrapping_shr(b as u32) as RegValue)
    }

    /// Rotate right by immediate (64-bit)
    ///
    /// Opcode: 158
    pub fn rot_r_64_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, b.rotate_right((args.imm_x % 64) as u32))
    }

    /// Rotate immediate right by register (64-bit)
    ///
    /// Opcode: 159
    pub fn rot_r_64_imm_alt(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_a, args.imm_x.rotate_right((b % 64) as u32))
    }

    /// Rotate right by immediate (32-bit)
    ///
    /// Opcode: 160
    pub fn rot_r_32_imm(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            VMUtils::sext_32((b as u32).rotate_right((args.imm_x % 32) as u32) as u64)
        )
    }

    /// Rotate immediate right by register (32-bit)
    ///
    /// Opcode: 161
    pub fn rot_r_32_imm_alt(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &TwoRegOneImmArgs,
    ) -> Evaluation {
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_a,
            VMUtils::sext_32((args.imm_x as u32).rotate_right((b % 32) as u32) as u64)
        )
    }

    //
    // Group 11: Instructions with Arguments of Two Registers & One Offset
    //

    /// Branch if equal
    ///
    /// Opcode: 170
    pub fn branch_eq(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &TwoRegOneOffsetArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        Self::branch(program_state, args.target, a == b)
    }

    /// Branch if not equal
    ///
    /// Opcode: 171
    pub fn branch_ne(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &TwoRegOneOffsetArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        Self::branch(program_state, args.target, a != b)
    }

    /// Branch if less than (unsigned)
    ///
    /// Opcode: 172
    pub fn branch_lt_u(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &TwoRegOneOffsetArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        Self::branch(program_state, args.target, a < b)
    }

    /// Branch if less than (signed)
    ///
    /// Opcode: 173
    pub fn branch_lt_s(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &TwoRegOneOffsetArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        Self::branch(program_state, args.target, VMUtils::u64_to_i64(a) < VMUtils::u64_to_i64(b))
    }

    /// Branch if greater than or equal (unsigned)
    ///
    /// Opcode: 174
    pub fn branch_ge_u(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &TwoRegOneOffsetArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        Self::branch(program_state, args.target, a >= b)
    }

    /// Branch if greater than or equal (signed)
    ///
    /// Opcode: 175
    pub fn branch_ge_s(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &TwoRegOneOffsetArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        Self::branch(program_state, args.target, VMUtils::u64_to_i64(a) >= VMUtils::u64_to_i64(b))
    }

    //
    // Group 12: Instructions with Arguments of Two Registers & Two Immediates
    //

    /// Load immediate value and jump indirectly
    ///
    /// The jump address is computed from the register value before the load.
    ///
    /// Opcode: 180
    pub fn load_imm_jump_ind(
        vm_state: &VMState,
        program_state: &ProgramState,
        args: &TwoRegTwoImmArgs,
    ) -> Evaluation {
        let address = vm_state.read_reg(args.r_b).wrapping_add(args.imm_y);
        let mut changes = Self::djump(program_state, address)?;
        changes.push(Modification::Register(args.r_a, args.imm_x));
        Ok(changes)
    }

    //
    // Group 13: Instructions with Arguments of Three Registers
    //

    /// Add (32-bit)
    ///
    /// Opcode: 190
    pub fn add_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, VMUtils::sext_32(a.wrapping_add(b)))
    }

    /// Subtract (32-bit)
    ///
    /// Opcode: 191
    pub fn sub_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, VMUtils::sext_32(a.wrapping_sub(b)))
    }

    /// Multiply (32-bit)
    ///
    /// Opcode: 192
    pub fn mul_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, VMUtils::sext_32(a.wrapping_mul(b)))
    }

    /// Divide unsigned (32-bit)
    ///
    /// Opcode: 193
    pub fn div_u_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);

        let val = match (a as u32).checked_div(b as u32) {
            Some(quotient) => VMUtils::sext_32(quotient as u64),
            None => RegValue::MAX,
        };
        continue_with_reg_write!(args.r_d, val)
    }

    /// Divide signed (32-bit)
    ///
    /// Opcode: 194
    pub fn div_s_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);

        let (a, b) = (a as i32, b as i32);
        let val = if b == 0 {
            RegValue::MAX
        } else {
            a.wrapping_div(b) as i64 as RegValue
        };
        continue_with_reg_write!(args.r_d, val)
    }

    /// Remainder unsigned (32-bit)
    ///
    /// Opcode: 195
    pub fn rem_u_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);

        let (a, b) = (a as u32, b as u32);
        let val = if b == 0 { a } else { a % b };
        continue_with_reg_write!(args.r_d, VMUtils::sext_32(val as u64))
    }

    /// Remainder signed (32-bit)
    ///
    /// Opcode: 196
    pub fn rem_s_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);

        let (a, b) = (a as i32, b as i32);
        let val = if b == 0 { a } else { a.wrapping_rem(b) };
        continue_with_reg_write!(args.r_d, val as i64 as RegValue)
    }

    /// Logical shift left (32-bit)
    ///
    /// Opcode: 197
    pub fn shlo_l_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_d,
            VMUtils::sext_32((a as u32).wrapping_shl(b as u32) as u64)
        )
    }

    /// Logical shift right (32-bit)
    ///
    /// Opcode: 198
    pub fn shlo_r_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_d,
            VMUtils::sext_32((a as u32).wrapping_shr(b as u32) as u64)
        )
    }

    /// Arithmetic shift right (32-bit)
    ///
    /// Opcode: 199
    pub fn shar_r_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, (a as i32).wrapping_shr(b as u32) as i64 as RegValue)
    }

    /// Add (64-bit)
    ///
    /// Opcode: 200
    pub fn add_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.wrapping_add(b))
    }

    /// Subtract (64-bit)
    ///
    /// Opcode: 201
    pub fn sub_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.wrapping_sub(b))
    }

    /// Multiply (64-bit)
    ///
    /// Opcode: 202
    pub fn mul_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.wrapping_mul(b))
    }

    /// Divide unsigned (64-bit)
    ///
    /// Opcode: 203
    pub fn div_u_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.checked_div(b).unwrap_or(RegValue::MAX))
    }

    /// Divide signed (64-bit)
    ///
    /// Opcode: 204
    pub fn div_s_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);

        let val = if b == 0 {
            RegValue::MAX
        } else {
            VMUtils::u64_to_i64(a).wrapping_div(VMUtils::u64_to_i64(b)) as RegValue
        };
        continue_with_reg_write!(args.r_d, val)
    }

    /// Remainder unsigned (64-bit)
    ///
    /// Opcode: 205
    pub fn rem_u_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.checked_rem(b).unwrap_or(a))
    }

    /// Remainder signed (64-bit)
    ///
    /// Opcode: 206
    pub fn rem_s_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);

        let val = if b == 0 {
            a
        } else {
            VMUtils::u64_to_i64(a).wrapping_rem(VMUtils::u64_to_i64(b)) as RegValue
        };
        continue_with_reg_write!(args.r_d, val)
    }

    /// Logical shift left (64-bit)
    ///
    /// Opcode: 207
    pub fn shlo_l_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.wrapping_shl(b as u32))
    }

    /// Logical shift right (64-bit)
    ///
    /// Opcode: 208
    pub fn shlo_r_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.wrapping_shr(b as u32))
    }

    /// Arithmetic shift right (64-bit)
    ///
    /// Opcode: 209
    pub fn shar_r_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, (a as i64).wrapping_shr(b as u32) as RegValue)
    }

    /// Bitwise AND
    ///
    /// Opcode: 210
    pub fn and(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a & b)
    }

    /// Bitwise XOR
    ///
    /// Opcode: 211
    pub fn xor(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a ^ b)
    }

    /// Bitwise OR
    ///
    /// Opcode: 212
    pub fn or(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a | b)
    }

    /// Upper 64 bits of the signed by signed product
    ///
    /// Opcode: 213
    pub fn mul_upper_s_s(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_d,
            ((a as i64 as i128 * b as i64 as i128) >> 64) as RegValue
        )
    }

    /// Upper 64 bits of the unsigned by unsigned product
    ///
    /// Opcode: 214
    pub fn mul_upper_u_u(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, ((a as u128 * b as u128) >> 64) as RegValue)
    }

    /// Upper 64 bits of the signed by unsigned product
    ///
    /// Opcode: 215
    pub fn mul_upper_s_u(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, ((a as i64 as i128 * b as i128) >> 64) as RegValue)
    }

    /// Set if less than (unsigned)
    ///
    /// Opcode: 216
    pub fn set_lt_u(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, (a < b) as RegValue)
    }

    /// Set if less than (signed)
    ///
    /// Opcode: 217
    pub fn set_lt_s(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_d,
            (VMUtils::u64_to_i64(a) < VMUtils::u64_to_i64(b)) as RegValue
        )
    }

    /// Conditional move if zero
    ///
    /// Opcode: 218
    pub fn cmov_iz(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        conditional_reg_write!(b == 0, args.r_d, a)
    }

    /// Conditional move if not zero
    ///
    /// Opcode: 219
    pub fn cmov_nz(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        conditional_reg_write!(b != 0, args.r_d, a)
    }

    /// Rotate left (64-bit)
    ///
    /// Opcode: 220
    pub fn rot_l_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.rotate_left((b % 64) as u32))
    }

    /// Rotate left (32-bit)
    ///
    /// Opcode: 221
    pub fn rot_l_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_d,
            VMUtils::sext_32((a as u32).rotate_left((b % 32) as u32) as u64)
        )
    }

    /// Rotate right (64-bit)
    ///
    /// Opcode: 222
    pub fn rot_r_64(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.rotate_right((b % 64) as u32))
    }

    /// Rotate right (32-bit)
    ///
    /// Opcode: 223
    pub fn rot_r_32(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_d,
            VMUtils::sext_32((a as u32).rotate_right((b % 32) as u32) as u64)
        )
    }

    /// Bitwise AND with inverted second operand
    ///
    /// Opcode: 224
    pub fn and_inv(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a & !b)
    }

    /// Bitwise OR with inverted second operand
    ///
    /// Opcode: 225
    pub fn or_inv(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a | !b)
    }

    /// Bitwise XNOR
    ///
    /// Opcode: 226
    pub fn xnor(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, !(a ^ b))
    }

    /// Maximum (signed)
    ///
    /// Opcode: 227
    pub fn max(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_d,
            VMUtils::u64_to_i64(a).max(VMUtils::u64_to_i64(b)) as RegValue
        )
    }

    /// Maximum (unsigned)
    ///
    /// Opcode: 228
    pub fn max_u(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.max(b))
    }

    /// Minimum (signed)
    ///
    /// Opcode: 229
    pub fn min(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(
            args.r_d,
            VMUtils::u64_to_i64(a).min(VMUtils::u64_to_i64(b)) as RegValue
        )
    }

    /// Minimum (unsigned)
    ///
    /// Opcode: 230
    pub fn min_u(
        vm_state: &VMState,
        _program_state: &ProgramState,
        args: &ThreeRegArgs,
    ) -> Evaluation {
        let a = vm_state.read_reg(args.r_a);
        let b = vm_state.read_reg(args.r_b);
        continue_with_reg_write!(args.r_d, a.min(b))
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{memory::AccessType, state_change::MemWrite, vm_state::RegIndex};
    use std::error::Error;

    fn program_state() -> Result<ProgramState, Box<dyn Error>> {
        // trap; fallthrough; trap
        Ok(ProgramState::from_blob(&[1, 1, 3, 2, 0, 1, 0, 0b111])?)
    }

    fn with_regs(values: &[(RegIndex, RegValue)]) -> VMState {
        let mut vm_state = VMState::default();
        for &(index, value) in values {
            vm_state.regs[index] = value;
        }
        vm_state
    }

    fn three_reg(
        f: fn(&VMState, &ProgramState, &ThreeRegArgs) -> Evaluation,
        a: RegValue,
        b: RegValue,
    ) -> Result<Evaluation, Box<dyn Error>> {
        let vm_state = with_regs(&[(0, a), (1, b)]);
        let args = ThreeRegArgs {
            r_a: 0,
            r_b: 1,
            r_d: 2,
        };
        Ok(f(&vm_state, &program_state()?, &args))
    }

    fn reg_write(value: RegValue) -> Evaluation {
        Ok(vec![Modification::Register(2, value)])
    }

    #[test]
    fn test_division_by_zero() -> Result<(), Box<dyn Error>> {
        assert_eq!(three_reg(InstructionSet::div_u_64, 7, 0)?, reg_write(u64::MAX));
        assert_eq!(three_reg(InstructionSet::div_s_64, 7, 0)?, reg_write(u64::MAX));
        assert_eq!(three_reg(InstructionSet::div_u_32, 7, 0)?, reg_write(u64::MAX));
        assert_eq!(three_reg(InstructionSet::div_s_32, 7, 0)?, reg_write(u64::MAX));
        assert_eq!(three_reg(InstructionSet::rem_u_64, 7, 0)?, reg_write(7));
        assert_eq!(three_reg(InstructionSet::rem_s_64, 7, 0)?, reg_write(7));
        assert_eq!(
            three_reg(InstructionSet::rem_u_32, 0xffff_ffff, 0)?,
            reg_write(u64::MAX)
        );
        assert_eq!(three_reg(InstructionSet::rem_s_32, -7i64 as u64, 0)?, reg_write(-7i64 as u64));
        Ok(())
    }

    #[test]
    fn test_signed_division_overflow() -> Result<(), Box<dyn Error>> {
        let min = i64::MIN as u64;
        let minus_one = -1i64 as u64;
        assert_eq!(three_reg(InstructionSet::div_s_64, min, minus_one)?, reg_write(min));
        assert_eq!(three_reg(InstructionSet::rem_s_64, min, minus_one)?, reg_write(0));
        let min_32 = i32::MIN as i64 as u64;
        assert_eq!(three_reg(InstructionSet::div_s_32, min_32, minus_one)?, reg_write(min_32));
        assert_eq!(three_reg(InstructionSet::rem_s_32, min_32, minus_one)?, reg_write(0));
        assert_eq!(
            three_reg(InstructionSet::div_s_64, -7i64 as u64, 2)?,
            reg_write(-3i64 as u64)
        );
        assert_eq!(
            three_reg(InstructionSet::rem_s_64, -7i64 as u64, 2)?,
            reg_write(-1i64 as u64)
        );
        Ok(())
    }

    #[test]
    fn test_32_bit_results_are_sign_extended() -> Result<(), Box<dyn Error>> {
        assert_eq!(
            three_reg(InstructionSet::add_32, 0x7fff_ffff, 1)?,
            reg_write(0xffff_ffff_8000_0000)
        );
        assert_eq!(three_reg(InstructionSet::sub_32, 0, 1)?, reg_write(u64::MAX));
        assert_eq!(
            three_reg(InstructionSet::shlo_l_32, 1, 31)?,
            reg_write(0xffff_ffff_8000_0000)
        );
        assert_eq!(
            three_reg(InstructionSet::shar_r_32, 0x8000_0000, 4)?,
            reg_write(0xffff_ffff_f800_0000)
        );
        assert_eq!(three_reg(InstructionSet::shlo_r_32, 0x8000_0000, 36)?, reg_write(0x0800_0000));
        Ok(())
    }

    #[test]
    fn test_upper_multiplication() -> Result<(), Box<dyn Error>> {
        let minus_one = -1i64 as u64;
        assert_eq!(three_reg(InstructionSet::mul_upper_u_u, u64::MAX, 2)?, reg_write(1));
        assert_eq!(three_reg(InstructionSet::mul_upper_s_s, minus_one, 2)?, reg_write(u64::MAX));
        assert_eq!(three_reg(InstructionSet::mul_upper_s_u, minus_one, 2)?, reg_write(u64::MAX));
        assert_eq!(three_reg(InstructionSet::mul_upper_s_u, 2, minus_one)?, reg_write(1));
        Ok(())
    }

    #[test]
    fn test_bitwise_and_comparisons() -> Result<(), Box<dyn Error>> {
        assert_eq!(three_reg(InstructionSet::and_inv, 0b1100, 0b1010)?, reg_write(0b0100));
        assert_eq!(three_reg(InstructionSet::xnor, 0, 0)?, reg_write(u64::MAX));
        assert_eq!(three_reg(InstructionSet::set_lt_s, -1i64 as u64, 0)?, reg_write(1));
        assert_eq!(three_reg(InstructionSet::set_lt_u, -1i64 as u64, 0)?, reg_write(0));
        assert_eq!(three_reg(InstructionSet::max, -1i64 as u64, 1)?, reg_write(1));
        assert_eq!(three_reg(InstructionSet::min_u, -1i64 as u64, 1)?, reg_write(1));
        assert_eq!(
            three_reg(InstructionSet::rot_r_32, 1, 1)?,
            reg_write(0xffff_ffff_8000_0000)
        );
        assert_eq!(three_reg(InstructionSet::rot_l_64, 1 << 63, 1)?, reg_write(1));
        Ok(())
    }

    #[test]
    fn test_conditional_moves() -> Result<(), Box<dyn Error>> {
        assert_eq!(three_reg(InstructionSet::cmov_iz, 5, 0)?, reg_write(5));
        assert_eq!(three_reg(InstructionSet::cmov_iz, 5, 1)?, Ok(vec![]));
        assert_eq!(three_reg(InstructionSet::cmov_nz, 5, 1)?, reg_write(5));
        Ok(())
    }

    #[test]
    fn test_two_reg_bit_operations() -> Result<(), Box<dyn Error>> {
        let ps = program_state()?;
        let vm_state = with_regs(&[(1, 0x0000_0000_0000_80f0)]);
        let args = TwoRegArgs { r_d: 0, r_a: 1 };
        let write = |v| Ok(vec![Modification::Register(0, v)]);
        assert_eq!(InstructionSet::count_set_bits_64(&vm_state, &ps, &args), write(5));
        assert_eq!(InstructionSet::leading_zero_bits_32(&vm_state, &ps, &args), write(16));
        assert_eq!(InstructionSet::trailing_zero_bits_64(&vm_state, &ps, &args), write(4));
        assert_eq!(
            InstructionSet::sign_extend_8(&vm_state, &ps, &args),
            write(0xffff_ffff_ffff_fff0)
        );
        assert_eq!(
            InstructionSet::sign_extend_16(&vm_state, &ps, &args),
            write(0xffff_ffff_ffff_80f0)
        );
        assert_eq!(InstructionSet::zero_extend_16(&vm_state, &ps, &args), write(0x80f0));
        assert_eq!(
            InstructionSet::reverse_bytes(&vm_state, &ps, &args),
            write(0xf080_0000_0000_0000)
        );
        Ok(())
    }

    #[test]
    fn test_immediate_alt_forms() -> Result<(), Box<dyn Error>> {
        let ps = program_state()?;
        let vm_state = with_regs(&[(1, 4)]);
        let args = TwoRegOneImmArgs {
            r_a: 0,
            r_b: 1,
            imm_x: 1,
        };
        let write = |v| Ok(vec![Modification::Register(0, v)]);
        assert_eq!(InstructionSet::shlo_l_imm_alt_64(&vm_state, &ps, &args), write(16));
        assert_eq!(InstructionSet::shlo_l_imm_64(&vm_state, &ps, &args), write(8));
        assert_eq!(InstructionSet::neg_add_imm_64(&vm_state, &ps, &args), write(-3i64 as u64));
        assert_eq!(InstructionSet::set_gt_u_imm(&vm_state, &ps, &args), write(1));
        assert_eq!(InstructionSet::cmov_nz_imm(&vm_state, &ps, &args), write(1));
        assert_eq!(InstructionSet::cmov_iz_imm(&vm_state, &ps, &args), Ok(vec![]));
        assert_eq!(
            InstructionSet::rot_r_64_imm_alt(&vm_state, &ps, &args),
            write(1 << 60)
        );
        Ok(())
    }

    #[test]
    fn test_store_immediate() -> Result<(), Box<dyn Error>> {
        let ps = program_state()?;
        let args = TwoImmArgs {
            imm_x: 0x2_0000,
            imm_y: 0x1122_3344,
        };
        assert_eq!(
            InstructionSet::store_imm_u16(&VMState::default(), &ps, &args),
            Ok(vec![Modification::Memory(MemWrite::new(0x2_0000, vec![0x44, 0x33]))])
        );
        Ok(())
    }

    #[test]
    fn test_load_sign_extension() -> Result<(), Box<dyn Error>> {
        let ps = program_state()?;
        let mut vm_state = VMState::default();
        vm_state
            .memory
            .set_address_range_access(0x2_0000..0x2_0004, AccessType::ReadWrite)?;
        vm_state.memory.write_bytes(0x2_0000, &[0xfe, 0xff, 0xff, 0xff])?;
        let args = OneRegOneImmArgs {
            r_a: 3,
            imm_x: 0x2_0000,
        };
        assert_eq!(
            InstructionSet::load_i32(&vm_state, &ps, &args),
            Ok(vec![Modification::Register(3, -2i64 as u64)])
        );
        assert_eq!(
            InstructionSet::load_u32(&vm_state, &ps, &args),
            Ok(vec![Modification::Register(3, 0xffff_fffe)])
        );
        let crossing = OneRegOneImmArgs {
            r_a: 3,
            imm_x: 0x2_0ffc,
        };
        assert_eq!(
            InstructionSet::load_u64(&vm_state, &ps, &crossing),
            Err(ExitReason::PageFault(0x2_1000))
        );
        Ok(())
    }

    #[test]
    fn test_branch_requires_block_beginning() -> Result<(), Box<dyn Error>> {
        let ps = program_state()?;
        assert_eq!(InstructionSet::branch(&ps, 1, true), Ok(vec![Modification::Jump(1)]));
        assert_eq!(InstructionSet::branch(&ps, 2, true), Ok(vec![Modification::Jump(2)]));
        assert_eq!(InstructionSet::branch(&ps, 5, true), Err(ExitReason::Panic));
        assert_eq!(InstructionSet::branch(&ps, 5, false), Ok(vec![]));
        Ok(())
    }

    #[test]
    fn test_djump_address_is_taken_modulo_2_32() -> Result<(), Box<dyn Error>> {
        let ps = program_state()?;
        assert_eq!(
            InstructionSet::djump(&ps, (1 << 32) | 2),
            Ok(vec![Modification::Jump(2)])
        );
        assert_eq!(
            InstructionSet::djump(&ps, u64::MAX << 32 | SPECIAL_HALT_ADDRESS),
            Err(ExitReason::RegularHalt)
        );
        Ok(())
    }

    #[test]
    fn test_ecalli_exits_with_host_call() -> Result<(), Box<dyn Error>> {
        let ps = program_state()?;
        let args = OneImmArgs { imm_x: 255 };
        assert_eq!(
            InstructionSet::ecalli(&VMState::default(), &ps, &args),
            Err(ExitReason::HostCall(255))
        );
        Ok(())
    }
}
