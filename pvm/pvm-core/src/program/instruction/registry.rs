//! Static opcode table binding every opcode to its operand shape, evaluator, gas cost and
//! block-termination flag.

use crate::{
    error::DecodeError,
    program::{
        instruction::{opcode::Opcode, operands::*, set::InstructionSet, Evaluation},
        types::program_state::ProgramState,
    },
    state::vm_state::VMState,
};
use jam_pvm_types::{
    common::{RegValue, UnsignedGas},
    constants::INST_BASE_GAS_CHARGE,
};

/// Evaluator function pointer, typed by the operand shape it consumes.
#[derive(Clone, Copy)]
pub enum Handler {
    NoArgs(fn(&VMState, &ProgramState) -> Evaluation),
    OneImm(fn(&VMState, &ProgramState, &OneImmArgs) -> Evaluation),
    OneRegExtImm(fn(&VMState, &ProgramState, &OneRegExtImmArgs) -> Evaluation),
    TwoImm(fn(&VMState, &ProgramState, &TwoImmArgs) -> Evaluation),
    OneOffset(fn(&VMState, &ProgramState, &OneOffsetArgs) -> Evaluation),
    OneRegOneImm(fn(&VMState, &ProgramState, &OneRegOneImmArgs) -> Evaluation),
    OneRegTwoImm(fn(&VMState, &ProgramState, &OneRegTwoImmArgs) -> Evaluation),
    OneRegImmOffset(fn(&VMState, &ProgramState, &OneRegImmOffsetArgs) -> Evaluation),
    TwoReg(fn(&VMState, &ProgramState, &TwoRegArgs) -> Evaluation),
    TwoRegOneImm(fn(&VMState, &ProgramState, &TwoRegOneImmArgs) -> Evaluation),
    TwoRegOneOffset(fn(&VMState, &ProgramState, &TwoRegOneOffsetArgs) -> Evaluation),
    TwoRegTwoImm(fn(&VMState, &ProgramState, &TwoRegTwoImmArgs) -> Evaluation),
    ThreeReg(fn(&VMState, &ProgramState, &ThreeRegArgs) -> Evaluation),
}

impl Handler {
    pub fn shape(&self) -> OperandShape {
        match self {
            Self::NoArgs(_) => OperandShape::NoArgs,
            Self::OneImm(_) => OperandShape::OneImm,
            Self::OneRegExtImm(_) => OperandShape::OneRegExtImm,
            Self::TwoImm(_) => OperandShape::TwoImm,
            Self::OneOffset(_) => OperandShape::OneOffset,
            Self::OneRegOneImm(_) => OperandShape::OneRegOneImm,
            Self::OneRegTwoImm(_) => OperandShape::OneRegTwoImm,
            Self::OneRegImmOffset(_) => OperandShape::OneRegImmOffset,
            Self::TwoReg(_) => OperandShape::TwoReg,
            Self::TwoRegOneImm(_) => OperandShape::TwoRegOneImm,
            Self::TwoRegOneOffset(_) => OperandShape::TwoRegOneOffset,
            Self::TwoRegTwoImm(_) => OperandShape::TwoRegTwoImm,
            Self::ThreeReg(_) => OperandShape::ThreeReg,
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler::{:?}", self.shape())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct InstructionEntry {
    pub opcode: Opcode,
    pub name: &'static str,
    pub handler: Handler,
    pub gas_cost: UnsignedGas,
    pub is_block_terminator: bool,
}

impl InstructionEntry {
    /// Decodes the operand span following this instruction's opcode at `pc`.
    pub fn decode(&self, span: &[u8], pc: RegValue) -> Result<Operands, DecodeError> {
        self.handler.shape().decode(self.name, span, pc)
    }

    /// Runs the evaluator on decoded operands.
    ///
    /// Fails only if `operands` were decoded for a different shape.
    pub fn evaluate(
        &self,
        vm_state: &VMState,
        program_state: &ProgramState,
        operands: &Operands,
    ) -> Result<Evaluation, DecodeError> {
        let (vm, ps) = (vm_state, program_state);
        let evaluation = match (self.handler, operands) {
            (Handler::NoArgs(f), Operands::NoArgs) => f(vm, ps),
            (Handler::OneImm(f), Operands::OneImm(args)) => f(vm, ps, args),
            (Handler::OneRegExtImm(f), Operands::OneRegExtImm(args)) => f(vm, ps, args),
            (Handler::TwoImm(f), Operands::TwoImm(args)) => f(vm, ps, args),
            (Handler::OneOffset(f), Operands::OneOffset(args)) => f(vm, ps, args),
            (Handler::OneRegOneImm(f), Operands::OneRegOneImm(args)) => f(vm, ps, args),
            (Handler::OneRegTwoImm(f), Operands::OneRegTwoImm(args)) => f(vm, ps, args),
            (Handler::OneRegImmOffset(f), Operands::OneRegImmOffset(args)) => f(vm, ps, args),
            (Handler::TwoReg(f), Operands::TwoReg(args)) => f(vm, ps, args),
            (Handler::TwoRegOneImm(f), Operands::TwoRegOneImm(args)) => f(vm, ps, args),
            (Handler::TwoRegOneOffset(f), Operands::TwoRegOneOffset(args)) => f(vm, ps, args),
            (Handler::TwoRegTwoImm(f), Operands::TwoRegTwoImm(args)) => f(vm, ps, args),
            (Handler::ThreeReg(f), Operands::ThreeReg(args)) => f(vm, ps, args),
            _ => return Err(DecodeError::OperandShapeMismatch(self.name)),
        };
        Ok(evaluation)
    }
}

macro_rules! inst {
    ($opcode:ident, $shape:ident, $func:ident) => {
        inst!(@entry $opcode, $shape, $func, false)
    };
    ($opcode:ident, $shape:ident, $func:ident, terminator) => {
        inst!(@entry $opcode, $shape, $func, true)
    };
    (@entry $opcode:ident, $shape:ident, $func:ident, $terminator:expr) => {
        InstructionEntry {
            opcode: Opcode::$opcode,
            name: stringify!($func),
            handler: Handler::$shape(InstructionSet::$func),
            gas_cost: INST_BASE_GAS_CHARGE,
            is_block_terminator: $terminator,
        }
    };
}

#[rustfmt::skip]
const INSTRUCTION_TABLE: &[InstructionEntry] = &[
    inst!(TRAP, NoArgs, trap, terminator),
    inst!(FALLTHROUGH, NoArgs, fallthrough, terminator),
    inst!(ECALLI, OneImm, ecalli),
    inst!(LOAD_IMM_64, OneRegExtImm, load_imm_64),
    inst!(STORE_IMM_U8, TwoImm, store_imm_u8),
    inst!(STORE_IMM_U16, TwoImm, store_imm_u16),
    inst!(STORE_IMM_U32, TwoImm, store_imm_u32),
    inst!(STORE_IMM_U64, TwoImm, store_imm_u64),
    inst!(JUMP, OneOffset, jump, terminator),
    inst!(JUMP_IND, OneRegOneImm, jump_ind, terminator),
    inst!(LOAD_IMM, OneRegOneImm, load_imm),
    inst!(LOAD_U8, OneRegOneImm, load_u8),
    inst!(LOAD_I8, OneRegOneImm, load_i8),
    inst!(LOAD_U16, OneRegOneImm, load_u16),
    inst!(LOAD_I16, OneRegOneImm, load_i16),
    inst!(LOAD_U32, OneRegOneImm, load_u32),
    inst!(LOAD_I32, OneRegOneImm, load_i32),
    inst!(LOAD_U64, OneRegOneImm, load_u64),
    inst!(STORE_U8, OneRegOneImm, store_u8),
    inst!(STORE_U16, OneRegOneImm, store_u16),
    inst!(STORE_U32, OneRegOneImm, store_u32),
    inst!(STORE_U64, OneRegOneImm, store_u64),
    inst!(STORE_IMM_IND_U8, OneRegTwoImm, store_imm_ind_u8),
    inst!(STORE_IMM_IND_U16, OneRegTwoImm, store_imm_ind_u16),
    inst!(STORE_IMM_IND_U32, OneRegTwoImm, store_imm_ind_u32),
    inst!(STORE_IMM_IND_U64, OneRegTwoImm, store_imm_ind_u64),
    inst!(LOAD_IMM_JUMP, OneRegImmOffset, load_imm_jump, terminator),
    inst!(BRANCH_EQ_IMM, OneRegImmOffset, branch_eq_imm, terminator),
    inst!(BRANCH_NE_IMM, OneRegImmOffset, branch_ne_imm, terminator),
    inst!(BRANCH_LT_U_IMM, OneRegImmOffset, branch_lt_u_imm, terminator),
    inst!(BRANCH_LE_U_IMM, OneRegImmOffset, branch_le_u_imm, terminator),
    inst!(BRANCH_GE_U_IMM, OneRegImmOffset, branch_ge_u_imm, terminator),
    inst!(BRANCH_GT_U_IMM, OneRegImmOffset, branch_gt_u_imm, terminator),
    inst!(BRANCH_LT_S_IMM, OneRegImmOffset, branch_lt_s_imm, terminator),
    inst!(BRANCH_LE_S_IMM, OneRegImmOffset, branch_le_s_imm, terminator),
    inst!(BRANCH_GE_S_IMM, OneRegImmOffset, branch_ge_s_imm, terminator),
    inst!(BRANCH_GT_S_IMM, OneRegImmOffset, branch_gt_s_imm, terminator),
    inst!(MOVE_REG, TwoReg, move_reg),
    inst!(SBRK, TwoReg, sbrk),
    inst!(COUNT_SET_BITS_64, TwoReg, count_set_bits_64),
    inst!(COUNT_SET_BITS_32, TwoReg, count_set_bits_32),
    inst!(LEADING_ZERO_BITS_64, TwoReg, leading_zero_bits_64),
    inst!(LEADING_ZERO_BITS_32, TwoReg, leading_zero_bits_32),
    inst!(TRAILING_ZERO_BITS_64, TwoReg, trailing_zero_bits_64),
    inst!(TRAILING_ZERO_BITS_32, TwoReg, trailing_zero_bits_32),
    inst!(SIGN_EXTEND_8, TwoReg, sign_extend_8),
    inst!(SIGN_EXTEND_16, TwoReg, sign_extend_16),
    inst!(ZERO_EXTEND_16, TwoReg, zero_extend_16),
    inst!(REVERSE_BYTES, TwoReg, reverse_bytes),
    inst!(STORE_IND_U8, TwoRegOneImm, store_ind_u8),
    inst!(STORE_IND_U16, TwoRegOneImm, store_ind_u16),
    inst!(STORE_IND_U32, TwoRegOneImm, store_ind_u32),
    inst!(STORE_IND_U64, TwoRegOneImm, store_ind_u64),
    inst!(LOAD_IND_U8, TwoRegOneImm, load_ind_u8),
    inst!(LOAD_IND_I8, TwoRegOneImm, load_ind_i8),
    inst!(LOAD_IND_U16, TwoRegOneImm, load_ind_u16),
    inst!(LOAD_IND_I16, TwoRegOneImm, load_ind_i16),
    inst!(LOAD_IND_U32, TwoRegOneImm, load_ind_u32),
    inst!(LOAD_IND_I32, TwoRegOneImm, load_ind_i32),
    inst!(LOAD_IND_U64, TwoRegOneImm, load_ind_u64),
    inst!(ADD_IMM_32, TwoRegOneImm, add_imm_32),
    inst!(AND_IMM, TwoRegOneImm, and_imm),
    inst!(XOR_IMM, TwoRegOneImm, xor_imm),
    inst!(OR_IMM, TwoRegOneImm, or_imm),
    inst!(MUL_IMM_32, TwoRegOneImm, mul_imm_32),
    inst!(SET_LT_U_IMM, TwoRegOneImm, set_lt_u_imm),
    inst!(SET_LT_S_IMM, TwoRegOneImm, set_lt_s_imm),
    inst!(SHLO_L_IMM_32, TwoRegOneImm, shlo_l_imm_32),
    inst!(SHLO_R_IMM_32, TwoRegOneImm, shlo_r_imm_32),
    inst!(SHAR_R_IMM_32, TwoRegOneImm, shar_r_imm_32),
    inst!(NEG_ADD_IMM_32, TwoRegOneImm, neg_add_imm_32),
    inst!(SET_GT_U_IMM, TwoRegOneImm, set_gt_u_imm),
    inst!(SET_GT_S_IMM, TwoRegOneImm, set_gt_s_imm),
    inst!(SHLO_L_IMM_ALT_32, TwoRegOneImm, shlo_l_imm_alt_32),
    inst!(SHLO_R_IMM_ALT_32, TwoRegOneImm, shlo_r_imm_alt_32),
    inst!(SHAR_R_IMM_ALT_32, TwoRegOneImm, shar_r_imm_alt_32),
    inst!(CMOV_IZ_IMM, TwoRegOneImm, cmov_iz_imm),
    inst!(CMOV_NZ_IMM, TwoRegOneImm, cmov_nz_imm),
    inst!(ADD_IMM_64, TwoRegOneImm, add_imm_64),
    inst!(MUL_IMM_64, TwoRegOneImm, mul_imm_64),
    inst!(SHLO_L_IMM_64, TwoRegOneImm, shlo_l_imm_64),
    inst!(SHLO_R_IMM_64, TwoRegOneImm, shlo_r_imm_64),
    inst!(SHAR_R_IMM_64, TwoRegOneImm, shar_r_imm_64),
    inst!(NEG_ADD_IMM_64, TwoRegOneImm, neg_add_imm_64),
    inst!(SHLO_L_IMM_ALT_64, TwoRegOneImm, shlo_l_imm_alt_64),
    inst!(SHLO_R_IMM_ALT_64, TwoRegOneImm, shlo_r_imm_alt_64),
    inst!(SHAR_R_IMM_ALT_64, TwoRegOneImm, shar_r_imm_alt_64),
    inst!(ROT_R_64_IMM, TwoRegOneImm, rot_r_64_imm),
    inst!(ROT_R_64_IMM_ALT, TwoRegOneImm, rot_r_64_imm_alt),
    inst!(ROT_R_32_IMM, TwoRegOneImm, rot_r_32_imm),
    inst!(ROT_R_32_IMM_ALT, TwoRegOneImm, rot_r_32_imm_alt),
    inst!(BRANCH_EQ, TwoRegOneOffset, branch_eq, terminator),
    inst!(BRANCH_NE, TwoRegOneOffset, branch_ne, terminator),
    inst!(BRANCH_LT_U, TwoRegOneOffset, branch_lt_u, terminator),
    inst!(BRANCH_LT_S, TwoRegOneOffset, branch_lt_s, terminator),
    inst!(BRANCH_GE_U, TwoRegOneOffset, branch_ge_u, terminator),
    inst!(BRANCH_GE_S, TwoRegOneOffset, branch_ge_s, terminator),
    inst!(LOAD_IMM_JUMP_IND, TwoRegTwoImm, load_imm_jump_ind, terminator),
    inst!(ADD_32, ThreeReg, add_32),
    inst!(SUB_32, ThreeReg, sub_32),
    inst!(MUL_32, ThreeReg, mul_32),
    inst!(DIV_U_32, ThreeReg, div_u_32),
    inst!(DIV_S_32, ThreeReg, div_s_32),
    inst!(REM_U_32, ThreeReg, rem_u_32),
    inst!(REM_S_32, ThreeReg, rem_s_32),
    inst!(SHLO_L_32, ThreeReg, shlo_l_32),
    inst!(SHLO_R_32, ThreeReg, shlo_r_32),
    inst!(SHAR_R_32, ThreeReg, shar_r_32),
    inst!(ADD_64, ThreeReg, add_64),
    inst!(SUB_64, ThreeReg, sub_64),
    inst!(MUL_64, ThreeReg, mul_64),
    inst!(DIV_U_64, ThreeReg, div_u_64),
    inst!(DIV_S_64, ThreeReg, div_s_64),
    inst!(REM_U_64, ThreeReg, rem_u_64),
    inst!(REM_S_64, ThreeReg, rem_s_64),
    inst!(SHLO_L_64, ThreeReg, shlo_l_64),
    inst!(SHLO_R_64, ThreeReg, shlo_r_64),
    inst!(SHAR_R_64, ThreeReg, shar_r_64),
    inst!(AND, ThreeReg, and),
    inst!(XOR, ThreeReg, xor),
    inst!(OR, ThreeReg, or),
    inst!(MUL_UPPER_S_S, ThreeReg, mul_upper_s_s),
    inst!(MUL_UPPER_U_U, ThreeReg, mul_upper_u_u),
    inst!(MUL_UPPER_S_U, ThreeReg, mul_upper_s_u),
    inst!(SET_LT_U, ThreeReg, set_lt_u),
    inst!(SET_LT_S, ThreeReg, set_lt_s),
    inst!(CMOV_IZ, ThreeReg, cmov_iz),
    inst!(CMOV_NZ, ThreeReg, cmov_nz),
    inst!(ROT_L_64, ThreeReg, rot_l_64),
    inst!(ROT_L_32, ThreeReg, rot_l_32),
    inst!(ROT_R_64, ThreeReg, rot_r_64),
    inst!(ROT_R_32, ThreeReg, rot_r_32),
    inst!(AND_INV, ThreeReg, and_inv),
    inst!(OR_INV, ThreeReg, or_inv),
    inst!(XNOR, ThreeReg, xnor),
    inst!(MAX, ThreeReg, max),
    inst!(MAX_U, ThreeReg, max_u),
    inst!(MIN, ThreeReg, min),
    inst!(MIN_U, ThreeReg, min_u),
];

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

const fn has_duplicates(table: &[InstructionEntry]) -> bool {
    let mut i = 0;
    while i < table.len() {
        let mut j = i + 1;
        while j < table.len() {
            if table[i].opcode as u8 == table[j].opcode as u8
                || str_eq(table[i].name, table[j].name)
            {
                return true;
            }
            j += 1;
        }
        i += 1;
    }
    false
}

const _: () = assert!(
    !has_duplicates(INSTRUCTION_TABLE),
    "duplicate opcode or name in the instruction table"
);

const fn build_dispatch(
    table: &'static [InstructionEntry],
) -> [Option<&'static InstructionEntry>; 256] {
    let mut dispatch: [Option<&'static InstructionEntry>; 256] = [None; 256];
    let mut i = 0;
    while i < table.len() {
        dispatch[table[i].opcode as usize] = Some(&table[i]);
        i += 1;
    }
    dispatch
}

static DISPATCH_TABLE: [Option<&'static InstructionEntry>; 256] =
    build_dispatch(INSTRUCTION_TABLE);

/// Opcode lookup over the static instruction table.
pub struct InstructionRegistry;
impl InstructionRegistry {
    #[inline(always)]
    pub fn get(opcode: u8) -> Option<&'static InstructionEntry> {
        DISPATCH_TABLE[opcode as usize]
    }

    pub fn by_name(name: &str) -> Option<&'static InstructionEntry> {
        INSTRUCTION_TABLE.iter().find(|entry| entry.name == name)
    }

    pub fn entries() -> &'static [InstructionEntry] {
        INSTRUCTION_TABLE
    }

    #[inline(always)]
    pub fn is_block_terminator(opcode: u8) -> bool {
        Self::get(opcode).is_some_and(|entry| entry.is_block_terminator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_table_has_no_duplicates() {
        let opcodes: HashSet<u8> = INSTRUCTION_TABLE.iter().map(|e| e.opcode as u8).collect();
        let names: HashSet<&str> = INSTRUCTION_TABLE.iter().map(|e| e.name).collect();
        assert_eq!(opcodes.len(), INSTRUCTION_TABLE.len());
        assert_eq!(names.len(), INSTRUCTION_TABLE.len());
        assert!(!has_duplicates(INSTRUCTION_TABLE));
    }

    #[test]
    fn test_duplicate_detection() {
        let table = [
            inst!(TRAP, NoArgs, trap, terminator),
            inst!(TRAP, NoArgs, fallthrough, terminator),
        ];
        assert!(has_duplicates(&table));
    }

    #[test]
    fn test_every_opcode_is_registered() {
        for opcode in 0..=u8::MAX {
            let registered = InstructionRegistry::get(opcode);
            assert_eq!(registered.is_some(), Opcode::from_u8(opcode).is_some());
            if let Some(entry) = registered {
                assert_eq!(entry.opcode as u8, opcode);
            }
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let entry = InstructionRegistry::by_name("load_imm_64").map(|e| e.opcode);
        assert_eq!(entry, Some(Opcode::LOAD_IMM_64));
        assert!(InstructionRegistry::by_name("nop").is_none());
    }

    #[test]
    fn test_block_terminators() {
        let terminators: Vec<&str> = InstructionRegistry::entries()
            .iter()
            .filter(|e| e.is_block_terminator)
            .map(|e| e.name)
            .collect();
        assert_eq!(terminators.len(), 22);
        assert!(InstructionRegistry::is_block_terminator(Opcode::TRAP as u8));
        assert!(InstructionRegistry::is_block_terminator(Opcode::BRANCH_GE_S as u8));
        assert!(InstructionRegistry::is_block_terminator(Opcode::LOAD_IMM_JUMP_IND as u8));
        assert!(!InstructionRegistry::is_block_terminator(Opcode::ECALLI as u8));
        assert!(!InstructionRegistry::is_block_terminator(Opcode::SBRK as u8));
        assert!(!InstructionRegistry::is_block_terminator(2));
    }

    #[test]
    fn test_shapes_follow_opcode_groups() {
        let entry = |op: Opcode| InstructionRegistry::get(op as u8).map(|e| e.handler.shape());
        assert_eq!(entry(Opcode::ECALLI), Some(OperandShape::OneImm));
        assert_eq!(entry(Opcode::STORE_IMM_U64), Some(OperandShape::TwoImm));
        assert_eq!(entry(Opcode::BRANCH_EQ_IMM), Some(OperandShape::OneRegImmOffset));
        assert_eq!(entry(Opcode::SBRK), Some(OperandShape::TwoReg));
        assert_eq!(entry(Opcode::ROT_R_32_IMM_ALT), Some(OperandShape::TwoRegOneImm));
        assert_eq!(entry(Opcode::MIN_U), Some(OperandShape::ThreeReg));
    }

    #[test]
    fn test_shape_mismatch_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let program_state = ProgramState::from_blob(&[0, 0, 1, 0, 1])?;
        let trap = InstructionRegistry::get(Opcode::TRAP as u8).ok_or("trap not registered")?;
        let operands = Operands::OneImm(OneImmArgs { imm_x: 0 });
        assert_eq!(
            trap.evaluate(&VMState::default(), &program_state, &operands),
            Err(DecodeError::OperandShapeMismatch("trap"))
        );
        Ok(())
    }
}
