use num_enum::TryFromPrimitive;
use std::fmt::{Display, Formatter};

/// PVM Opcodes
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive)]
#[allow(non_camel_case_types)]
pub enum Opcode {
    // Instructions without Arguments
    TRAP = 0,
    FALLTHROUGH = 1,

    // One Immediate
    ECALLI = 10,

    // One Register and One Extended Width Immediate
    LOAD_IMM_64 = 20,

    // Two Immediates
    STORE_IMM_U8 = 30,
    STORE_IMM_U16 = 31,
    STORE_IMM_U32 = 32,
    STORE_IMM_U64 = 33,

    // One Offset
    JUMP = 40,

    // One Register & One Immediate
    JUMP_IND = 50,
    LOAD_IMM = 51,
    LOAD_U8 = 52,
    LOAD_I8 = 53,
    LOAD_U16 = 54,
    LOAD_I16 = 55,
    LOAD_U32 = 56,
    LOAD_I32 = 57,
    LOAD_U64 = 58,
    STORE_U8 = 59,
    STORE_U16 = 60,
    STORE_U32 = 61,
    STORE_U64 = 62,

    // One Register & Two Immediates
    STORE_IMM_IND_U8 = 70,
    STORE_IMM_IND_U16 = 71,
    STORE_IMM_IND_U32 = 72,
    STORE_IMM_IND_U64 = 73,

    // One Register, One Immediate and One Offset
    LOAD_IMM_JUMP = 80,
    BRANCH_EQ_IMM = 81,
    BRANCH_NE_IMM = 82,
    BRANCH_LT_U_IMM = 83,
    BRANCH_LE_U_IMM = 84,
    BRANCH_GE_U_IMM = 85,
    BRANCH_GT_U_IMM = 86,
    BRANCH_LT_S_IMM = 87,
    BRANCH_LE_S_IMM = 88,
    BRANCH_GE_S_IMM = 89,
    BRANCH_GT_S_IMM = 90,

    // Two Registers
    MOVE_REG = 100,
    SBRK = 101,
    COUNT_SET_BITS_64 = 102,
    COUNT_SET_BITS_32 = 103,
    LEADING_ZERO_BITS_64 = 104,
    LEADING_ZERO_BITS_32 = 105,
    TRAILING_ZERO_BITS_64 = 106,
    TRAILING_ZERO_BITS_32 = 107,
    SIGN_EXTEND_8 = 108,
    SIGN_EXTEND_16 = 109,
    ZERO_EXTEND_16 = 110,
    REVERSE_BYTES = 111,

    // Two Registers & One Immediate
    STORE_IND_U8 = 120,
    STORE_IND_U16 = 121,
    STORE_IND_U32 = 122,
    STORE_IND_U64 = 123,
    LOAD_IND_U8 = 124,
    LOAD_IND_I8 = 125,
    LOAD_IND_U16 = 126,
    LOAD_IND_I16 = 127,
    LOAD_IND_U32 = 128,
    LOAD_IND_I32 = 129,
    LOAD_IND_U64 = 130,
    ADD_IMM_32 = 131,
    AND_IMM = 132,
    XOR_IMM = 133,
    OR_IMM = 134,
    MUL_IMM_32 = 135,
    SET_LT_U_IMM = 136,
    SET_LT_S_IMM = 137,
    SHLO_L_IMM_32 = 138,
    SHLO_R_IMM_32 = 139,
    SHAR_R_IMM_32 = 140,
    NEG_ADD_IMM_32 = 141,
    SET_GT_U_IMM = 142,
    SET_GT_S_IMM = 143,
    SHLO_L_IMM_ALT_32 = 144,
    SHLO_R_IMM_ALT_32 = 145,
    SHAR_R_IMM_ALT_32 = 146,
    CMOV_IZ_IMM = 147,
    CMOV_NZ_IMM = 148,
    ADD_IMM_64 = 149,
    MUL_IMM_64 = 150,
    SHLO_L_IMM_64 = 151,
    SHLO_R_IMM_64 = 152,
    SHAR_R_IMM_64 = 153,
    NEG_ADD_IMM_64 = 154,
    SHLO_L_IMM_ALT_64 = 155,
    SHLO_R_IMM_ALT_64 = 156,
    SHAR_R_IMM_ALT_64 = 157,
    ROT_R_64_IMM = 158,
    ROT_R_64_IMM_ALT = 159,
    ROT_R_32_IMM = 160,
    ROT_R_32_IMM_ALT = 161,

    // Two Registers & One Offset
    BRANCH_EQ = 170,
    BRANCH_NE = 171,
    BRANCH_LT_U = 172,
    BRANCH_LT_S = 173,
    BRANCH_GE_U = 174,
    BRANCH_GE_S = 175,

    // Two Registers & Two Immediates
    LOAD_IMM_JUMP_IND = 180,

    // Three Registers
    ADD_32 = 190,
    SUB_32 = 191,
    MUL_32 = 192,
    DIV_U_32 = 193,
    DIV_S_32 = 194,
    REM_U_32 = 195,
    REM_S_32 = 196,
    SHLO_L_32 = 197,
    SHLO_R_32 = 198,
    SHAR_R_32 = 199,
    ADD_64 = 200,
    SUB_64 = 201,
    MUL_64 = 202,
    DIV_U_64 = 203,
    DIV_S_64 = 204,
    REM_U_64 = 205,
    REM_S_64 = 206,
    SHLO_L_64 = 207,
    SHLO_R_64 = 208,
    SHAR_R_64 = 209,
    AND = 210,
    XOR = 211,
    OR = 212,
    MUL_UPPER_S_S = 213,
    MUL_UPPER_U_U = 214,
    MUL_UPPER_S_U = 215,
    SET_LT_U = 216,
    SET_LT_S = 217,
    CMOV_IZ = 218,
    CMOV_NZ = 219,
    ROT_L_64 = 220,
    ROT_L_32 = 221,
    ROT_R_64 = 222,
    ROT_R_32 = 223,
    AND_INV = 224,
    OR_INV = 225,
    XNOR = 226,
    MAX = 227,
    MAX_U = 228,
    MIN = 229,
    MIN_U = 230,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}({})", *self as u8)
    }
}
