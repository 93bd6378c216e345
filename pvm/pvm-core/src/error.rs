use crate::state::{memory::MemoryError, vm_state::RegIndex};
use jam_pvm_codec::JamCodecError;
use jam_pvm_types::common::{RegValue, UnsignedGas};
use thiserror::Error;

/// Failures while turning bytes into a program or an instruction.
///
/// These signal a malformed blob or a registry misuse, never an execution outcome.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("JamCodecError: {0}")]
    JamCodecError(#[from] JamCodecError),
    #[error("Invalid instruction mask: {0}")]
    InvalidMask(&'static str),
    #[error("Instruction mask padding bits must be zero")]
    InvalidMaskPadding,
    #[error("Invalid jump table entry width: {0}")]
    InvalidJumpEntryWidth(u8),
    #[error("Jump table entry {0} does not fit the entry width")]
    JumpEntryTooLarge(u32),
    #[error("Trailing bytes after the program blob: {0}")]
    TrailingBytes(usize),
    #[error("Unknown opcode: {0}")]
    UnknownOpcode(u8),
    #[error("Not an instruction start: {0}")]
    NotInstructionStart(RegValue),
    #[error("Program does not start with a registered instruction (opcode={0})")]
    InvalidEntryInstruction(u8),
    #[error("Insufficient operand bytes for {name}: needed {needed}, available {available}")]
    InsufficientOperandBytes {
        name: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("Operands do not match the operand shape of {0}")]
    OperandShapeMismatch(&'static str),
}

/// PVM Core Error Codes
#[derive(Debug, Error)]
pub enum VMCoreError {
    #[error("Too large gas charge value: {0}")]
    TooLargeGasCharge(UnsignedGas),
    #[error("Gas counter value overflowed")]
    GasCounterOverflow,
    #[error("Invalid program")]
    InvalidProgram,
    #[error("Program arguments size limit exceeded")]
    ProgramArgsSizeLimitExceeded,
    #[error("Invalid register value (index={0}, val={1})")]
    InvalidRegVal(RegIndex, RegValue),
    #[error("Invalid register index: {0}")]
    InvalidRegIndex(RegIndex),
    #[error("DecodeError: {0}")]
    DecodeError(#[from] DecodeError),
    #[error("JamCodecError: {0}")]
    JamCodecError(#[from] JamCodecError),
    #[error("MemoryError: {0}")]
    MemoryError(#[from] MemoryError),
}
