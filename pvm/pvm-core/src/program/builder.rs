//! Program assembly from opcodes and raw operand bytes.

use crate::{
    error::DecodeError,
    program::{
        instruction::opcode::Opcode,
        types::{program::Program, program_state::ProgramState},
    },
};
use jam_pvm_codec::{prelude::*, JamBitVec};
use jam_pvm_types::common::MemAddress;

/// Assembles a `Program` one instruction at a time, keeping the instruction mask in step with
/// the code.
#[derive(Clone, Debug, Default)]
pub struct ProgramBuilder {
    code: Vec<u8>,
    mask: JamBitVec,
    jump_table: Vec<MemAddress>,
    jump_entry_width: u8,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset the next instruction will be placed at.
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    /// Appends an instruction.
    pub fn instruction(self, opcode: Opcode, operands: &[u8]) -> Self {
        self.raw(opcode as u8, operands)
    }

    /// Appends an instruction start holding an arbitrary byte, registered or not.
    pub fn raw(mut self, opcode: u8, operands: &[u8]) -> Self {
        self.code.push(opcode);
        self.mask.push(true);
        for &byte in operands {
            self.code.push(byte);
            self.mask.push(false);
        }
        self
    }

    /// Sets the dynamic jump table and the width of its entries in octets.
    pub fn jump_table(mut self, entries: Vec<MemAddress>, entry_width: u8) -> Self {
        self.jump_table = entries;
        self.jump_entry_width = entry_width;
        self
    }

    pub fn build(self) -> Result<Program, DecodeError> {
        Program::new(self.jump_table, self.jump_entry_width, self.code, self.mask)
    }

    pub fn build_state(self) -> Result<ProgramState, DecodeError> {
        ProgramState::new(self.build()?)
    }

    /// Builds the program and encodes it as a program code blob.
    pub fn build_blob(self) -> Result<Vec<u8>, DecodeError> {
        Ok(self.build()?.encode()?)
    }
}
