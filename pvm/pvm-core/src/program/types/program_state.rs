use crate::{
    error::DecodeError,
    program::{
        instruction::registry::InstructionRegistry,
        types::{parsed_program::ParsedProgram, program::Program},
    },
};
use jam_pvm_types::common::{MemAddress, RegValue};

/// Immutable VM state (program components)
///
/// A decoded `Program` together with its static analysis. Shared read-only by every step of an
/// invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramState {
    program: Program,
    parsed: ParsedProgram,
}

impl ProgramState {
    pub fn new(program: Program) -> Result<Self, DecodeError> {
        let parsed = ParsedProgram::parse(&program)?;
        Ok(Self { program, parsed })
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self, DecodeError> {
        Self::new(Program::from_blob(blob)?)
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn parsed(&self) -> &ParsedProgram {
        &self.parsed
    }

    /// `c`: Serialized instructions blob.
    pub fn code(&self) -> &[u8] {
        &self.program.code
    }

    /// `j`: Dynamic jump table.
    pub fn jump_table(&self) -> &[MemAddress] {
        &self.program.jump_table
    }

    pub fn skip(&self, pc: usize) -> Option<usize> {
        self.parsed.skip(pc)
    }

    /// The offset of the instruction following the one at `pc`.
    pub fn next_pc(&self, pc: RegValue) -> RegValue {
        let skip = usize::try_from(pc)
            .ok()
            .and_then(|pc| self.skip(pc))
            .unwrap_or(0);
        pc.wrapping_add(1 + skip as RegValue)
    }

    pub fn is_block_beginning(&self, target: RegValue) -> bool {
        usize::try_from(target).is_ok_and(|target| self.parsed.is_block_beginning(target))
    }

    /// The operand span `c[pc + 1 ..= pc + skip]`, clipped to the end of the code.
    pub fn operand_span(&self, pc: usize) -> Option<&[u8]> {
        let skip = self.skip(pc)?;
        let code = self.code();
        let start = (pc + 1).min(code.len());
        let end = (pc + 1 + skip).min(code.len());
        Some(&code[start..end])
    }

    pub fn print_all_opcodes(&self) {
        tracing::trace!("All Opcodes");
        self.program.instruction_starts().for_each(|pc| {
            let op = self.program.code[pc];
            match InstructionRegistry::get(op) {
                Some(entry) => tracing::trace!("{pc:>6}: {}", entry.opcode),
                None => tracing::trace!("{pc:>6}: unknown opcode {op}"),
            }
        })
    }
}
