use crate::{
    error::DecodeError,
    program::{instruction::registry::InstructionRegistry, types::program::Program},
};
use jam_pvm_types::constants::MAX_SKIP_DISTANCE;
use std::collections::HashSet;

/// Static analysis of a decoded `Program`, computed once per invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedProgram {
    /// `ϖ`: Offsets that are legal static branch targets.
    pub block_beginnings: HashSet<usize>,
    /// Operand span length per code offset. `None` for offsets that are not instruction starts.
    pub skip_distances: Vec<Option<u8>>,
}

impl ParsedProgram {
    pub fn parse(program: &Program) -> Result<Self, DecodeError> {
        let entry_opcode = program.code[0];
        if InstructionRegistry::get(entry_opcode).is_none() {
            return Err(DecodeError::InvalidEntryInstruction(entry_opcode));
        }

        let skip_distances = Self::compute_skip_distances(program);

        let mut block_beginnings = HashSet::from([0]);
        for (n, skip) in skip_distances.iter().enumerate() {
            let Some(skip) = skip else {
                continue;
            };
            if !InstructionRegistry::is_block_terminator(program.code[n]) {
                continue;
            }
            block_beginnings.insert(n + 1 + *skip as usize);
        }

        Ok(Self {
            block_beginnings,
            skip_distances,
        })
    }

    /// `skip(i)`: distance to the next instruction start, treating offsets past the end of the
    /// code as instruction starts. Capped at `MAX_SKIP_DISTANCE`.
    fn compute_skip_distances(program: &Program) -> Vec<Option<u8>> {
        let code_len = program.code.len();
        let mut skip_distances = vec![None; code_len];
        let mut next_start = code_len;
        for i in (0..code_len).rev() {
            if program.is_instruction_start(i) {
                skip_distances[i] = Some((next_start - i - 1).min(MAX_SKIP_DISTANCE) as u8);
                next_start = i;
            }
        }
        skip_distances
    }

    #[inline(always)]
    pub fn skip(&self, pc: usize) -> Option<usize> {
        self.skip_distances
            .get(pc)
            .copied()
            .flatten()
            .map(|skip| skip as usize)
    }

    #[inline(always)]
    pub fn is_block_beginning(&self, offset: usize) -> bool {
        self.block_beginnings.contains(&offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::prelude::*;
    use std::error::Error;

    fn program(code: Vec<u8>, mask: BitVec<u8, Lsb0>) -> Result<Program, DecodeError> {
        Program::new(vec![], 0, code, mask)
    }

    #[test]
    fn test_skip_distances() -> Result<(), Box<dyn Error>> {
        // load_imm r0, 10; fallthrough; trap
        let parsed = ParsedProgram::parse(&program(
            vec![51, 0, 10, 1, 0],
            bitvec![u8, Lsb0; 1, 0, 0, 1, 1],
        )?)?;
        assert_eq!(parsed.skip_distances, vec![Some(2), None, None, Some(0), Some(0)]);
        assert_eq!(parsed.skip(0), Some(2));
        assert_eq!(parsed.skip(1), None);
        assert_eq!(parsed.skip(5), None);
        Ok(())
    }

    #[test]
    fn test_skip_is_capped() -> Result<(), Box<dyn Error>> {
        let mut code = vec![1];
        code.resize(40, 0);
        let mut mask = bitvec![u8, Lsb0; 0; 40];
        mask.set(0, true);
        let parsed = ParsedProgram::parse(&program(code, mask)?)?;
        assert_eq!(parsed.skip(0), Some(MAX_SKIP_DISTANCE));
        Ok(())
    }

    #[test]
    fn test_block_beginnings_follow_terminators() -> Result<(), Box<dyn Error>> {
        // fallthrough; load_imm r0, 1; trap; add_64 ...
        let parsed = ParsedProgram::parse(&program(
            vec![1, 51, 0, 1, 0, 200, 0, 0],
            bitvec![u8, Lsb0; 1, 1, 0, 0, 1, 1, 0, 0],
        )?)?;
        assert_eq!(parsed.block_beginnings, HashSet::from([0, 1, 5]));
        assert!(!parsed.is_block_beginning(4));
        Ok(())
    }

    #[test]
    fn test_terminator_at_end_marks_code_end() -> Result<(), Box<dyn Error>> {
        let parsed = ParsedProgram::parse(&program(vec![0], bitvec![u8, Lsb0; 1])?)?;
        assert_eq!(parsed.block_beginnings, HashSet::from([0, 1]));
        Ok(())
    }

    #[test]
    fn test_terminator_successor_needs_no_registered_opcode() -> Result<(), Box<dyn Error>> {
        // trap; <unregistered 2>
        let parsed = ParsedProgram::parse(&program(vec![0, 2], bitvec![u8, Lsb0; 1, 1])?)?;
        assert!(parsed.is_block_beginning(1));
        Ok(())
    }

    #[test]
    fn test_unregistered_entry_instruction() -> Result<(), Box<dyn Error>> {
        assert_eq!(
            ParsedProgram::parse(&program(vec![2], bitvec![u8, Lsb0; 1])?),
            Err(DecodeError::InvalidEntryInstruction(2))
        );
        Ok(())
    }
}
