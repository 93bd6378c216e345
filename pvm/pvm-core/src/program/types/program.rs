use crate::error::DecodeError;
use jam_pvm_codec::{prelude::*, JamBitVec};
use jam_pvm_types::{common::MemAddress, constants::MAX_JUMP_ENTRY_WIDTH};

/// Program code blob decoded into its components.
///
/// Blob layout: `E(|j|) ++ E_1(z) ++ E(|c|) ++ E_z(j) ++ c ++ E_{|c|}(k)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    /// `j`: Dynamic jump table.
    pub jump_table: Vec<MemAddress>,
    /// `z`: Width of a single jump table entry in octets.
    pub jump_entry_width: u8,
    /// `c`: Serialized instructions blob.
    pub code: Vec<u8>,
    /// `k`: Instruction mask; bit `i` is set when `c[i]` starts an instruction.
    pub instruction_mask: JamBitVec,
}

impl Program {
    pub fn new(
        jump_table: Vec<MemAddress>,
        jump_entry_width: u8,
        code: Vec<u8>,
        instruction_mask: JamBitVec,
    ) -> Result<Self, DecodeError> {
        Self::validate_jump_table(&jump_table, jump_entry_width)?;
        if code.is_empty() {
            return Err(DecodeError::InvalidMask("empty code"));
        }
        if instruction_mask.len() != code.len() {
            return Err(DecodeError::InvalidMask("mask length differs from code length"));
        }
        if !instruction_mask[0] {
            return Err(DecodeError::InvalidMask("code does not start with an instruction"));
        }
        Ok(Self {
            jump_table,
            jump_entry_width,
            code,
            instruction_mask,
        })
    }

    fn validate_jump_table(
        jump_table: &[MemAddress],
        jump_entry_width: u8,
    ) -> Result<(), DecodeError> {
        if jump_entry_width > MAX_JUMP_ENTRY_WIDTH
            || (jump_entry_width == 0 && !jump_table.is_empty())
        {
            return Err(DecodeError::InvalidJumpEntryWidth(jump_entry_width));
        }
        if jump_entry_width < MAX_JUMP_ENTRY_WIDTH {
            let limit = 1u64 << (8 * jump_entry_width as u32);
            if let Some(&entry) = jump_table.iter().find(|&&entry| entry as u64 >= limit) {
                return Err(DecodeError::JumpEntryTooLarge(entry));
            }
        }
        Ok(())
    }

    /// Decodes a program code blob. The whole blob must be consumed.
    pub fn from_blob(blob: &[u8]) -> Result<Self, DecodeError> {
        let mut input = blob;
        let jump_table_len = usize::decode(&mut input)?;
        let jump_entry_width = u8::decode_fixed(&mut input, 1)?;
        let code_len = usize::decode(&mut input)?;

        if jump_entry_width > MAX_JUMP_ENTRY_WIDTH || (jump_entry_width == 0 && jump_table_len > 0)
        {
            return Err(DecodeError::InvalidJumpEntryWidth(jump_entry_width));
        }

        let mut jump_table = Vec::with_capacity(jump_table_len.min(input.remaining_len()));
        for _ in 0..jump_table_len {
            jump_table.push(MemAddress::decode_fixed(
                &mut input,
                jump_entry_width as usize,
            )?);
        }

        let code = Vec::<u8>::decode_fixed(&mut input, code_len)?;
        let mask_bytes = Vec::<u8>::decode_fixed(&mut input, code_len.div_ceil(8))?;
        let used_bits = code_len % 8;
        if used_bits != 0 && mask_bytes.last().is_some_and(|&last| last >> used_bits != 0) {
            return Err(DecodeError::InvalidMaskPadding);
        }
        let mut instruction_mask = JamBitVec::from_vec(mask_bytes);
        instruction_mask.truncate(code_len);

        if !input.is_empty() {
            return Err(DecodeError::TrailingBytes(input.len()));
        }

        Self::new(jump_table, jump_entry_width, code, instruction_mask)
    }

    #[inline(always)]
    pub fn is_instruction_start(&self, index: usize) -> bool {
        self.instruction_mask
            .get(index)
            .is_some_and(|bit| *bit)
    }

    /// Offsets of all instruction starts, in ascending order.
    pub fn instruction_starts(&self) -> impl Iterator<Item = usize> + '_ {
        self.instruction_mask.iter_ones()
    }
}

impl JamEncode for Program {
    fn size_hint(&self) -> usize {
        self.jump_table.len().size_hint()
            + 1
            + self.code.len().size_hint()
            + self.jump_table.len() * self.jump_entry_width as usize
            + self.code.len()
            + self.code.len().div_ceil(8)
    }

    fn encode_to<T: JamOutput>(&self, dest: &mut T) -> Result<(), JamCodecError> {
        self.jump_table.len().encode_to(dest)?;
        self.jump_entry_width.encode_to_fixed(dest, 1)?;
        self.code.len().encode_to(dest)?;
        for entry in &self.jump_table {
            entry.encode_to_fixed(dest, self.jump_entry_width as usize)?;
        }
        self.code.as_slice().encode_to_fixed(dest, self.code.len())?;
        self.instruction_mask
            .encode_to_fixed(dest, self.instruction_mask.len())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::prelude::*;
    use std::error::Error;

    fn sample_blob() -> Vec<u8> {
        // |j| = 2, z = 1, |c| = 3, j = [0, 2], c = [1, 51, 0], k = 0b101
        vec![2, 1, 3, 0, 2, 1, 51, 0, 0b101]
    }

    #[test]
    fn test_decode_program() -> Result<(), Box<dyn Error>> {
        let program = Program::from_blob(&sample_blob())?;
        assert_eq!(program.jump_table, vec![0, 2]);
        assert_eq!(program.jump_entry_width, 1);
        assert_eq!(program.code, vec![1, 51, 0]);
        assert_eq!(program.instruction_mask, bitvec![u8, Lsb0; 1, 0, 1]);
        assert_eq!(program.instruction_starts().collect::<Vec<_>>(), vec![0, 2]);
        Ok(())
    }

    #[test]
    fn test_encode_reproduces_blob() -> Result<(), Box<dyn Error>> {
        let blob = sample_blob();
        let program = Program::from_blob(&blob)?;
        assert_eq!(program.size_hint(), blob.len());
        assert_eq!(program.encode()?, blob);
        Ok(())
    }

    #[test]
    fn test_reject_empty_code() {
        assert_eq!(
            Program::from_blob(&[0, 0, 0]),
            Err(DecodeError::InvalidMask("empty code"))
        );
    }

    #[test]
    fn test_reject_missing_entry_instruction() {
        assert!(matches!(
            Program::from_blob(&[0, 0, 2, 1, 0, 0b10]),
            Err(DecodeError::InvalidMask(_))
        ));
    }

    #[test]
    fn test_reject_mask_padding() {
        assert_eq!(
            Program::from_blob(&[0, 0, 1, 0, 0b11]),
            Err(DecodeError::InvalidMaskPadding)
        );
    }

    #[test]
    fn test_reject_overlong_length_prefix() {
        // |j| = 0 spelled in two octets
        assert_eq!(
            Program::from_blob(&[0x80, 0x00, 0, 1, 0, 1]),
            Err(DecodeError::JamCodecError(JamCodecError::NonCanonical {
                value: 0,
                len: 2
            }))
        );
    }

    #[test]
    fn test_reject_trailing_bytes() {
        let mut blob = sample_blob();
        blob.extend([0, 0]);
        assert_eq!(Program::from_blob(&blob), Err(DecodeError::TrailingBytes(2)));
    }

    #[test]
    fn test_reject_truncated_blob() {
        let blob = sample_blob();
        assert!(matches!(
            Program::from_blob(&blob[..blob.len() - 1]),
            Err(DecodeError::JamCodecError(_))
        ));
    }

    #[test]
    fn test_jump_entry_width() {
        assert_eq!(
            Program::from_blob(&[1, 0, 1, 0, 1]),
            Err(DecodeError::InvalidJumpEntryWidth(0))
        );
        assert_eq!(
            Program::from_blob(&[1, 5, 1, 0, 0, 0, 0, 0, 0, 1]),
            Err(DecodeError::InvalidJumpEntryWidth(5))
        );
        assert_eq!(
            Program::new(vec![256], 1, vec![0], bitvec![u8, Lsb0; 1]),
            Err(DecodeError::JumpEntryTooLarge(256))
        );
    }
}
