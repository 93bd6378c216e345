use crate::{error::VMCoreError, utils::VMUtils};
use jam_pvm_codec::prelude::*;
use jam_pvm_types::constants::{
    INIT_INPUT_SIZE, INIT_ZONE_SIZE, PAGE_SIZE, STANDARD_PROGRAM_SIZE_LIMIT,
};

/// Standard program blob: data sections and stack size wrapped around a program code blob.
///
/// Layout: `E_3(|o|) ++ E_3(|w|) ++ E_2(z) ++ E_3(s) ++ o ++ w ++ E_4(|c|) ++ c`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormattedProgram {
    /// `|o|`: Read-only data size
    pub static_size: u32,
    /// `|w|`: Read-write data size
    pub heap_size: u32,
    /// `z`: Extra heap allocation in pages
    pub extra_heap_pages: u16,
    /// `s`: Stack area size
    pub stack_size: u32,
    /// `o`: Read-only data of the program
    pub static_data: Vec<u8>,
    /// `w`: Read-write data of the program
    pub heap_data: Vec<u8>,
    /// `|c|`: Program code size
    pub code_size: u32,
    /// `c`: Program code blob
    pub code: Vec<u8>,
}

impl JamEncode for FormattedProgram {
    fn size_hint(&self) -> usize {
        3 + 3 + 2 + 3 + self.static_data.len() + self.heap_data.len() + 4 + self.code.len()
    }

    fn encode_to<T: JamOutput>(&self, dest: &mut T) -> Result<(), JamCodecError> {
        self.static_size.encode_to_fixed(dest, 3)?;
        self.heap_size.encode_to_fixed(dest, 3)?;
        self.extra_heap_pages.encode_to_fixed(dest, 2)?;
        self.stack_size.encode_to_fixed(dest, 3)?;
        self.static_data
            .as_slice()
            .encode_to_fixed(dest, self.static_data.len())?;
        self.heap_data
            .as_slice()
            .encode_to_fixed(dest, self.heap_data.len())?;
        self.code_size.encode_to_fixed(dest, 4)?;
        self.code.as_slice().encode_to_fixed(dest, self.code.len())?;
        Ok(())
    }
}

impl JamDecode for FormattedProgram {
    fn decode<I: JamInput>(input: &mut I) -> Result<Self, JamCodecError>
    where
        Self: Sized,
    {
        let static_size = u32::decode_fixed(input, 3)?;
        let heap_size = u32::decode_fixed(input, 3)?;
        let extra_heap_pages = u16::decode_fixed(input, 2)?;
        let stack_size = u32::decode_fixed(input, 3)?;
        let static_data = Vec::<u8>::decode_fixed(input, static_size as usize)?;
        let heap_data = Vec::<u8>::decode_fixed(input, heap_size as usize)?;
        let code_size = u32::decode_fixed(input, 4)?;
        let code = Vec::<u8>::decode_fixed(input, code_size as usize)?;

        Ok(Self {
            static_size,
            heap_size,
            extra_heap_pages,
            stack_size,
            static_data,
            heap_data,
            code_size,
            code,
        })
    }
}

impl FormattedProgram {
    /// Decodes a standard program blob. The whole blob must be consumed.
    pub fn from_standard_program(program_blob: &[u8]) -> Result<Self, VMCoreError> {
        let mut input = program_blob;
        let formatted_program = Self::decode(&mut input)?;
        if !input.is_empty() {
            return Err(VMCoreError::InvalidProgram);
        }
        Ok(formatted_program)
    }

    /// `5·Z_Z + Z(|o|) + Z(|w| + z·Z_P) + Z(s) + Z_I <= 2^32`
    pub fn is_program_size_valid(&self) -> bool {
        5 * INIT_ZONE_SIZE
            + VMUtils::zone_align(self.static_size as usize)
            + VMUtils::zone_align(
                self.heap_size as usize + (self.extra_heap_pages as usize) * PAGE_SIZE,
            )
            + VMUtils::zone_align(self.stack_size as usize)
            + INIT_INPUT_SIZE
            <= STANDARD_PROGRAM_SIZE_LIMIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn sample() -> FormattedProgram {
        FormattedProgram {
            static_size: 2,
            heap_size: 1,
            extra_heap_pages: 3,
            stack_size: 0x1000,
            static_data: vec![0xaa, 0xbb],
            heap_data: vec![0xcc],
            code_size: 5,
            code: vec![0, 0, 1, 0, 1],
        }
    }

    #[test]
    fn test_decode_standard_program() -> Result<(), Box<dyn Error>> {
        let blob = sample().encode()?;
        assert_eq!(&blob[..11], &[2, 0, 0, 1, 0, 0, 3, 0, 0, 0x10, 0]);
        assert_eq!(blob.len(), sample().size_hint());
        assert_eq!(FormattedProgram::from_standard_program(&blob)?, sample());
        Ok(())
    }

    #[test]
    fn test_reject_trailing_bytes() -> Result<(), Box<dyn Error>> {
        let mut blob = sample().encode()?;
        blob.push(0);
        assert!(matches!(
            FormattedProgram::from_standard_program(&blob),
            Err(VMCoreError::InvalidProgram)
        ));
        Ok(())
    }

    #[test]
    fn test_largest_encodable_layout_fits() {
        assert!(sample().is_program_size_valid());
        let largest = FormattedProgram {
            static_size: 0xff_ffff,
            heap_size: 0xff_ffff,
            extra_heap_pages: u16::MAX,
            stack_size: 0xff_ffff,
            ..Default::default()
        };
        assert!(largest.is_program_size_valid());
    }
}
