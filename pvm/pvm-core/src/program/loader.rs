use crate::{
    error::VMCoreError,
    program::types::{program::Program, program_state::ProgramState},
};

pub struct ProgramLoader;
impl ProgramLoader {
    /// Decodes a program code blob and runs the static analysis over it: skip distances and
    /// basic block beginnings.
    pub fn load_program(program_code: &[u8]) -> Result<ProgramState, VMCoreError> {
        let program = Program::from_blob(program_code)?;
        let program_state = ProgramState::new(program)?;
        tracing::info!(
            code_len = program_state.code().len(),
            jump_table_len = program_state.jump_table().len(),
            basic_blocks = program_state.parsed().block_beginnings.len(),
            "Program loaded."
        );
        program_state.print_all_opcodes();
        Ok(program_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn test_load_program() -> Result<(), VMCoreError> {
        let program_state = ProgramLoader::load_program(&[1, 1, 2, 0, 0, 1, 0b11])?;
        assert_eq!(program_state.jump_table(), &[0]);
        assert!(program_state.is_block_beginning(1));
        Ok(())
    }

    #[test]
    fn test_load_empty_program_fails() {
        assert!(matches!(
            ProgramLoader::load_program(&[0, 0, 0]),
            Err(VMCoreError::DecodeError(DecodeError::InvalidMask(_)))
        ));
    }
}
