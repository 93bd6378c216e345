pub mod formatted_program;
pub mod parsed_program;
pub mod program;
pub mod program_state;
