pub mod builder;
pub mod instruction;
pub mod loader;
pub mod types;
