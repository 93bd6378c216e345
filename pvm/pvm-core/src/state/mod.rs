pub mod memory;
pub mod state_change;
pub mod vm_state;
