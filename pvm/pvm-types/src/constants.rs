//! PVM-specific constants
use crate::common::{MemAddress, RegValue, UnsignedGas};

/// Maximum skip distance.
pub const MAX_SKIP_DISTANCE: usize = 24;

/// Base gas charge for host function execution.
pub const HOSTCALL_BASE_GAS_CHARGE: UnsignedGas = 10;

/// Base gas charge for a single instruction.
pub const INST_BASE_GAS_CHARGE: UnsignedGas = 1;

/// Gas charged when the instruction pointer does not address a valid instruction.
pub const TRAP_GAS_CHARGE: UnsignedGas = 1;

/// The number of PVM registers.
pub const REGISTERS_COUNT: usize = 13;

/// The standard PVM program size limit in octets.
pub const STANDARD_PROGRAM_SIZE_LIMIT: usize = 1 << 32;

/// `Z_A`: The PVM dynamic address alignment factor.
pub const JUMP_ALIGNMENT: usize = 2;

/// Dynamic jump address that halts the machine instead of consulting the jump table.
pub const SPECIAL_HALT_ADDRESS: RegValue = (1 << 32) - (1 << 16);

/// Largest supported width of a jump table entry in octets.
pub const MAX_JUMP_ENTRY_WIDTH: u8 = 4;

/// `Z_I`: The standard PVM program initialization input data size in octets.
pub const INIT_INPUT_SIZE: usize = 1 << 24;

/// `Z_P`: PVM memory page size.
pub const PAGE_SIZE: usize = 1 << 12;

/// `Z_Z`: The standard PVM program initialization zone size in octets.
pub const INIT_ZONE_SIZE: usize = 1 << 16;

/// Number of pages covering the 32-bit address space.
pub const TOTAL_PAGES: usize = (1 << 32) / PAGE_SIZE;

/// Addresses below this bound are never accessible; touching them panics.
pub const FORBIDDEN_ZONE_END: MemAddress = INIT_ZONE_SIZE as MemAddress;
