/// 32-bit memory addresses
pub type MemAddress = u32;

/// 64-bit register values
pub type RegValue = u64;

/// Signed gas counter, allowed to go below zero on the step that exhausts it.
pub type SignedGas = i64;

/// Gas charge amounts
pub type UnsignedGas = u64;

/// Host function identifier carried by `ecalli`.
pub type HostCallId = u32;
