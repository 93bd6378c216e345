use crate::common::{HostCallId, MemAddress};
use std::fmt::{Display, Formatter};

/// PVM Invocation Exit Reasons
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// Execution may proceed. Only produced by the single-step transition.
    #[default]
    Continue,
    RegularHalt,
    Panic,
    OutOfGas,
    PageFault(MemAddress),
    HostCall(HostCallId),
}

impl Display for ExitReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continue => write!(f, "continue"),
            Self::RegularHalt => write!(f, "halt"),
            Self::Panic => write!(f, "panic"),
            Self::OutOfGas => write!(f, "out-of-gas"),
            Self::PageFault(address) => write!(f, "page-fault({address:#x})"),
            Self::HostCall(id) => write!(f, "host-call({id})"),
        }
    }
}
