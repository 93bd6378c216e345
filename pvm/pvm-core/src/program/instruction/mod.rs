pub mod opcode;
pub mod operands;
pub mod registry;
pub mod set;
pub mod utils;

use crate::state::state_change::Modification;
use jam_pvm_types::exit_reason::ExitReason;

/// Outcome of evaluating a single instruction against the current VM state.
///
/// `Ok` carries the modifications to apply before execution continues; `Err` carries the exit
/// reason that stops execution at this instruction.
pub type Evaluation = Result<Vec<Modification>, ExitReason>;
