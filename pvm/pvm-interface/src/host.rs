//! The host-call boundary: what `ecalli` hands to the caller and what the caller hands back.

use crate::error::PVMError;
use jam_pvm_core::state::{state_change::HostCallVMStateChange, vm_state::VMState};
use jam_pvm_types::{
    common::{HostCallId, RegValue, UnsignedGas},
    constants::HOSTCALL_BASE_GAS_CHARGE,
    exit_reason::ExitReason,
};

/// Status values a host function places in `r7`.
///
/// Error codes count down from `2^64 - 1`.
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostCallReturnCode {
    NONE = u64::MAX,
    /// Unknown host call id.
    WHAT = u64::MAX - 1,
    /// Memory range out of bounds or inaccessible.
    OOB = u64::MAX - 2,
    OK = 0,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostCallResult {
    pub exit_reason: ExitReason,
    pub vm_change: HostCallVMStateChange,
}

impl HostCallResult {
    pub fn continue_with_vm_change(vm_change: HostCallVMStateChange) -> Self {
        Self {
            exit_reason: ExitReason::Continue,
            vm_change,
        }
    }

    pub fn continue_with_return_code(code: HostCallReturnCode) -> Self {
        Self::continue_with_return_code_and_gas(code, HOSTCALL_BASE_GAS_CHARGE)
    }

    pub fn continue_with_return_code_and_gas(
        code: HostCallReturnCode,
        gas_charge: UnsignedGas,
    ) -> Self {
        Self::continue_with_vm_change(HostCallVMStateChange {
            gas_charge,
            r7_write: Some(code as RegValue),
            ..Default::default()
        })
    }

    pub fn halt() -> Self {
        Self {
            exit_reason: ExitReason::RegularHalt,
            vm_change: Default::default(),
        }
    }

    pub fn panic() -> Self {
        Self {
            exit_reason: ExitReason::Panic,
            vm_change: Default::default(),
        }
    }

    pub fn out_of_gas() -> Self {
        Self {
            exit_reason: ExitReason::OutOfGas,
            vm_change: Default::default(),
        }
    }
}

/// Host semantics behind `ecalli`.
///
/// The handler inspects the suspended VM state and describes its effect as a
/// `HostCallVMStateChange`; it never mutates the state itself.
pub trait HostCallHandler {
    fn handle(&mut self, id: HostCallId, vm_state: &VMState) -> Result<HostCallResult, PVMError>;
}

impl<F> HostCallHandler for F
where
    F: FnMut(HostCallId, &VMState) -> Result<HostCallResult, PVMError>,
{
    fn handle(&mut self, id: HostCallId, vm_state: &VMState) -> Result<HostCallResult, PVMError> {
        self(id, vm_state)
    }
}

/// Answers every host call with `WHAT`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHostFunctions;

impl HostCallHandler for NoHostFunctions {
    fn handle(&mut self, id: HostCallId, _vm_state: &VMState) -> Result<HostCallResult, PVMError> {
        tracing::debug!("Unknown host call: {id}");
        Ok(HostCallResult::continue_with_return_code(
            HostCallReturnCode::WHAT,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_code_is_written_to_r7() {
        let result = HostCallResult::continue_with_return_code(HostCallReturnCode::OOB);
        assert_eq!(result.exit_reason, ExitReason::Continue);
        assert_eq!(result.vm_change.r7_write, Some(u64::MAX - 2));
        assert_eq!(result.vm_change.gas_charge, HOSTCALL_BASE_GAS_CHARGE);

        let result = HostCallResult::continue_with_return_code_and_gas(HostCallReturnCode::OK, 0);
        assert_eq!(result.vm_change.r7_write, Some(0));
        assert_eq!(result.vm_change.gas_charge, 0);
        assert_eq!(HostCallReturnCode::NONE as u64, u64::MAX);
    }

    #[test]
    fn test_no_host_functions_answers_what() -> Result<(), PVMError> {
        let result = NoHostFunctions.handle(3, &VMState::default())?;
        assert_eq!(
            result,
            HostCallResult::continue_with_return_code(HostCallReturnCode::WHAT)
        );
        Ok(())
    }
}
