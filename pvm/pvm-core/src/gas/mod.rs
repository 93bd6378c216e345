use crate::{error::VMCoreError, state::vm_state::VMState};
use jam_pvm_types::common::{SignedGas, UnsignedGas};

pub struct GasCharger;
impl GasCharger {
    /// Deducts gas counter of `VMState` with the given `gas_charge`, returning the posterior gas
    /// which could be negative on out-of-gas error.
    pub fn apply_gas_cost(
        vm_state: &mut VMState,
        gas_charge: UnsignedGas,
    ) -> Result<SignedGas, VMCoreError> {
        let gas_charge_signed: SignedGas = gas_charge
            .try_into()
            .map_err(|_| VMCoreError::TooLargeGasCharge(gas_charge))?;
        vm_state.gas_counter = vm_state
            .gas_counter
            .checked_sub(gas_charge_signed)
            .ok_or(VMCoreError::GasCounterOverflow)?;
        Ok(vm_state.gas_counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_gas_cost_deducts() -> Result<(), Box<dyn std::error::Error>> {
        let mut vm_state = VMState {
            gas_counter: 5,
            ..Default::default()
        };
        assert_eq!(GasCharger::apply_gas_cost(&mut vm_state, 3)?, 2);
        assert_eq!(GasCharger::apply_gas_cost(&mut vm_state, 3)?, -1);
        assert_eq!(vm_state.gas_counter, -1);
        Ok(())
    }

    #[test]
    fn test_apply_gas_cost_rejects_oversized_charge() {
        let mut vm_state = VMState::default();
        assert!(matches!(
            GasCharger::apply_gas_cost(&mut vm_state, u64::MAX),
            Err(VMCoreError::TooLargeGasCharge(_))
        ));
    }
}
