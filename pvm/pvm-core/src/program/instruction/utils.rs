#[macro_export]
macro_rules! continue_with_reg_write {
    ($reg_idx:expr, $reg_val:expr) => {
        Ok(vec![$crate::state::state_change::Modification::Register(
            $reg_idx, $reg_val,
        )])
    };
}

#[macro_export]
macro_rules! continue_with_mem_write {
    ($offset:expr, $data:expr) => {
        Ok(vec![$crate::state::state_change::Modification::Memory(
            $crate::state::state_change::MemWrite::new($offset, $data),
        )])
    };
}

#[macro_export]
macro_rules! jump_result {
    ($target:expr) => {
        Ok(vec![$crate::state::state_change::Modification::Jump(
            $target,
        )])
    };
}

/// Evaluates to an empty modification list when `cond` does not hold,
/// otherwise to a single register write.
#[macro_export]
macro_rules! conditional_reg_write {
    ($cond:expr, $reg_idx:expr, $reg_val:expr) => {
        if $cond {
            $crate::continue_with_reg_write!($reg_idx, $reg_val)
        } else {
            Ok(Vec::new())
        }
    };
}
