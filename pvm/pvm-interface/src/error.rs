use jam_pvm_codec::JamCodecError;
use jam_pvm_core::{
    error::{DecodeError, VMCoreError},
    state::memory::MemoryError,
};
use jam_pvm_types::exit_reason::ExitReason;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostCallError {
    #[error("Host call handler returned an invalid exit reason: {0}")]
    InvalidExitReason(ExitReason),
}

// PVM Error Codes
#[derive(Debug, Error)]
pub enum PVMError {
    #[error("JamCodecError: {0}")]
    JamCodecError(#[from] JamCodecError),
    #[error("DecodeError: {0}")]
    DecodeError(#[from] DecodeError),
    #[error("MemoryError: {0}")]
    MemoryError(#[from] MemoryError),
    #[error("VMCoreError: {0}")]
    VMCoreError(#[from] VMCoreError),
    #[error("HostCallError: {0}")]
    HostCallError(#[from] HostCallError),
}
