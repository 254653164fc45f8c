//! Solidity error ABI for failures surfaced to on-chain callers.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolError};

use crate::errors::{AccessError, DecodeError, ExecutionError, ExtractError, OperationError};

sol! {
    error NotOwner(address caller);
    error NotPendingOwner(address caller);
    error ZeroAddress();

    error SubmitterNotAllowed(address submitter);
    error BatchDecodeFailed(uint256 position);
    error OperationConstraintViolated(uint256 index);
    error BoundsViolation(uint256 index);
    error ProofInvalid(uint256 index, bytes32 leaf, bytes32 root);
    error PinnedValueMismatch(uint256 index, uint16 offset, bytes32 expected, bytes32 actual);
    error BeforeHookFailed(uint256 index, address hook, bytes reason);
    error AfterHookFailed(uint256 index, address hook, bytes reason);
    error TargetCallFailed(uint256 index, address target, bytes reason);
    error CallbackUnauthorized(uint256 index);
}

impl AccessError {
    pub fn revert_data(&self) -> Bytes {
        match self {
            AccessError::NotOwner { caller } => NotOwner { caller: *caller }.abi_encode(),
            AccessError::NotPendingOwner { caller } => {
                NotPendingOwner { caller: *caller }.abi_encode()
            }
            AccessError::ZeroAddress => ZeroAddress {}.abi_encode(),
        }
        .into()
    }
}

impl DecodeError {
    /// Byte at which decoding stopped, where one is known.
    pub fn position(&self) -> usize {
        match self {
            DecodeError::UnexpectedEnd { position, .. }
            | DecodeError::TrailingBytes { position, .. }
            | DecodeError::RegionLengthMismatch { position, .. }
            | DecodeError::InvalidFlag { position, .. }
            | DecodeError::TooManyPinnedOffsets { position, .. }
            | DecodeError::TooManyClipboards { position, .. }
            | DecodeError::ProofTooLong { position, .. }
            | DecodeError::UnknownReturnMode { position, .. }
            | DecodeError::ZeroHook { position } => *position,
            DecodeError::TooManyOperations { .. } => 0,
        }
    }
}

impl ExecutionError {
    /// Revert data for the whole batch.
    ///
    /// Failures inside callbacks are reported at the index of the top-level operation whose
    /// target made the callback, carrying the details of the innermost failure.
    pub fn revert_data(&self) -> Bytes {
        match self {
            ExecutionError::SubmitterNotAllowed(submitter) => {
                SubmitterNotAllowed { submitter: *submitter }.abi_encode().into()
            }
            ExecutionError::Decode(e) => decode_failed(e.position()),
            ExecutionError::Operation { index, source } => {
                let cause = self.root_cause().unwrap_or(source);
                operation_revert(U256::from(*index), cause)
            }
        }
    }
}

fn decode_failed(position: usize) -> Bytes {
    BatchDecodeFailed { position: U256::from(position) }.abi_encode().into()
}

fn operation_revert(index: U256, cause: &OperationError) -> Bytes {
    let data = match cause {
        OperationError::ReadOnlyWithValue
        | OperationError::ReadOnlyWithCallback
        | OperationError::NestedCallbackNotAllowed => {
            OperationConstraintViolated { index }.abi_encode()
        }
        OperationError::Proof { leaf, root } => {
            ProofInvalid { index, leaf: *leaf, root: *root }.abi_encode()
        }
        OperationError::Extract(ExtractError::TooManyExtractions { .. }) => return decode_failed(0),
        OperationError::Clipboard(_) | OperationError::Extract(_) => {
            BoundsViolation { index }.abi_encode()
        }
        OperationError::PinnedValueMismatch { offset, expected, actual } => PinnedValueMismatch {
            index,
            offset: *offset,
            expected: *expected,
            actual: *actual,
        }
        .abi_encode(),
        OperationError::BeforeHookFailed { hook, reason } => {
            BeforeHookFailed { index, hook: *hook, reason: reason.data.clone() }.abi_encode()
        }
        OperationError::AfterHookFailed { hook, reason } => {
            AfterHookFailed { index, hook: *hook, reason: reason.data.clone() }.abi_encode()
        }
        OperationError::TargetCallFailed { target, reason } => {
            TargetCallFailed { index, target: *target, reason: reason.data.clone() }.abi_encode()
        }
        OperationError::CallbackUnauthorized(_) | OperationError::Nested(_) => {
            CallbackUnauthorized { index }.abi_encode()
        }
    };
    data.into()
}
