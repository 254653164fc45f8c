use std::fmt;

use alloy_primitives::{hex, Address, Bytes, B256};
use alloy_sol_types::{decode_revert_reason, Revert, SolError};
use operator_vault_types::Selector;
use thiserror::Error;

/// Errors during batch decoding.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input at byte {position}: {needed} more bytes needed")]
    UnexpectedEnd { position: usize, needed: usize },
    #[error("{remaining} trailing bytes after byte {position}")]
    TrailingBytes { position: usize, remaining: usize },
    #[error("region stops at byte {position} but was declared to end at byte {declared_end}")]
    RegionLengthMismatch { position: usize, declared_end: usize },
    #[error("invalid flag {value:#04x} at byte {position}")]
    InvalidFlag { position: usize, value: u8 },
    #[error("{count} pinned offsets at byte {position}, count must be below 16")]
    TooManyPinnedOffsets { position: usize, count: usize },
    #[error("{count} operations, limit is {max}")]
    TooManyOperations { count: usize, max: usize },
    #[error("{count} clipboards at byte {position}, limit is {max}")]
    TooManyClipboards { position: usize, count: usize, max: usize },
    #[error("proof of {len} nodes at byte {position}, limit is {max}")]
    ProofTooLong { position: usize, len: usize, max: usize },
    #[error("unknown callback return mode {mode} at byte {position}")]
    UnknownReturnMode { position: usize, mode: u8 },
    #[error("hook flag set with the zero address at byte {position}")]
    ZeroHook { position: usize },
}

/// Errors during pinned value extraction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("too many extractions: {count}")]
    TooManyExtractions { count: usize },
    #[error("payload too short: {len} bytes, need at least {min}")]
    PayloadTooShort { len: usize, min: usize },
    #[error("offset {offset} out of bounds for a {len}-byte payload")]
    OffsetOutOfBounds { offset: u16, len: usize },
}

/// Errors while applying clipboards to a payload.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClipboardError {
    #[error("clipboard {clipboard}: no result {result_index}, {available} results so far")]
    MissingResult { clipboard: usize, result_index: u8, available: usize },
    #[error("clipboard {clipboard}: word {word_index} is past the {result_len}-byte result")]
    CopyOutOfBounds { clipboard: usize, word_index: u8, result_len: usize },
    #[error("clipboard {clipboard}: paste offset {paste_offset} past the {payload_len}-byte payload")]
    PasteOutOfBounds { clipboard: usize, paste_offset: u16, payload_len: usize },
}

/// Reasons a re-entrant callback is refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CallbackError {
    #[error("no callback window is open")]
    NoActiveWindow,
    #[error("callback window already consumed")]
    AlreadyConsumed,
    #[error("caller {actual} is not the allowed caller {expected}")]
    CallerMismatch { expected: Address, actual: Address },
    #[error(
        "selector 0x{} is not the allowed selector 0x{}",
        hex::encode(.actual),
        hex::encode(.expected)
    )]
    SelectorMismatch { expected: Selector, actual: Selector },
    #[error("user data offset {offset} out of bounds for {len}-byte callback data")]
    UserDataOutOfBounds { offset: u16, len: usize },
    #[error("malformed callback user data: {0}")]
    MalformedUserData(DecodeError),
    #[error("return mode needs a nested result but the nested batch is empty")]
    MissingReturnResult,
}

/// Revert data returned by a failed external call or hook.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallRevert {
    pub data: Bytes,
}

impl CallRevert {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Revert with a standard `Error(string)` payload.
    pub fn message(reason: &str) -> Self {
        let data = Revert { reason: reason.to_string() }.abi_encode();
        Self { data: data.into() }
    }

    /// Decoded `Error(string)` / `Panic(uint256)` reason, if the payload is one.
    pub fn reason(&self) -> Option<String> {
        match Revert::abi_decode(&self.data, true) {
            Ok(revert) => Some(revert.reason),
            Err(_) => decode_revert_reason(&self.data),
        }
    }
}

impl fmt::Display for CallRevert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason() {
            Some(reason) => write!(f, "{reason}"),
            None if self.data.is_empty() => write!(f, "empty revert"),
            None => write!(f, "revert data {}", self.data),
        }
    }
}

/// Why a single operation was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("read-only operation carries value")]
    ReadOnlyWithValue,
    #[error("read-only operation declares a callback allowance")]
    ReadOnlyWithCallback,
    #[error("operations inside a callback may not declare a callback allowance")]
    NestedCallbackNotAllowed,
    #[error("membership proof for leaf {leaf} does not verify against root {root}")]
    Proof { leaf: B256, root: B256 },
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("pinned value mismatch at offset {offset}: expected {expected}, got {actual}")]
    PinnedValueMismatch { offset: u16, expected: B256, actual: B256 },
    #[error("before hook {hook} failed: {reason}")]
    BeforeHookFailed { hook: Address, reason: CallRevert },
    #[error("after hook {hook} failed: {reason}")]
    AfterHookFailed { hook: Address, reason: CallRevert },
    #[error("call to {target} failed: {reason}")]
    TargetCallFailed { target: Address, reason: CallRevert },
    #[error("callback unauthorized: {0}")]
    CallbackUnauthorized(CallbackError),
    #[error("inside callback: {0}")]
    Nested(Box<ExecutionError>),
}

/// Why a batch was rejected. Every variant means nothing of the batch was applied.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("submitter {0} is not allowed")]
    SubmitterNotAllowed(Address),
    #[error("batch decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("operation {index} failed: {source}")]
    Operation {
        index: usize,
        #[source]
        source: OperationError,
    },
}

/// Coarse classification of failures, one per reportable error kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Access,
    Decode,
    Bounds,
    Constraint,
    Proof,
    PinnedValueMismatch,
    BeforeHookFailed,
    AfterHookFailed,
    TargetCallFailed,
    CallbackUnauthorized,
}

impl ExecutionError {
    pub(crate) fn at(index: usize, source: OperationError) -> Self {
        ExecutionError::Operation { index, source }
    }

    /// Index of the failing top-level operation, if the failure belongs to one.
    pub fn operation_index(&self) -> Option<usize> {
        match self {
            ExecutionError::Operation { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Innermost operation error, following failures that happened inside callbacks.
    pub fn root_cause(&self) -> Option<&OperationError> {
        match self {
            ExecutionError::Operation { source: OperationError::Nested(inner), .. } => {
                inner.root_cause()
            }
            ExecutionError::Operation { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::SubmitterNotAllowed(_) => ErrorKind::Access,
            ExecutionError::Decode(_) => ErrorKind::Decode,
            ExecutionError::Operation { source, .. } => source.kind(),
        }
    }
}

impl OperationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationError::ReadOnlyWithValue
            | OperationError::ReadOnlyWithCallback
            | OperationError::NestedCallbackNotAllowed => ErrorKind::Constraint,
            OperationError::Proof { .. } => ErrorKind::Proof,
            OperationError::Clipboard(_) => ErrorKind::Bounds,
            OperationError::Extract(ExtractError::TooManyExtractions { .. }) => ErrorKind::Decode,
            OperationError::Extract(_) => ErrorKind::Bounds,
            OperationError::PinnedValueMismatch { .. } => ErrorKind::PinnedValueMismatch,
            OperationError::BeforeHookFailed { .. } => ErrorKind::BeforeHookFailed,
            OperationError::AfterHookFailed { .. } => ErrorKind::AfterHookFailed,
            OperationError::TargetCallFailed { .. } => ErrorKind::TargetCallFailed,
            OperationError::CallbackUnauthorized(_) => ErrorKind::CallbackUnauthorized,
            OperationError::Nested(inner) => inner.kind(),
        }
    }
}

/// Errors from owner-gated vault administration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("{caller} is not the owner")]
    NotOwner { caller: Address },
    #[error("{caller} is not the pending owner")]
    NotPendingOwner { caller: Address },
    #[error("the zero address cannot own the vault")]
    ZeroAddress,
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;

    #[test]
    fn revert_message_round_trips_through_display() {
        let revert = CallRevert::message("insufficient balance");
        assert_eq!(revert.reason().as_deref(), Some("insufficient balance"));
        assert_eq!(revert.to_string(), "insufficient balance");
        assert_eq!(CallRevert::default().to_string(), "empty revert");
    }

    #[test]
    fn operation_errors_show_the_bare_reason() {
        let err = OperationError::TargetCallFailed {
            target: Address::repeat_byte(7),
            reason: CallRevert::message("boom"),
        };
        assert!(err.to_string().ends_with("failed: boom"));
    }

    #[test]
    fn panic_payloads_fall_back_to_the_generic_decoder() {
        let mut data = vec![0x4e, 0x48, 0x7b, 0x71];
        data.extend_from_slice(&U256::from(0x11).to_be_bytes::<32>());
        let reason = CallRevert::new(data).reason().unwrap();
        assert!(reason.contains("overflow"));
    }

    #[test]
    fn nested_failures_report_the_inner_kind() {
        let inner = ExecutionError::at(
            1,
            OperationError::Proof { leaf: B256::ZERO, root: B256::repeat_byte(1) },
        );
        let outer = ExecutionError::at(
            3,
            OperationError::Nested(Box::new(inner)),
        );
        assert_eq!(outer.operation_index(), Some(3));
        assert_eq!(outer.kind(), ErrorKind::Proof);
        assert!(matches!(outer.root_cause(), Some(OperationError::Proof { .. })));
    }
}
