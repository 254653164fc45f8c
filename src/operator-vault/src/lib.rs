//! Operator vault engine.
//!
//! A vault executes batches of external calls submitted by allowed operators. Each call must
//! prove membership of its descriptor in the owner's allow-list, may have words of its payload
//! pinned to committed values, may splice in words returned by earlier calls, may be wrapped by
//! hooks, and may receive a single authorized callback that runs a nested batch. Any failure
//! reverts the whole batch.

pub mod abi;
mod callback;
pub mod clipboard;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod errors;
pub mod executor;
pub mod extract;
pub mod hooks;
pub mod host;
pub mod ledger;
pub mod merkle;
pub mod preflight;
pub mod vault;

pub use clipboard::{apply_clipboards, ResultSet};
pub use config::{DecodeLimits, VaultConfig};
pub use decoder::{decode_batch, decode_batch_with_limits, decode_callback_region, CallbackRegion};
pub use errors::{
    AccessError, CallRevert, CallbackError, ClipboardError, DecodeError, ErrorKind, ExecutionError,
    ExtractError, OperationError,
};
pub use executor::{BatchExecutor, Stage};
pub use extract::{extract, extract_packed};
pub use hooks::{HookCall, HookContext, HookPhase, OperationHook};
pub use host::{memory::InMemoryHost, CallRequest, Host, Reentry, Storage};
pub use ledger::AuthorizationLedger;
pub use preflight::{preflight, PreflightReport, Verdict};
pub use vault::Vault;

pub use operator_vault_types as types;
