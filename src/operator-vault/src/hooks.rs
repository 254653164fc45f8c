//! Operation hooks: optional contracts consulted before and after an operation's call.

use alloy_primitives::{hex, Address, Bytes, U256};
use operator_vault_types::Selector;
use tracing::trace;

use crate::{
    errors::{CallRevert, OperationError},
    host::{Host, Storage},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookPhase {
    Before,
    After,
}

/// What a hook is told about the operation it guards.
#[derive(Clone, Copy, Debug)]
pub struct HookCall<'a> {
    pub vault: Address,
    pub submitter: Address,
    /// Position of the operation inside its batch.
    pub index: usize,
    pub target: Address,
    pub selector: Selector,
    /// Payload after clipboards were applied.
    pub payload: &'a [u8],
    pub value: U256,
    /// Words extracted at the pinned offsets.
    pub extracted: &'a [u8],
    /// Target return data, only set for the after phase.
    pub result: Option<&'a [u8]>,
}

/// Execution context handed to an in-process hook.
pub struct HookContext<'a> {
    pub call: &'a HookCall<'a>,
    /// The hook's own persistent storage. Writes are rolled back with the batch.
    pub storage: &'a mut Storage,
}

/// A hook contract. Either phase may revert, which aborts the whole batch.
pub trait OperationHook {
    fn before(&self, ctx: &mut HookContext<'_>) -> Result<Bytes, CallRevert>;

    fn after(&self, _ctx: &mut HookContext<'_>) -> Result<Bytes, CallRevert> {
        Ok(Bytes::new())
    }
}

/// Run one phase of `hook`, keeping its failure distinguishable from the target call's.
pub(crate) fn dispatch_hook<H: Host>(
    host: &mut H,
    hook: Address,
    phase: HookPhase,
    call: &HookCall<'_>,
) -> Result<(), OperationError> {
    match host.call_hook(hook, phase, call) {
        Ok(data) => {
            trace!(index = call.index, %hook, ?phase, data = %hex::encode(&data), "hook returned");
            Ok(())
        }
        Err(reason) => Err(match phase {
            HookPhase::Before => OperationError::BeforeHookFailed { hook, reason },
            HookPhase::After => OperationError::AfterHookFailed { hook, reason },
        }),
    }
}
