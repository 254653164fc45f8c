//! The world the vault calls into.
//!
//! The engine never talks to contracts directly: every target call, hook call and state
//! checkpoint goes through a [`Host`]. On-chain the host is the EVM itself; off-chain
//! [`memory::InMemoryHost`] plays that role.

pub mod memory;

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes, U256};

use crate::{
    errors::CallRevert,
    hooks::{HookCall, HookPhase},
};

/// One outgoing call from the vault.
#[derive(Clone, Copy, Debug)]
pub struct CallRequest<'a> {
    pub caller: Address,
    pub target: Address,
    pub payload: &'a [u8],
    pub value: U256,
    /// Static call: the callee and everything it calls may not write state.
    pub read_only: bool,
}

/// Entry back into the vault while one of its calls is executing.
pub trait Reentry<H: ?Sized> {
    /// `caller` invoked the vault's callback entrypoint with calldata `data`.
    fn callback(&mut self, host: &mut H, caller: Address, data: &[u8]) -> Result<Bytes, CallRevert>;
}

pub trait Host {
    type Checkpoint;

    /// Capture every piece of state a batch can change.
    fn checkpoint(&self) -> Self::Checkpoint;

    /// Restore a checkpoint taken earlier, discarding everything that happened since.
    fn revert_to(&mut self, checkpoint: Self::Checkpoint);

    /// Perform `request`. Re-entrant calls into the vault are routed to `reentry`.
    fn call(
        &mut self,
        request: &CallRequest<'_>,
        reentry: &mut dyn Reentry<Self>,
    ) -> Result<Bytes, CallRevert>;

    /// Invoke one phase of the hook deployed at `hook`.
    fn call_hook(
        &mut self,
        hook: Address,
        phase: HookPhase,
        call: &HookCall<'_>,
    ) -> Result<Bytes, CallRevert>;
}

/// Word-addressed contract storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Storage {
    slots: BTreeMap<U256, U256>,
}

impl Storage {
    pub fn get(&self, slot: U256) -> U256 {
        self.slots.get(&slot).copied().unwrap_or_default()
    }

    pub fn set(&mut self, slot: U256, value: U256) {
        if value.is_zero() {
            self.slots.remove(&slot);
        } else {
            self.slots.insert(slot, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
