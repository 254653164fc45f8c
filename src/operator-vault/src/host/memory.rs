//! A self-contained host: accounts, balances, storage and contracts written in Rust.

use std::{collections::BTreeMap, fmt, rc::Rc};

use alloy_primitives::{Address, Bytes, U256};
use tracing::trace;

use super::{CallRequest, Host, Reentry, Storage};
use crate::{
    errors::CallRevert,
    hooks::{HookCall, HookContext, HookPhase, OperationHook},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: U256,
    pub storage: Storage,
}

/// Code deployed at an address.
pub trait Contract {
    fn call(&self, frame: &mut Frame<'_>, input: &[u8]) -> Result<Bytes, CallRevert>;
}

impl<F> Contract for F
where
    F: Fn(&mut Frame<'_>, &[u8]) -> Result<Bytes, CallRevert>,
{
    fn call(&self, frame: &mut Frame<'_>, input: &[u8]) -> Result<Bytes, CallRevert> {
        self(frame, input)
    }
}

/// One call that reached the host and was not reverted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRecord {
    pub caller: Address,
    pub target: Address,
    pub input: Bytes,
    pub value: U256,
    pub read_only: bool,
}

#[derive(Clone, Debug)]
pub struct Checkpoint {
    accounts: BTreeMap<Address, Account>,
    calls: usize,
}

#[derive(Default)]
pub struct InMemoryHost {
    accounts: BTreeMap<Address, Account>,
    contracts: BTreeMap<Address, Rc<dyn Contract>>,
    hooks: BTreeMap<Address, Rc<dyn OperationHook>>,
    calls: Vec<CallRecord>,
}

impl fmt::Debug for InMemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryHost")
            .field("accounts", &self.accounts)
            .field("contracts", &self.contracts.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .field("calls", &self.calls.len())
            .finish()
    }
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deploy(&mut self, address: Address, contract: impl Contract + 'static) {
        self.contracts.insert(address, Rc::new(contract));
    }

    pub fn install_hook(&mut self, address: Address, hook: impl OperationHook + 'static) {
        self.hooks.insert(address, Rc::new(hook));
    }

    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.accounts.entry(address).or_default().balance = balance;
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.accounts.get(&address).map(|a| a.balance).unwrap_or_default()
    }

    pub fn sload(&self, address: Address, slot: U256) -> U256 {
        self.accounts.get(&address).map(|a| a.storage.get(slot)).unwrap_or_default()
    }

    pub fn sstore(&mut self, address: Address, slot: U256, value: U256) {
        self.accounts.entry(address).or_default().storage.set(slot, value);
    }

    /// Calls that completed, outermost first.
    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    fn move_value(&mut self, from: Address, to: Address, amount: U256) -> Result<(), CallRevert> {
        if amount.is_zero() || from == to {
            return Ok(());
        }
        let available = self.balance(from);
        if available < amount {
            return Err(CallRevert::message("insufficient balance for value transfer"));
        }
        self.accounts.entry(from).or_default().balance = available - amount;
        let credited = &mut self.accounts.entry(to).or_default().balance;
        *credited = credited.saturating_add(amount);
        Ok(())
    }

    fn dispatch(
        &mut self,
        request: &CallRequest<'_>,
        reentry: &mut dyn Reentry<Self>,
    ) -> Result<Bytes, CallRevert> {
        if request.read_only && !request.value.is_zero() {
            return Err(CallRevert::message("value sent in a static call"));
        }
        self.move_value(request.caller, request.target, request.value)?;

        // Calls to addresses without code succeed and return nothing.
        let Some(contract) = self.contracts.get(&request.target).cloned() else {
            return Ok(Bytes::new());
        };
        let mut frame = Frame {
            host: self,
            reentry,
            this: request.target,
            caller: request.caller,
            value: request.value,
            read_only: request.read_only,
        };
        contract.call(&mut frame, request.payload)
    }
}

impl Host for InMemoryHost {
    type Checkpoint = Checkpoint;

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint { accounts: self.accounts.clone(), calls: self.calls.len() }
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        self.accounts = checkpoint.accounts;
        self.calls.truncate(checkpoint.calls);
    }

    fn call(
        &mut self,
        request: &CallRequest<'_>,
        reentry: &mut dyn Reentry<Self>,
    ) -> Result<Bytes, CallRevert> {
        let checkpoint = self.checkpoint();
        self.calls.push(CallRecord {
            caller: request.caller,
            target: request.target,
            input: Bytes::copy_from_slice(request.payload),
            value: request.value,
            read_only: request.read_only,
        });

        let outcome = self.dispatch(request, reentry);
        if let Err(revert) = &outcome {
            trace!(target = %request.target, %revert, "call reverted");
            self.revert_to(checkpoint);
        }
        outcome
    }

    fn call_hook(
        &mut self,
        hook: Address,
        phase: HookPhase,
        call: &HookCall<'_>,
    ) -> Result<Bytes, CallRevert> {
        let Some(code) = self.hooks.get(&hook).cloned() else {
            return Err(CallRevert::message("hook has no code"));
        };
        let checkpoint = self.checkpoint();
        let mut ctx = HookContext {
            call,
            storage: &mut self.accounts.entry(hook).or_default().storage,
        };
        let outcome = match phase {
            HookPhase::Before => code.before(&mut ctx),
            HookPhase::After => code.after(&mut ctx),
        };
        if outcome.is_err() {
            self.revert_to(checkpoint);
        }
        outcome
    }
}

/// Execution frame of one contract call.
pub struct Frame<'a> {
    host: &'a mut InMemoryHost,
    reentry: &'a mut dyn Reentry<InMemoryHost>,
    this: Address,
    caller: Address,
    value: U256,
    read_only: bool,
}

impl Frame<'_> {
    /// Address of the executing contract.
    pub fn this(&self) -> Address {
        self.this
    }

    pub fn caller(&self) -> Address {
        self.caller
    }

    pub fn value(&self) -> U256 {
        self.value
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn sload(&self, slot: U256) -> U256 {
        self.host.sload(self.this, slot)
    }

    pub fn sstore(&mut self, slot: U256, value: U256) -> Result<(), CallRevert> {
        if self.read_only {
            return Err(CallRevert::message("state write in a static call"));
        }
        self.host.sstore(self.this, slot, value);
        Ok(())
    }

    pub fn balance(&self, address: Address) -> U256 {
        self.host.balance(address)
    }

    /// Call another contract from this one. Static context carries over.
    pub fn call(
        &mut self,
        target: Address,
        input: &[u8],
        value: U256,
    ) -> Result<Bytes, CallRevert> {
        let request = CallRequest {
            caller: self.this,
            target,
            payload: input,
            value,
            read_only: self.read_only,
        };
        self.host.call(&request, &mut *self.reentry)
    }

    /// Call the vault's callback entrypoint as this contract.
    pub fn callback(&mut self, data: &[u8]) -> Result<Bytes, CallRevert> {
        self.reentry.callback(self.host, self.this, data)
    }
}
