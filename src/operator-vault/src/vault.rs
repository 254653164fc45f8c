//! The vault: owner-gated root management and the batch submission entrypoint.

use alloy_primitives::{Address, Bytes, B256};
use operator_vault_types::SubmitterAllowList;
use tracing::{info, info_span, warn};

use crate::{
    clipboard::ResultSet,
    config::{DecodeLimits, VaultConfig},
    decoder::decode_batch_with_limits,
    errors::{AccessError, CallbackError, ExecutionError},
    executor::BatchExecutor,
    host::Host,
    ledger::AuthorizationLedger,
};

/// Holds assets (through its host) and executes authorized batches for allowed submitters.
///
/// Every state-changing entrypoint takes `&mut self`, so a root replacement can never
/// interleave with a batch in flight.
#[derive(Clone, Debug)]
pub struct Vault<A> {
    address: Address,
    owner: Address,
    pending_owner: Option<Address>,
    ledger: AuthorizationLedger,
    limits: DecodeLimits,
    submitters: A,
}

impl<A: SubmitterAllowList> Vault<A> {
    pub fn new(config: VaultConfig, submitters: A) -> Result<Self, AccessError> {
        if config.owner == Address::ZERO {
            return Err(AccessError::ZeroAddress);
        }
        Ok(Self {
            address: config.address,
            owner: config.owner,
            pending_owner: None,
            ledger: AuthorizationLedger::new(config.root),
            limits: config.limits,
            submitters,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn pending_owner(&self) -> Option<Address> {
        self.pending_owner
    }

    pub fn root(&self) -> B256 {
        self.ledger.root()
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    pub fn submitters(&self) -> &A {
        &self.submitters
    }

    /// Replace the authorization root. Returns the previous root.
    pub fn set_root(&mut self, caller: Address, root: B256) -> Result<B256, AccessError> {
        self.only_owner(caller)?;
        Ok(self.ledger.replace_root(root))
    }

    /// First step of an ownership handover. A later call replaces the pending owner.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), AccessError> {
        self.only_owner(caller)?;
        if new_owner == Address::ZERO {
            return Err(AccessError::ZeroAddress);
        }
        info!(owner = %self.owner, pending = %new_owner, "ownership transfer started");
        self.pending_owner = Some(new_owner);
        Ok(())
    }

    pub fn accept_ownership(&mut self, caller: Address) -> Result<(), AccessError> {
        if self.pending_owner != Some(caller) {
            return Err(AccessError::NotPendingOwner { caller });
        }
        info!(previous = %self.owner, owner = %caller, "ownership transferred");
        self.owner = caller;
        self.pending_owner = None;
        Ok(())
    }

    /// Decode and execute `batch` on behalf of `submitter`.
    ///
    /// Either every operation succeeds and the results are returned, or the host is left
    /// exactly as it was before the call.
    pub fn submit<H: Host>(
        &mut self,
        host: &mut H,
        submitter: Address,
        batch: &[u8],
    ) -> Result<ResultSet, ExecutionError> {
        let span = info_span!("submit", vault = %self.address, %submitter, len = batch.len());
        let _guard = span.enter();

        let outcome = self.run_batch(host, submitter, batch);
        match &outcome {
            Ok(results) => info!(operations = results.len(), "batch executed"),
            Err(error) => warn!(%error, index = ?error.operation_index(), "batch rejected"),
        }
        outcome
    }

    fn run_batch<H: Host>(
        &self,
        host: &mut H,
        submitter: Address,
        batch: &[u8],
    ) -> Result<ResultSet, ExecutionError> {
        if !self.submitters.is_allowed_submitter(submitter) {
            return Err(ExecutionError::SubmitterNotAllowed(submitter));
        }
        let operations = decode_batch_with_limits(batch, &self.limits)?;
        BatchExecutor::new(self.address, submitter, self.ledger.clone(), self.limits)
            .execute(host, &operations)
    }

    /// Callback entrypoint reached outside of any batch. Windows only exist while one of the
    /// vault's own calls is executing, so this always fails.
    pub fn callback(&self, caller: Address, data: &[u8]) -> Result<Bytes, CallbackError> {
        warn!(%caller, len = data.len(), "callback outside of a batch");
        Err(CallbackError::NoActiveWindow)
    }

    fn only_owner(&self, caller: Address) -> Result<(), AccessError> {
        if caller != self.owner {
            return Err(AccessError::NotOwner { caller });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    use crate::host::memory::InMemoryHost;

    const VAULT: Address = address!("00000000000000000000000000000000000000aa");
    const OWNER: Address = address!("00000000000000000000000000000000000000a1");
    const ALICE: Address = address!("00000000000000000000000000000000000000a2");

    struct Only(Address);

    impl SubmitterAllowList for Only {
        fn is_allowed_submitter(&self, submitter: Address) -> bool {
            submitter == self.0
        }
    }

    fn vault() -> Vault<Only> {
        let config = VaultConfig {
            address: VAULT,
            owner: OWNER,
            root: B256::ZERO,
            limits: DecodeLimits::default(),
        };
        Vault::new(config, Only(ALICE)).unwrap()
    }

    #[test]
    fn only_owner_sets_root() {
        let mut vault = vault();
        let root = B256::repeat_byte(7);
        assert_eq!(vault.set_root(ALICE, root), Err(AccessError::NotOwner { caller: ALICE }));
        assert_eq!(vault.set_root(OWNER, root), Ok(B256::ZERO));
        assert_eq!(vault.root(), root);
    }

    #[test]
    fn two_step_ownership() {
        let mut vault = vault();
        assert_eq!(
            vault.accept_ownership(ALICE),
            Err(AccessError::NotPendingOwner { caller: ALICE })
        );
        assert_eq!(vault.transfer_ownership(OWNER, Address::ZERO), Err(AccessError::ZeroAddress));

        vault.transfer_ownership(OWNER, ALICE).unwrap();
        assert_eq!(vault.owner(), OWNER);
        assert_eq!(vault.pending_owner(), Some(ALICE));

        vault.accept_ownership(ALICE).unwrap();
        assert_eq!(vault.owner(), ALICE);
        assert_eq!(vault.pending_owner(), None);
        assert_eq!(vault.set_root(OWNER, B256::ZERO), Err(AccessError::NotOwner { caller: OWNER }));
    }

    #[test]
    fn unknown_submitters_are_rejected_before_decoding() {
        let mut vault = vault();
        let mut host = InMemoryHost::new();
        assert_eq!(
            vault.submit(&mut host, OWNER, &[0xff]),
            Err(ExecutionError::SubmitterNotAllowed(OWNER))
        );
        assert!(matches!(vault.submit(&mut host, ALICE, &[0xff]), Err(ExecutionError::Decode(_))));
    }

    #[test]
    fn empty_batch_succeeds() {
        let mut vault = vault();
        let results = vault.submit(&mut InMemoryHost::new(), ALICE, &[0]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn callback_without_batch_is_refused() {
        assert_eq!(vault().callback(ALICE, &[1, 2, 3, 4]), Err(CallbackError::NoActiveWindow));
    }
}
