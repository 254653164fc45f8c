//! Batch execution: every operation walks the same pipeline, and any failure aborts the batch.

use alloy_primitives::{Address, Bytes};
use operator_vault_types::Operation;
use tracing::{debug, debug_span, trace};

use crate::{
    callback::CallbackWindow,
    clipboard::{apply_clipboards, ResultSet},
    config::DecodeLimits,
    errors::{ExecutionError, OperationError},
    hooks::{dispatch_hook, HookCall, HookPhase},
    host::{CallRequest, Host},
    ledger::{check_pinned_values, AuthorizationLedger},
};

/// Progress of one operation through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Pending,
    ProofVerified,
    PayloadRewritten,
    PinnedValuesChecked,
    BeforeHookRun,
    Dispatched,
    AfterHookRun,
    Complete,
}

struct Progress {
    index: usize,
    stage: Stage,
}

impl Progress {
    fn reach(&mut self, stage: Stage) {
        debug!(index = self.index, ?stage);
        self.stage = stage;
    }
}

/// Structural rules an operation must satisfy before anything else is looked at.
pub(crate) fn check_constraints(op: &Operation, nested: bool) -> Result<(), OperationError> {
    if op.read_only && !op.value.is_zero() {
        return Err(OperationError::ReadOnlyWithValue);
    }
    if op.read_only && op.callback.is_some() {
        return Err(OperationError::ReadOnlyWithCallback);
    }
    if nested && op.callback.is_some() {
        return Err(OperationError::NestedCallbackNotAllowed);
    }
    Ok(())
}

/// Executes decoded operations on behalf of one submitter against one authorization root.
#[derive(Clone, Debug)]
pub struct BatchExecutor {
    vault: Address,
    submitter: Address,
    ledger: AuthorizationLedger,
    limits: DecodeLimits,
}

impl BatchExecutor {
    pub fn new(
        vault: Address,
        submitter: Address,
        ledger: AuthorizationLedger,
        limits: DecodeLimits,
    ) -> Self {
        Self { vault, submitter, ledger, limits }
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Run `operations` in order. On failure every state change made by the batch is reverted.
    pub fn execute<H: Host>(
        &self,
        host: &mut H,
        operations: &[Operation],
    ) -> Result<ResultSet, ExecutionError> {
        let checkpoint = host.checkpoint();
        let outcome = self.run(host, operations, false);
        if outcome.is_err() {
            host.revert_to(checkpoint);
        }
        outcome
    }

    /// Run the batch carried by a callback. Nested operations see their own result set and
    /// are verified against the same root as the outer batch.
    pub(crate) fn execute_nested<H: Host>(
        &self,
        host: &mut H,
        operations: &[Operation],
    ) -> Result<ResultSet, ExecutionError> {
        self.run(host, operations, true)
    }

    fn run<H: Host>(
        &self,
        host: &mut H,
        operations: &[Operation],
        nested: bool,
    ) -> Result<ResultSet, ExecutionError> {
        let mut results = ResultSet::new();
        for (index, op) in operations.iter().enumerate() {
            let span = debug_span!("operation", index, nested, target = %op.target);
            let _guard = span.enter();

            let mut progress = Progress { index, stage: Stage::Pending };
            match self.execute_operation(host, index, op, &results, nested, &mut progress) {
                Ok(result) => results.push(result),
                Err(error) => {
                    debug!(stage = ?progress.stage, %error, "operation rejected");
                    return Err(ExecutionError::at(index, error));
                }
            }
        }
        Ok(results)
    }

    fn execute_operation<H: Host>(
        &self,
        host: &mut H,
        index: usize,
        op: &Operation,
        results: &ResultSet,
        nested: bool,
        progress: &mut Progress,
    ) -> Result<Bytes, OperationError> {
        check_constraints(op, nested)?;

        let leaf = self.ledger.verify_membership(op)?;
        trace!(%leaf, "proof verified");
        progress.reach(Stage::ProofVerified);

        let payload = apply_clipboards(&op.payload, &op.clipboards, results)?;
        progress.reach(Stage::PayloadRewritten);

        let extracted = check_pinned_values(&payload, op)?;
        progress.reach(Stage::PinnedValuesChecked);

        let call = HookCall {
            vault: self.vault,
            submitter: self.submitter,
            index,
            target: op.target,
            selector: op.selector(),
            payload: &payload,
            value: op.value,
            extracted: &extracted,
            result: None,
        };
        if let Some(hook) = op.hook {
            dispatch_hook(host, hook, HookPhase::Before, &call)?;
            progress.reach(Stage::BeforeHookRun);
        }

        let request = CallRequest {
            caller: self.vault,
            target: op.target,
            payload: &payload,
            value: op.value,
            read_only: op.read_only,
        };
        let mut window = CallbackWindow::open(op.callback, self);
        let outcome = host.call(&request, &mut window);
        if let Some(violation) = window.into_violation() {
            return Err(violation);
        }
        let result = outcome
            .map_err(|reason| OperationError::TargetCallFailed { target: op.target, reason })?;
        progress.reach(Stage::Dispatched);

        if let Some(hook) = op.hook {
            let call = HookCall { result: Some(&result), ..call };
            dispatch_hook(host, hook, HookPhase::After, &call)?;
            progress.reach(Stage::AfterHookRun);
        }

        progress.reach(Stage::Complete);
        Ok(result)
    }
}
