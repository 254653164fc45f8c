//! Callback windows: the one re-entrant call an operation may receive while its target runs.

use alloy_primitives::{Address, Bytes};
use operator_vault_types::{wire::SELECTOR_WIDTH, CallbackAllowance, ReturnMode};
use tracing::{debug, warn};

use crate::{
    decoder::decode_callback_region,
    errors::{CallRevert, CallbackError, OperationError},
    executor::BatchExecutor,
    host::{Host, Reentry},
};

/// Scoped to a single target call. Opened with the operation's allowance (if any), consumed
/// by the first matching callback and dropped when the call returns.
pub(crate) struct CallbackWindow<'e> {
    allowance: Option<CallbackAllowance>,
    consumed: bool,
    violation: Option<OperationError>,
    executor: &'e BatchExecutor,
}

impl<'e> CallbackWindow<'e> {
    pub(crate) fn open(allowance: Option<CallbackAllowance>, executor: &'e BatchExecutor) -> Self {
        Self { allowance, consumed: false, violation: None, executor }
    }

    /// First failure seen inside the window. It fails the operation even when the target
    /// swallowed the revert it caused.
    pub(crate) fn into_violation(self) -> Option<OperationError> {
        self.violation
    }

    fn admit(&mut self, caller: Address, data: &[u8]) -> Result<CallbackAllowance, CallbackError> {
        let allowance = self.allowance.ok_or(CallbackError::NoActiveWindow)?;
        if self.consumed {
            return Err(CallbackError::AlreadyConsumed);
        }
        if caller != allowance.caller {
            return Err(CallbackError::CallerMismatch {
                expected: allowance.caller,
                actual: caller,
            });
        }

        let mut actual = [0u8; SELECTOR_WIDTH];
        let n = data.len().min(SELECTOR_WIDTH);
        actual[..n].copy_from_slice(&data[..n]);
        if n < SELECTOR_WIDTH || actual != allowance.selector {
            return Err(CallbackError::SelectorMismatch { expected: allowance.selector, actual });
        }

        if allowance.user_data_offset as usize + 2 > data.len() {
            return Err(CallbackError::UserDataOutOfBounds {
                offset: allowance.user_data_offset,
                len: data.len(),
            });
        }

        self.consumed = true;
        Ok(allowance)
    }

    /// Record `error` and turn it into the revert the caller sees.
    fn fail(&mut self, error: OperationError) -> CallRevert {
        warn!(%error, "callback rejected");
        let revert = CallRevert::message(&error.to_string());
        self.violation.get_or_insert(error);
        revert
    }
}

impl<H: Host> Reentry<H> for CallbackWindow<'_> {
    fn callback(
        &mut self,
        host: &mut H,
        caller: Address,
        data: &[u8],
    ) -> Result<Bytes, CallRevert> {
        let allowance = self
            .admit(caller, data)
            .map_err(|e| self.fail(OperationError::CallbackUnauthorized(e)))?;

        let region = decode_callback_region(
            data,
            allowance.user_data_offset as usize,
            self.executor.limits(),
        )
        .map_err(|e| {
            self.fail(OperationError::CallbackUnauthorized(CallbackError::MalformedUserData(e)))
        })?;
        debug!(%caller, nested = region.operations.len(), "callback admitted");

        let results = self
            .executor
            .execute_nested(host, &region.operations)
            .map_err(|e| self.fail(OperationError::Nested(Box::new(e))))?;

        match region.return_mode {
            ReturnMode::None => Ok(Bytes::new()),
            ReturnMode::Static(data) => Ok(data.into()),
            ReturnMode::LastResult => results.last().cloned().ok_or_else(|| {
                self.fail(OperationError::CallbackUnauthorized(CallbackError::MissingReturnResult))
            }),
        }
    }
}
