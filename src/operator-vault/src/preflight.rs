//! Static checks a submitter can run before sending a batch.
//!
//! Nothing is executed: constraints, membership proofs and pinned values are checked exactly
//! as the executor would check them, except where a clipboard may rewrite a pinned word at
//! run time.

use alloy_primitives::B256;
use operator_vault_types::{wire::WORD_WIDTH, Operation};

use crate::{
    config::DecodeLimits,
    decoder::decode_batch_with_limits,
    errors::{DecodeError, OperationError},
    executor::check_constraints,
    ledger::{check_pinned_values, AuthorizationLedger},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Authorized,
    /// Pinned words overlap clipboard destinations and can only be checked during execution.
    DependsOnResults,
    Rejected(OperationError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreflightReport {
    pub index: usize,
    pub leaf: B256,
    pub verdict: Verdict,
}

impl PreflightReport {
    pub fn is_rejected(&self) -> bool {
        matches!(self.verdict, Verdict::Rejected(_))
    }
}

pub fn preflight(
    batch: &[u8],
    root: B256,
    limits: &DecodeLimits,
) -> Result<Vec<PreflightReport>, DecodeError> {
    let operations = decode_batch_with_limits(batch, limits)?;
    let ledger = AuthorizationLedger::new(root);
    Ok(operations
        .iter()
        .enumerate()
        .map(|(index, op)| PreflightReport { index, leaf: op.leaf(), verdict: judge(&ledger, op) })
        .collect())
}

fn judge(ledger: &AuthorizationLedger, op: &Operation) -> Verdict {
    if let Err(e) =
        check_constraints(op, false).and_then(|_| ledger.verify_membership(op).map(|_| ()))
    {
        return Verdict::Rejected(e);
    }
    if pinned_words_overlap_clipboards(op) {
        return Verdict::DependsOnResults;
    }
    match check_pinned_values(&op.payload, op) {
        Ok(_) => Verdict::Authorized,
        Err(e) => Verdict::Rejected(e),
    }
}

fn pinned_words_overlap_clipboards(op: &Operation) -> bool {
    op.pinned_offsets.as_slice().iter().any(|&pinned| {
        op.clipboards.iter().any(|c| {
            let (a, b) = (pinned as usize, c.paste_offset as usize);
            a < b + WORD_WIDTH && b < a + WORD_WIDTH
        })
    })
}
