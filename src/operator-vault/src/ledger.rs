//! Authorization ledger: the current allow-list root and the checks made against it.

use alloy_primitives::B256;
use operator_vault_types::{wire::WORD_WIDTH, Operation};
use tracing::debug;

use crate::{errors::OperationError, extract::extract, merkle};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthorizationLedger {
    root: B256,
}

impl AuthorizationLedger {
    pub fn new(root: B256) -> Self {
        Self { root }
    }

    pub fn root(&self) -> B256 {
        self.root
    }

    /// Swap in a new root, effective immediately. Returns the retired root.
    pub(crate) fn replace_root(&mut self, root: B256) -> B256 {
        let previous = std::mem::replace(&mut self.root, root);
        debug!(%previous, %root, "authorization root replaced");
        previous
    }

    /// Verify that the descriptor `op` claims is a member of the current allow-list.
    ///
    /// Returns the verified leaf.
    pub fn verify_membership(&self, op: &Operation) -> Result<B256, OperationError> {
        let leaf = op.leaf();
        if !merkle::verify(&op.proof, self.root, leaf) {
            return Err(OperationError::Proof { leaf, root: self.root });
        }
        Ok(leaf)
    }
}

/// Check that `payload` carries the committed words at the pinned offsets of `op`.
///
/// `payload` is the rewritten payload, after clipboards were applied. Returns the extracted
/// bytes, which hooks receive alongside the payload.
pub fn check_pinned_values(payload: &[u8], op: &Operation) -> Result<Vec<u8>, OperationError> {
    if op.pinned_offsets.is_empty() {
        return Ok(Vec::new());
    }
    let extracted = extract(payload, &op.pinned_offsets)?;

    for (i, &offset) in op.pinned_offsets.as_slice().iter().enumerate() {
        let range = i * WORD_WIDTH..(i + 1) * WORD_WIDTH;
        let actual = B256::from_slice(&extracted[range.clone()]);
        let expected = op
            .pinned_values
            .get(range)
            .map(B256::from_slice)
            .unwrap_or(B256::ZERO);
        if actual != expected {
            return Err(OperationError::PinnedValueMismatch { offset, expected, actual });
        }
    }
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use operator_vault_types::PinnedOffsets;

    use crate::{errors::ExtractError, merkle::hash_pair};

    fn approve_op(spender_word: [u8; 32]) -> Operation {
        let mut payload = vec![0x09, 0x5e, 0xa7, 0xb3];
        payload.extend_from_slice(&spender_word);
        payload.extend_from_slice(&[0xffu8; 32]);
        let mut op = Operation::call(address!("1000000000000000000000000000000000000001"), payload);
        op.pinned_offsets = PinnedOffsets::new(&[0]).unwrap();
        op.pinned_values = [0x22u8; 32].to_vec();
        op
    }

    #[test]
    fn membership_against_two_leaf_root() {
        let op = approve_op([0x22; 32]);
        let sibling = B256::repeat_byte(0x33);
        let ledger = AuthorizationLedger::new(hash_pair(op.leaf(), sibling));

        let mut with_proof = op.clone();
        with_proof.proof = vec![sibling];
        assert_eq!(ledger.verify_membership(&with_proof).unwrap(), op.leaf());

        assert_eq!(
            ledger.verify_membership(&op),
            Err(OperationError::Proof { leaf: op.leaf(), root: ledger.root() })
        );
    }

    #[test]
    fn replaced_root_takes_effect_immediately() {
        let op = approve_op([0x22; 32]);
        let mut ledger = AuthorizationLedger::new(op.leaf());
        assert!(ledger.verify_membership(&op).is_ok());
        assert_eq!(ledger.replace_root(B256::repeat_byte(1)), op.leaf());
        assert!(ledger.verify_membership(&op).is_err());
    }

    #[test]
    fn pinned_values_must_match_payload() {
        let good = approve_op([0x22; 32]);
        assert_eq!(check_pinned_values(&good.payload, &good).unwrap(), vec![0x22u8; 32]);

        let bad = approve_op([0x44; 32]);
        assert_eq!(
            check_pinned_values(&bad.payload, &bad),
            Err(OperationError::PinnedValueMismatch {
                offset: 0,
                expected: B256::repeat_byte(0x22),
                actual: B256::repeat_byte(0x44),
            })
        );
    }

    #[test]
    fn unpinned_operations_skip_extraction() {
        let op = Operation::call(address!("1000000000000000000000000000000000000001"), vec![1, 2]);
        assert_eq!(check_pinned_values(&op.payload, &op).unwrap(), Vec::<u8>::new());

        let mut pinned = op.clone();
        pinned.pinned_offsets = PinnedOffsets::new(&[0]).unwrap();
        pinned.pinned_values = vec![0u8; 32];
        assert_eq!(
            check_pinned_values(&pinned.payload, &pinned),
            Err(OperationError::Extract(ExtractError::PayloadTooShort { len: 2, min: 36 }))
        );
    }
}
