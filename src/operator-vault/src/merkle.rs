//! Allow-list inclusion proofs over sorted-pair keccak256 trees.

use alloy_primitives::{keccak256, B256};

/// Hash of two sibling nodes, ordered so that proofs need no direction bits.
pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}

/// Root obtained by folding `proof` into `leaf`.
pub fn process_proof(proof: &[B256], leaf: B256) -> B256 {
    proof.iter().fold(leaf, |node, sibling| hash_pair(node, *sibling))
}

pub fn verify(proof: &[B256], root: B256, leaf: B256) -> bool {
    process_proof(proof, leaf) == root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_hash_is_commutative() {
        let a = B256::repeat_byte(1);
        let b = B256::repeat_byte(2);
        assert_eq!(hash_pair(a, b), hash_pair(b, a));
        assert_ne!(hash_pair(a, b), hash_pair(a, a));
    }

    #[test]
    fn four_leaf_tree() {
        let leaves: Vec<B256> = (1u8..=4).map(|i| keccak256([i])).collect();
        let left = hash_pair(leaves[0], leaves[1]);
        let right = hash_pair(leaves[2], leaves[3]);
        let root = hash_pair(left, right);

        assert!(verify(&[leaves[1], right], root, leaves[0]));
        assert!(verify(&[leaves[2], left], root, leaves[3]));
        assert!(!verify(&[leaves[1], right], root, leaves[2]));
        assert!(!verify(&[right], root, leaves[0]));
    }

    #[test]
    fn empty_proof_is_a_single_leaf_tree() {
        let leaf = keccak256(b"only");
        assert!(verify(&[], leaf, leaf));
        assert!(!verify(&[], B256::ZERO, leaf));
    }
}
