use alloy_primitives::B256;
use operator_vault_types::Descriptor;

use crate::encoder::{descriptor_leaf, keccak256_bytes};

/// Sorted-pair hash of two sibling nodes.
pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256_bytes(&buf)
}

/// Merkle tree over allow-list leaves.
///
/// Leaves are paired with their neighbour in insertion order; an odd node at the end of a
/// layer is carried up unchanged.
#[derive(Clone, Debug)]
pub struct AllowListTree {
    layers: Vec<Vec<B256>>,
}

impl AllowListTree {
    pub fn from_descriptors(descriptors: &[Descriptor]) -> Self {
        Self::from_leaves(descriptors.iter().map(descriptor_leaf).collect())
    }

    pub fn from_leaves(leaves: Vec<B256>) -> Self {
        let mut layers = vec![leaves];
        while layers.last().map_or(false, |layer| layer.len() > 1) {
            let below = &layers[layers.len() - 1];
            let next = below
                .chunks(2)
                .filter_map(|pair| pair.iter().copied().reduce(hash_pair))
                .collect();
            layers.push(next);
        }
        Self { layers }
    }

    /// Root of the tree; the zero root for an empty allow-list.
    pub fn root(&self) -> B256 {
        self.layers
            .last()
            .and_then(|top| top.first().copied())
            .unwrap_or(B256::ZERO)
    }

    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    pub fn leaf(&self, index: usize) -> Option<B256> {
        self.layers[0].get(index).copied()
    }

    /// Sibling path from leaf `index` to the root.
    pub fn proof(&self, index: usize) -> Option<Vec<B256>> {
        if index >= self.len() {
            return None;
        }
        let mut proof = Vec::new();
        let mut i = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = i ^ 1;
            if sibling < layer.len() {
                proof.push(layer[sibling]);
            }
            i /= 2;
        }
        Some(proof)
    }

    /// Fold `proof` into `leaf` and compare with the root.
    pub fn verify(&self, proof: &[B256], leaf: B256) -> bool {
        proof.iter().fold(leaf, |node, sibling| hash_pair(node, *sibling)) == self.root()
    }
}
