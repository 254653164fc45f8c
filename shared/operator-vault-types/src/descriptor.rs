use alloc::vec::Vec;

use alloy_primitives::{keccak256, Address, B256};

use crate::operation::{CallbackAllowance, PinnedOffsets, Selector};

/// One permitted call shape, committed on-chain only as an allow-list leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub target: Address,
    pub selector: Selector,
    pub allows_value: bool,
    pub pinned_offsets: PinnedOffsets,
    pub hook: Option<Address>,
    pub callback: Option<CallbackAllowance>,
    /// Words expected at `pinned_offsets`, concatenated in offset order.
    pub pinned_values: Vec<u8>,
}

impl Descriptor {
    /// Leaf preimage.
    ///
    /// Layout:
    /// - bytes20 target
    /// - bytes4 selector
    /// - u8 allows_value
    /// - u8 pinned offset count, then each offset as u16
    /// - bytes20 hook (zero when absent)
    /// - bytes32 keccak256(callback allowance) (zero when absent)
    /// - pinned values
    pub fn leaf_preimage(&self) -> Vec<u8> {
        let offsets = self.pinned_offsets.as_slice();
        let mut buf = Vec::with_capacity(
            20 + 4 + 2 + offsets.len() * 2 + 20 + 32 + self.pinned_values.len(),
        );
        buf.extend_from_slice(self.target.as_slice());
        buf.extend_from_slice(&self.selector);
        buf.push(u8::from(self.allows_value));
        buf.push(offsets.len() as u8);
        for offset in offsets {
            buf.extend_from_slice(&offset.to_be_bytes());
        }
        buf.extend_from_slice(self.hook.unwrap_or(Address::ZERO).as_slice());
        let callback_hash = self.callback.map(|c| c.hash()).unwrap_or(B256::ZERO);
        buf.extend_from_slice(callback_hash.as_slice());
        buf.extend_from_slice(&self.pinned_values);
        buf
    }

    /// Allow-list leaf = keccak256(leaf preimage).
    pub fn leaf(&self) -> B256 {
        keccak256(self.leaf_preimage())
    }
}
