use alloc::vec::Vec;

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::{
    descriptor::Descriptor,
    wire::{CALLBACK_ALLOWANCE_WIDTH, CLIPBOARD_WIDTH, PACKED_OFFSET_SLOTS, SELECTOR_WIDTH},
};

/// Four-byte function selector.
pub type Selector = [u8; 4];

/// Copy instruction: take word `word_index` of result `result_index` and paste it at
/// `paste_offset` bytes into the argument region of the current payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Clipboard {
    pub result_index: u8,
    pub word_index: u8,
    pub paste_offset: u16,
}

impl Clipboard {
    pub fn new(result_index: u8, word_index: u8, paste_offset: u16) -> Self {
        Self { result_index, word_index, paste_offset }
    }

    pub fn to_bytes(&self) -> [u8; CLIPBOARD_WIDTH] {
        let offset = self.paste_offset.to_be_bytes();
        [self.result_index, self.word_index, offset[0], offset[1]]
    }
}

/// The single re-entrant call an operation may receive while it executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallbackAllowance {
    /// Contract expected to call back into the vault.
    pub caller: Address,
    /// Selector the callback calldata must start with.
    pub selector: Selector,
    /// Absolute offset of the user-data region inside the callback calldata.
    pub user_data_offset: u16,
}

impl CallbackAllowance {
    /// Packed 208-bit form: caller | selector | user data offset.
    pub fn to_bytes(&self) -> [u8; CALLBACK_ALLOWANCE_WIDTH] {
        let mut out = [0u8; CALLBACK_ALLOWANCE_WIDTH];
        out[0..20].copy_from_slice(self.caller.as_slice());
        out[20..24].copy_from_slice(&self.selector);
        out[24..26].copy_from_slice(&self.user_data_offset.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; CALLBACK_ALLOWANCE_WIDTH]) -> Self {
        let caller = Address::from_slice(&bytes[0..20]);
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&bytes[20..24]);
        let user_data_offset = u16::from_be_bytes([bytes[24], bytes[25]]);
        Self { caller, selector, user_data_offset }
    }

    /// Commitment to the allowance used inside allow-list leaves.
    pub fn hash(&self) -> B256 {
        keccak256(self.to_bytes())
    }
}

/// A pinned offset list longer than the accumulator allows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TooManyOffsets {
    pub count: usize,
}

/// Bounded list of 16-bit argument offsets.
///
/// Holds at most [`MAX_PINNED_OFFSETS`](crate::wire::MAX_PINNED_OFFSETS) entries so that the
/// list always fits the 16-slot packed accumulator with the count check `count < 16`.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct PinnedOffsets {
    slots: [u16; PACKED_OFFSET_SLOTS],
    len: u8,
}

impl PinnedOffsets {
    pub const EMPTY: Self = Self { slots: [0; PACKED_OFFSET_SLOTS], len: 0 };

    pub fn new(offsets: &[u16]) -> Result<Self, TooManyOffsets> {
        if offsets.len() >= PACKED_OFFSET_SLOTS {
            return Err(TooManyOffsets { count: offsets.len() });
        }
        let mut slots = [0u16; PACKED_OFFSET_SLOTS];
        slots[..offsets.len()].copy_from_slice(offsets);
        Ok(Self { slots, len: offsets.len() as u8 })
    }

    /// Unpack `count` offsets from a 256-bit accumulator, most significant slot first.
    pub fn from_packed(mut packed: U256, count: u8) -> Result<Self, TooManyOffsets> {
        if count as usize >= PACKED_OFFSET_SLOTS {
            return Err(TooManyOffsets { count: count as usize });
        }
        let mut slots = [0u16; PACKED_OFFSET_SLOTS];
        for slot in slots.iter_mut().take(count as usize) {
            let top = packed.to_be_bytes::<32>();
            *slot = u16::from_be_bytes([top[0], top[1]]);
            packed <<= 16usize;
        }
        Ok(Self { slots, len: count })
    }

    /// Pack into a 256-bit accumulator, first offset in the most significant slot.
    pub fn to_packed(&self) -> U256 {
        let mut word = [0u8; 32];
        for (i, offset) in self.as_slice().iter().enumerate() {
            word[i * 2..i * 2 + 2].copy_from_slice(&offset.to_be_bytes());
        }
        U256::from_be_bytes(word)
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.slots[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl core::fmt::Debug for PinnedOffsets {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// How the callback entrypoint answers its caller once the nested batch ran.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReturnMode {
    /// Return empty data.
    None,
    /// Return these bytes verbatim.
    Static(Vec<u8>),
    /// Return the result of the last nested operation.
    LastResult,
}

impl ReturnMode {
    pub fn tag(&self) -> u8 {
        match self {
            ReturnMode::None => 0,
            ReturnMode::Static(_) => 1,
            ReturnMode::LastResult => 2,
        }
    }
}

/// One decoded call of a batch plus its rewrite and verification metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Operation {
    pub target: Address,
    pub payload: Vec<u8>,
    pub clipboards: Vec<Clipboard>,
    pub read_only: bool,
    pub callback: Option<CallbackAllowance>,
    pub pinned_offsets: PinnedOffsets,
    /// Expected words at `pinned_offsets`, `32 * pinned_offsets.len()` bytes.
    pub pinned_values: Vec<u8>,
    pub proof: Vec<B256>,
    pub hook: Option<Address>,
    pub value: U256,
}

impl Operation {
    /// A plain call with no rewrite or verification metadata attached yet.
    pub fn call(target: Address, payload: Vec<u8>) -> Self {
        Self {
            target,
            payload,
            clipboards: Vec::new(),
            read_only: false,
            callback: None,
            pinned_offsets: PinnedOffsets::EMPTY,
            pinned_values: Vec::new(),
            proof: Vec::new(),
            hook: None,
            value: U256::ZERO,
        }
    }

    /// First four payload bytes, zero-padded when the payload is shorter.
    pub fn selector(&self) -> Selector {
        let mut selector = [0u8; SELECTOR_WIDTH];
        let n = self.payload.len().min(SELECTOR_WIDTH);
        selector[..n].copy_from_slice(&self.payload[..n]);
        selector
    }

    /// The descriptor this operation claims to be an instance of.
    pub fn descriptor(&self) -> Descriptor {
        Descriptor {
            target: self.target,
            selector: self.selector(),
            allows_value: !self.value.is_zero(),
            pinned_offsets: self.pinned_offsets,
            hook: self.hook,
            callback: self.callback,
            pinned_values: self.pinned_values.clone(),
        }
    }

    /// Allow-list leaf the membership proof must resolve to.
    pub fn leaf(&self) -> B256 {
        self.descriptor().leaf()
    }
}
