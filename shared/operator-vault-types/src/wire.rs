//! Widths and limits of the batch wire format.

/// Width of a function selector at the start of every payload.
pub const SELECTOR_WIDTH: usize = 4;

/// Width of one ABI word.
pub const WORD_WIDTH: usize = 32;

/// Width of an address.
pub const ADDRESS_WIDTH: usize = 20;

/// Width of a packed callback allowance: caller (20) | selector (4) | user data offset (2).
pub const CALLBACK_ALLOWANCE_WIDTH: usize = ADDRESS_WIDTH + SELECTOR_WIDTH + 2;

/// Width of an encoded clipboard: result index (1) | word index (1) | paste offset (2).
pub const CLIPBOARD_WIDTH: usize = 4;

/// Number of 16-bit slots in the packed offsets accumulator (one 256-bit word).
pub const PACKED_OFFSET_SLOTS: usize = 16;

/// Largest usable pinned offset count. A count equal to the slot count is rejected.
pub const MAX_PINNED_OFFSETS: usize = PACKED_OFFSET_SLOTS - 1;

/// Smallest payload the extractor accepts: a selector plus one word.
pub const MIN_EXTRACTABLE_PAYLOAD: usize = SELECTOR_WIDTH + WORD_WIDTH;
