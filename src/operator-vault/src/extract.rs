//! Offset-packed calldata extraction.
//!
//! Offsets are relative to the argument region, i.e. they skip the 4-byte selector. Each offset
//! selects one 32-byte word; the output is the concatenation of those words in offset order.

use alloy_primitives::U256;
use operator_vault_types::{
    wire::{MIN_EXTRACTABLE_PAYLOAD, PACKED_OFFSET_SLOTS, SELECTOR_WIDTH, WORD_WIDTH},
    PinnedOffsets,
};

use crate::errors::ExtractError;

/// Extract the words at `offsets` from `payload`.
pub fn extract(payload: &[u8], offsets: &PinnedOffsets) -> Result<Vec<u8>, ExtractError> {
    extract_offsets(payload, offsets.as_slice())
}

/// Extract using the packed form: `count` big-endian 16-bit offsets, most significant first.
pub fn extract_packed(payload: &[u8], packed: U256, count: u8) -> Result<Vec<u8>, ExtractError> {
    if count as usize >= PACKED_OFFSET_SLOTS {
        return Err(ExtractError::TooManyExtractions { count: count as usize });
    }
    let offsets = PinnedOffsets::from_packed(packed, count)
        .map_err(|e| ExtractError::TooManyExtractions { count: e.count })?;
    extract_offsets(payload, offsets.as_slice())
}

fn extract_offsets(payload: &[u8], offsets: &[u16]) -> Result<Vec<u8>, ExtractError> {
    if offsets.len() >= PACKED_OFFSET_SLOTS {
        return Err(ExtractError::TooManyExtractions { count: offsets.len() });
    }
    if payload.len() < MIN_EXTRACTABLE_PAYLOAD {
        return Err(ExtractError::PayloadTooShort {
            len: payload.len(),
            min: MIN_EXTRACTABLE_PAYLOAD,
        });
    }

    let last_word_start = payload.len() - WORD_WIDTH;
    let mut out = Vec::with_capacity(offsets.len() * WORD_WIDTH);
    for &offset in offsets {
        let start = SELECTOR_WIDTH + offset as usize;
        if start > last_word_start {
            return Err(ExtractError::OffsetOutOfBounds { offset, len: payload.len() });
        }
        out.extend_from_slice(&payload[start..start + WORD_WIDTH]);
    }
    Ok(out)
}
