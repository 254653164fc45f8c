use operator_vault_types::{
    wire::{MAX_PINNED_OFFSETS, WORD_WIDTH},
    Clipboard, Operation, PinnedOffsets, ReturnMode,
};

use crate::{config::DecodeLimits, cursor::Cursor, errors::DecodeError};

/// Decoded contents of a callback user-data region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackRegion {
    pub return_mode: ReturnMode,
    pub operations: Vec<Operation>,
}

/// Decode a submitted batch with the default limits.
pub fn decode_batch(bytes: &[u8]) -> Result<Vec<Operation>, DecodeError> {
    decode_batch_with_limits(bytes, &DecodeLimits::default())
}

/// Decode a submitted batch. The batch must span the whole buffer.
pub fn decode_batch_with_limits(
    bytes: &[u8],
    limits: &DecodeLimits,
) -> Result<Vec<Operation>, DecodeError> {
    let mut cursor = Cursor::new(bytes);
    let operations = read_operations(&mut cursor, limits)?;
    cursor.expect_exhausted()?;
    Ok(operations)
}

/// Decode the user-data region of a callback, located at `offset` inside `data`.
///
/// Layout:
/// - u16 region length
/// - u8 return mode (0 none, 1 static, 2 last nested result)
/// - u16 length + static return bytes, only for return mode 1
/// - nested batch, which must end exactly at the region end
///
/// Bytes after the region belong to the caller's calldata and are ignored.
pub fn decode_callback_region(
    data: &[u8],
    offset: usize,
    limits: &DecodeLimits,
) -> Result<CallbackRegion, DecodeError> {
    let mut cursor = Cursor::at(data, offset);
    let region_len = cursor.read_u16()? as usize;
    let region_end = cursor.position() + region_len;
    if region_end > data.len() {
        return Err(DecodeError::UnexpectedEnd {
            position: cursor.position(),
            needed: region_end - data.len(),
        });
    }

    let mode_position = cursor.position();
    let return_mode = match cursor.read_u8()? {
        0 => ReturnMode::None,
        1 => ReturnMode::Static(cursor.read_len_prefixed()?.to_vec()),
        2 => ReturnMode::LastResult,
        mode => return Err(DecodeError::UnknownReturnMode { position: mode_position, mode }),
    };
    let operations = read_operations(&mut cursor, limits)?;
    cursor.expect_end_at(region_end)?;

    Ok(CallbackRegion { return_mode, operations })
}

fn read_operations(
    cursor: &mut Cursor<'_>,
    limits: &DecodeLimits,
) -> Result<Vec<Operation>, DecodeError> {
    let count = cursor.read_u8()?;
    if count > limits.max_operations {
        return Err(DecodeError::TooManyOperations {
            count: count as usize,
            max: limits.max_operations as usize,
        });
    }
    let mut operations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        operations.push(read_operation(cursor, limits)?);
    }
    Ok(operations)
}

fn read_operation(
    cursor: &mut Cursor<'_>,
    limits: &DecodeLimits,
) -> Result<Operation, DecodeError> {
    let target = cursor.read_address()?;
    let payload = cursor.read_len_prefixed()?.to_vec();

    let position = cursor.position();
    let clipboard_count = cursor.read_u8()?;
    if clipboard_count > limits.max_clipboards {
        return Err(DecodeError::TooManyClipboards {
            position,
            count: clipboard_count as usize,
            max: limits.max_clipboards as usize,
        });
    }
    let mut clipboards = Vec::with_capacity(clipboard_count as usize);
    for _ in 0..clipboard_count {
        let result_index = cursor.read_u8()?;
        let word_index = cursor.read_u8()?;
        let paste_offset = cursor.read_u16()?;
        clipboards.push(Clipboard { result_index, word_index, paste_offset });
    }

    let read_only = cursor.read_flag()?;
    let callback = if cursor.read_flag()? {
        Some(cursor.read_callback_allowance()?)
    } else {
        None
    };

    let position = cursor.position();
    let pinned_count = cursor.read_u8()? as usize;
    if pinned_count > MAX_PINNED_OFFSETS {
        return Err(DecodeError::TooManyPinnedOffsets { position, count: pinned_count });
    }
    let mut offsets = [0u16; MAX_PINNED_OFFSETS];
    for slot in offsets.iter_mut().take(pinned_count) {
        *slot = cursor.read_u16()?;
    }
    let pinned_offsets = PinnedOffsets::new(&offsets[..pinned_count])
        .map_err(|e| DecodeError::TooManyPinnedOffsets { position, count: e.count })?;
    let pinned_values = cursor.read_bytes(pinned_count * WORD_WIDTH)?.to_vec();

    let position = cursor.position();
    let proof_len = cursor.read_u8()?;
    if proof_len > limits.max_proof_len {
        return Err(DecodeError::ProofTooLong {
            position,
            len: proof_len as usize,
            max: limits.max_proof_len as usize,
        });
    }
    let mut proof = Vec::with_capacity(proof_len as usize);
    for _ in 0..proof_len {
        proof.push(cursor.read_b256()?);
    }

    let hook = if cursor.read_flag()? {
        let position = cursor.position();
        let hook = cursor.read_address()?;
        // The leaf encodes a zero hook the same way as no hook.
        if hook.is_zero() {
            return Err(DecodeError::ZeroHook { position });
        }
        Some(hook)
    } else {
        None
    };
    let value = if cursor.read_flag()? {
        cursor.read_u256()?
    } else {
        Default::default()
    };

    Ok(Operation {
        target,
        payload,
        clipboards,
        read_only,
        callback,
        pinned_offsets,
        pinned_values,
        proof,
        hook,
        value,
    })
}
