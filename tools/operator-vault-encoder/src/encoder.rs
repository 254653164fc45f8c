use alloy_primitives::B256;
use operator_vault_types::{Descriptor, Operation, ReturnMode};
use sha3::{Digest, Keccak256};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A length or count that does not fit its wire field.
    #[error("{field} is {len}, the wire format holds at most {max}")]
    TooLong { field: &'static str, len: usize, max: usize },
    #[error("{offsets} pinned offsets need {expected} bytes of pinned values, got {actual}")]
    PinnedValuesLength { offsets: usize, expected: usize, actual: usize },
}

fn width_u8(field: &'static str, len: usize) -> Result<u8, EncodeError> {
    u8::try_from(len).map_err(|_| EncodeError::TooLong { field, len, max: u8::MAX as usize })
}

fn width_u16(field: &'static str, len: usize) -> Result<[u8; 2], EncodeError> {
    u16::try_from(len)
        .map(u16::to_be_bytes)
        .map_err(|_| EncodeError::TooLong { field, len, max: u16::MAX as usize })
}

/// Encode a batch: u8 operation count followed by every operation.
pub fn encode_batch(operations: &[Operation]) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    buf.push(width_u8("operation count", operations.len())?);
    for op in operations {
        encode_operation(op, &mut buf)?;
    }
    Ok(buf)
}

/// Append one operation in wire order. `buf` is left untouched on error.
pub fn encode_operation(op: &Operation, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    let payload_len = width_u16("payload length", op.payload.len())?;
    let clipboard_count = width_u8("clipboard count", op.clipboards.len())?;
    let proof_len = width_u8("proof length", op.proof.len())?;
    let offsets = op.pinned_offsets.as_slice();
    let pinned_count = width_u8("pinned offset count", offsets.len())?;
    if op.pinned_values.len() != offsets.len() * 32 {
        return Err(EncodeError::PinnedValuesLength {
            offsets: offsets.len(),
            expected: offsets.len() * 32,
            actual: op.pinned_values.len(),
        });
    }

    // bytes20 target
    buf.extend_from_slice(op.target.as_slice());

    // u16 payload_len + payload
    buf.extend_from_slice(&payload_len);
    buf.extend_from_slice(&op.payload);

    // u8 clipboard count + (u8 result, u8 word, u16 paste offset)*
    buf.push(clipboard_count);
    for clipboard in &op.clipboards {
        buf.extend_from_slice(&clipboard.to_bytes());
    }

    buf.push(u8::from(op.read_only));

    // flag + 26-byte allowance
    match &op.callback {
        Some(allowance) => {
            buf.push(1);
            buf.extend_from_slice(&allowance.to_bytes());
        }
        None => buf.push(0),
    }

    // u8 count + u16 offsets + 32-byte values
    buf.push(pinned_count);
    for offset in offsets {
        buf.extend_from_slice(&offset.to_be_bytes());
    }
    buf.extend_from_slice(&op.pinned_values);

    // u8 proof_len + nodes
    buf.push(proof_len);
    for node in &op.proof {
        buf.extend_from_slice(node.as_slice());
    }

    match op.hook {
        Some(hook) => {
            buf.push(1);
            buf.extend_from_slice(hook.as_slice());
        }
        None => buf.push(0),
    }

    if op.value.is_zero() {
        buf.push(0);
    } else {
        buf.push(1);
        buf.extend_from_slice(&op.value.to_be_bytes::<32>());
    }
    Ok(())
}

/// Encode a callback user-data region, including its u16 length prefix.
pub fn encode_callback_region(
    return_mode: &ReturnMode,
    operations: &[Operation],
) -> Result<Vec<u8>, EncodeError> {
    let mut body = Vec::new();
    body.push(return_mode.tag());
    if let ReturnMode::Static(data) = return_mode {
        body.extend_from_slice(&width_u16("static return length", data.len())?);
        body.extend_from_slice(data);
    }
    body.extend_from_slice(&encode_batch(operations)?);

    let mut buf = Vec::with_capacity(2 + body.len());
    buf.extend_from_slice(&width_u16("callback region length", body.len())?);
    buf.extend_from_slice(&body);
    Ok(buf)
}

pub(crate) fn keccak256_bytes(bytes: &[u8]) -> B256 {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(out.as_slice());
    B256::from(b)
}

/// Allow-list leaf of `descriptor` (must match the on-chain leaf).
pub fn descriptor_leaf(descriptor: &Descriptor) -> B256 {
    keccak256_bytes(&descriptor.leaf_preimage())
}
