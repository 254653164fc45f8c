//! JSON manifests accepted by the CLI and their conversion into engine types.

use std::{fs, path::Path};

use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use anyhow::{anyhow, Context, Result};
use operator_vault_types::{CallbackAllowance, Clipboard, Descriptor, Operation, PinnedOffsets};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed parsing JSON in {}", path.display()))
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CallbackSpec {
    pub caller: Address,
    pub selector: FixedBytes<4>,
    pub user_data_offset: u16,
}

impl From<&CallbackSpec> for CallbackAllowance {
    fn from(spec: &CallbackSpec) -> Self {
        CallbackAllowance {
            caller: spec.caller,
            selector: spec.selector.0,
            user_data_offset: spec.user_data_offset,
        }
    }
}

impl From<&CallbackAllowance> for CallbackSpec {
    fn from(allowance: &CallbackAllowance) -> Self {
        CallbackSpec {
            caller: allowance.caller,
            selector: FixedBytes(allowance.selector),
            user_data_offset: allowance.user_data_offset,
        }
    }
}

/// One allow-list entry.
#[derive(Clone, Debug, Deserialize)]
pub struct DescriptorSpec {
    pub target: Address,
    pub selector: FixedBytes<4>,
    #[serde(default)]
    pub allows_value: bool,
    #[serde(default)]
    pub pinned_offsets: Vec<u16>,
    #[serde(default)]
    pub pinned_values: Vec<B256>,
    pub hook: Option<Address>,
    pub callback: Option<CallbackSpec>,
}

impl DescriptorSpec {
    pub fn to_descriptor(&self) -> Result<Descriptor> {
        let pinned_offsets = pinned_offsets(&self.pinned_offsets, &self.pinned_values)?;
        Ok(Descriptor {
            target: self.target,
            selector: self.selector.0,
            allows_value: self.allows_value,
            pinned_offsets,
            hook: self.hook,
            callback: self.callback.as_ref().map(CallbackAllowance::from),
            pinned_values: self.pinned_values.iter().flat_map(|v| v.0).collect(),
        })
    }
}

/// One operation of a batch to encode.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OperationSpec {
    pub target: Address,
    pub payload: Bytes,
    #[serde(default)]
    pub clipboards: Vec<Clipboard>,
    #[serde(default)]
    pub read_only: bool,
    pub callback: Option<CallbackSpec>,
    #[serde(default)]
    pub pinned_offsets: Vec<u16>,
    #[serde(default)]
    pub pinned_values: Vec<B256>,
    /// Left empty to have the proof filled in from a descriptor manifest.
    #[serde(default)]
    pub proof: Vec<B256>,
    pub hook: Option<Address>,
    #[serde(default)]
    pub value: U256,
}

impl OperationSpec {
    pub fn to_operation(&self) -> Result<Operation> {
        Ok(Operation {
            target: self.target,
            payload: self.payload.to_vec(),
            clipboards: self.clipboards.clone(),
            read_only: self.read_only,
            callback: self.callback.as_ref().map(CallbackAllowance::from),
            pinned_offsets: pinned_offsets(&self.pinned_offsets, &self.pinned_values)?,
            pinned_values: self.pinned_values.iter().flat_map(|v| v.0).collect(),
            proof: self.proof.clone(),
            hook: self.hook,
            value: self.value,
        })
    }

    pub fn from_operation(op: &Operation) -> Self {
        OperationSpec {
            target: op.target,
            payload: Bytes::copy_from_slice(&op.payload),
            clipboards: op.clipboards.clone(),
            read_only: op.read_only,
            callback: op.callback.as_ref().map(CallbackSpec::from),
            pinned_offsets: op.pinned_offsets.as_slice().to_vec(),
            pinned_values: op.pinned_values.chunks(32).map(B256::from_slice).collect(),
            proof: op.proof.clone(),
            hook: op.hook,
            value: op.value,
        }
    }
}

fn pinned_offsets(offsets: &[u16], values: &[B256]) -> Result<PinnedOffsets> {
    if offsets.len() != values.len() {
        return Err(anyhow!(
            "{} pinned offsets but {} pinned values",
            offsets.len(),
            values.len()
        ));
    }
    PinnedOffsets::new(offsets)
        .map_err(|e| anyhow!("{} pinned offsets, at most 15 allowed", e.count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_manifest_parses_with_defaults() {
        let spec: DescriptorSpec = serde_json::from_str(
            r#"{
                "target": "0x1000000000000000000000000000000000000001",
                "selector": "0xa9059cbb",
                "pinned_offsets": [0],
                "pinned_values": ["0x0000000000000000000000002222222222222222222222222222222222222222"]
            }"#,
        )
        .unwrap();
        let d = spec.to_descriptor().unwrap();
        assert_eq!(d.selector, [0xa9, 0x05, 0x9c, 0xbb]);
        assert!(!d.allows_value);
        assert_eq!(d.pinned_values.len(), 32);
        assert!(d.hook.is_none());
    }

    #[test]
    fn mismatched_pins_are_rejected() {
        let spec: OperationSpec = serde_json::from_str(
            r#"{
                "target": "0x1000000000000000000000000000000000000001",
                "payload": "0xa9059cbb",
                "pinned_offsets": [0, 32]
            }"#,
        )
        .unwrap();
        assert!(spec.to_operation().is_err());
    }
}
