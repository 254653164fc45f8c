//! Decode limits and vault construction parameters.

use alloy_primitives::{Address, B256};

const MAX_OPERATIONS_DEFAULT: u8 = u8::MAX;
const MAX_CLIPBOARDS_DEFAULT: u8 = 32;
const MAX_PROOF_LEN_DEFAULT: u8 = 32;

/// Bounds enforced while decoding a batch, before anything is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecodeLimits {
    pub max_operations: u8,
    pub max_clipboards: u8,
    /// A proof of 32 nodes covers an allow-list of 2^32 descriptors.
    pub max_proof_len: u8,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_operations: MAX_OPERATIONS_DEFAULT,
            max_clipboards: MAX_CLIPBOARDS_DEFAULT,
            max_proof_len: MAX_PROOF_LEN_DEFAULT,
        }
    }
}

/// Everything needed to stand up a [`Vault`](crate::vault::Vault).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VaultConfig {
    /// Address the vault acts as when it calls out.
    pub address: Address,
    pub owner: Address,
    /// Initial authorization root. The zero root authorizes nothing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub root: B256,
    #[cfg_attr(feature = "serde", serde(default))]
    pub limits: DecodeLimits,
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn limits_default_when_omitted() {
        let config: VaultConfig = serde_json::from_str(
            r#"{
                "address": "0x00000000000000000000000000000000000000aa",
                "owner": "0x00000000000000000000000000000000000000bb"
            }"#,
        )
        .unwrap();
        assert_eq!(config.root, B256::ZERO);
        assert_eq!(config.limits, DecodeLimits::default());
    }

    #[test]
    fn partial_limits_fill_in_defaults() {
        let limits: DecodeLimits = serde_json::from_str(r#"{ "max_proof_len": 8 }"#).unwrap();
        assert_eq!(limits.max_proof_len, 8);
        assert_eq!(limits.max_clipboards, MAX_CLIPBOARDS_DEFAULT);
    }
}
