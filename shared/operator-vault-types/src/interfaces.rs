use alloy_primitives::{Address, U256};

/// Errors while pricing through an oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OracleError {
    /// Used by off-chain mocks or partially implemented oracles.
    NotImplemented,
    /// No price feed for the requested pair.
    UnsupportedPair { base: Address, quote: Address },
    /// The underlying lookup failed.
    LookupFailed,
}

/// Decides who may submit batches to a vault.
pub trait SubmitterAllowList {
    fn is_allowed_submitter(&self, submitter: Address) -> bool;
}

/// Price oracle consulted by hook implementations. The engine itself never prices anything.
pub trait PriceOracle {
    /// Value of `amount` units of `base` expressed in `quote` units.
    fn quote(&self, _amount: U256, _base: Address, _quote: Address) -> Result<U256, OracleError> {
        Err(OracleError::NotImplemented)
    }
}
