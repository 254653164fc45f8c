//! Mock collaborators for off-chain testing.

use std::collections::{BTreeMap, BTreeSet};

use alloy_primitives::{Address, U256};

pub use operator_vault_types::{OracleError, PriceOracle, SubmitterAllowList};

/// Fixed set of allowed submitters.
#[derive(Clone, Debug, Default)]
pub struct StaticAllowList {
    submitters: BTreeSet<Address>,
}

impl StaticAllowList {
    pub fn new(submitters: impl IntoIterator<Item = Address>) -> Self {
        Self { submitters: submitters.into_iter().collect() }
    }

    pub fn allow(&mut self, submitter: Address) {
        self.submitters.insert(submitter);
    }
}

impl SubmitterAllowList for StaticAllowList {
    fn is_allowed_submitter(&self, submitter: Address) -> bool {
        self.submitters.contains(&submitter)
    }
}

/// Oracle answering from a fixed price table. Prices are quote units per base unit,
/// scaled by 1e18.
#[derive(Clone, Debug, Default)]
pub struct MockOracle {
    prices: BTreeMap<(Address, Address), U256>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, base: Address, quote: Address, price: U256) -> Self {
        self.prices.insert((base, quote), price);
        self
    }
}

impl PriceOracle for MockOracle {
    fn quote(&self, amount: U256, base: Address, quote: Address) -> Result<U256, OracleError> {
        let price = self
            .prices
            .get(&(base, quote))
            .ok_or(OracleError::UnsupportedPair { base, quote })?;
        amount
            .checked_mul(*price)
            .map(|v| v / U256::from(10u64).pow(U256::from(18u64)))
            .ok_or(OracleError::LookupFailed)
    }
}
