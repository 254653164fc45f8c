//! Off-chain tooling for operator vault batches: wire encoding, allow-list trees and mocks.

pub mod encoder;
pub mod mocks;
pub mod tree;

#[cfg(test)]
mod tests;

pub use encoder::{encode_batch, encode_callback_region, encode_operation, EncodeError};
pub use tree::AllowListTree;
