//! Shared types for operations, descriptors, wire constants and collaborator interfaces.
//!
//! Everything here is consumed by both the execution engine and the off-chain encoder, so the
//! byte layouts defined in this crate are the single source of truth for the batch wire format
//! and the allow-list leaf format.

#![no_std]

extern crate alloc;

pub mod descriptor;
pub mod interfaces;
pub mod operation;
pub mod wire;

pub use descriptor::Descriptor;
pub use interfaces::{OracleError, PriceOracle, SubmitterAllowList};
pub use operation::{
    CallbackAllowance, Clipboard, Operation, PinnedOffsets, ReturnMode, Selector, TooManyOffsets,
};
