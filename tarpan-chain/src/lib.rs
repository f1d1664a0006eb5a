//! Core Bitcoin data structures. 🐴
//!
//! This crate provides definitions of the core datastructures for Bitcoin
//! consensus validation: blocks, transactions, transparent transfers,
//! satoshi amounts, and proof-of-work difficulty.

#[macro_use]
extern crate serde;

pub mod amount;
pub mod block;
pub mod serialization;
pub mod transaction;
pub mod transparent;
pub mod work;

#[cfg(any(test, feature = "test-vectors"))]
pub mod test_vectors;
