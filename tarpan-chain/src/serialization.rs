//! Consensus-critical serialization.
//!
//! This module contains two traits: `SatoshiSerialize` and
//! `SatoshiDeserialize`, analogs of the Serde `Serialize` and `Deserialize`
//! traits but intended for the consensus-critical Bitcoin wire format, and
//! `ReadSatoshiExt` and `WriteSatoshiExt`, extension traits for `io::Read`
//! and `io::Write` with utility functions for reading and writing data
//! (e.g., the Bitcoin variable-integer format).

mod error;
mod read_satoshi;
mod satoshi_deserialize;
mod satoshi_serialize;
mod write_satoshi;

pub mod sha256d;

pub use error::SerializationError;
pub use read_satoshi::ReadSatoshiExt;
pub use satoshi_deserialize::SatoshiDeserialize;
pub use satoshi_serialize::SatoshiSerialize;
pub use write_satoshi::WriteSatoshiExt;

#[cfg(test)]
mod tests;
