//! The block header.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::work::difficulty::CompactDifficulty;

use super::{merkle, Hash};

/// A block header, containing metadata about a block.
///
/// How are blocks chained together? They are chained together via the
/// backwards reference (previous header hash) present in the block header.
/// Each block points backwards to its parent, all the way back to the
/// genesis block (the first block in the blockchain).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// The block's version field.
    pub version: u32,

    /// The hash of the previous block, used to create a chain of blocks
    /// back to the genesis block.
    ///
    /// This ensures no previous block can be changed without also changing
    /// this block's header.
    pub previous_block_hash: Hash,

    /// The root of the transaction Merkle tree, binding the block header to
    /// the transactions in the block.
    ///
    /// Note that because of a flaw in Bitcoin's design, the `merkle_root`
    /// does not always precisely bind the contents of the block
    /// (CVE-2012-2459). It is sometimes possible for an attacker to create
    /// multiple distinct sets of transactions with the same Merkle root,
    /// although only one set will be valid.
    pub merkle_root: merkle::Root,

    /// The block timestamp is a Unix epoch time (UTC) when the miner
    /// started hashing the header (according to the miner).
    pub time: DateTime<Utc>,

    /// An encoded version of the target threshold this block's header
    /// hash must be less than or equal to, in the nBits format.
    pub difficulty_threshold: CompactDifficulty,

    /// An arbitrary field that miners can change to modify the header
    /// hash in order to produce a hash less than or equal to the
    /// target threshold.
    pub nonce: u32,
}

/// An error in the header timestamp, against the validating node's clock.
#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum BlockTimeError {
    #[error("invalid time {0:?} in block header {1:?}: block time is more than 2 hours in the future ({2:?}). Hint: check your machine's date, time, and time zone.")]
    InvalidBlockTime(DateTime<Utc>, Hash, DateTime<Utc>),
}

impl Header {
    /// Check if `self.time` is less than or equal to 2 hours in the future,
    /// according to the node's local clock (`now`).
    ///
    /// This is a non-deterministic rule, as clocks vary over time, and
    /// between different nodes. A block that is rejected by this rule at a
    /// given point in time may later be accepted.
    pub fn time_is_valid_at(&self, now: DateTime<Utc>) -> Result<(), BlockTimeError> {
        let two_hours_in_the_future = now
            .checked_add_signed(Duration::hours(2))
            .expect("calculating 2 hours in the future does not overflow");

        if self.time <= two_hours_in_the_future {
            Ok(())
        } else {
            Err(BlockTimeError::InvalidBlockTime(
                self.time,
                self.hash(),
                two_hours_in_the_future,
            ))
        }
    }

    /// Compute the hash of this header.
    pub fn hash(&self) -> Hash {
        Hash::from(self)
    }
}
