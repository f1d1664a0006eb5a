//! Blocks and block-related structures (heights, headers, etc.)

mod hash;
mod header;
mod height;
mod serialize;

pub mod merkle;

use std::{fmt, sync::Arc};

use crate::transaction::Transaction;

pub use hash::Hash;
pub use header::{BlockTimeError, Header};
pub use height::Height;

/// A Bitcoin block, containing a header and a list of transactions.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// The block header, containing block metadata.
    pub header: Header,
    /// The block transactions.
    ///
    /// The first transaction of a valid block is its coinbase.
    pub transactions: Vec<Arc<Transaction>>,
}

impl Block {
    /// Compute the hash of this block.
    pub fn hash(&self) -> Hash {
        Hash::from(self)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("hash", &self.hash())
            .field("transactions", &self.transactions.len())
            .finish()
    }
}

impl<'a> From<&'a Block> for Hash {
    fn from(block: &'a Block) -> Hash {
        (&block.header).into()
    }
}
