//! Transactions and transaction-related structures.

mod hash;
mod lock_time;
mod serialize;

pub use hash::Hash;
pub use lock_time::LockTime;

use chrono::{DateTime, Utc};

use crate::{
    amount::{self, Amount, NonNegative},
    block::Height,
    transparent,
};

/// A Bitcoin transaction: a transfer of value from previous transaction
/// outputs to newly created outputs.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction version number.
    pub version: u32,
    /// The inputs spending previous outputs.
    pub inputs: Vec<transparent::Input>,
    /// The newly created outputs.
    pub outputs: Vec<transparent::Output>,
    /// The earliest time or block height that this transaction can be added
    /// to the chain.
    pub lock_time: LockTime,
}

impl Transaction {
    /// Compute the hash of this transaction.
    pub fn hash(&self) -> Hash {
        Hash::from(self)
    }

    /// Returns true if this is a coinbase transaction: a single input whose
    /// previous output is the null reference.
    ///
    /// Coinbase transactions mint the block reward and may only appear at
    /// index 0 of a block.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_output.is_null()
    }

    /// Returns true if this transaction is final at `height` and
    /// `block_time`, so it may be included in a block at that position.
    ///
    /// A transaction is final once its lock time has passed, or when every
    /// input carries the final sequence number and has therefore opted out
    /// of lock-time enforcement.
    pub fn is_final(&self, height: Height, block_time: DateTime<Utc>) -> bool {
        let lock_time_passed = match self.lock_time {
            LockTime::Height(h) => h == Height(0) || h < height,
            LockTime::Time(t) => t < block_time,
        };

        lock_time_passed || self.inputs.iter().all(transparent::Input::is_final)
    }

    /// The total value of this transaction's outputs, as a checked sum.
    ///
    /// Returns an error if any intermediate sum exceeds [`MAX_MONEY`].
    ///
    /// [`MAX_MONEY`]: crate::amount::MAX_MONEY
    pub fn output_value_total(&self) -> Result<Amount<NonNegative>, amount::Error> {
        self.outputs.iter().map(|output| output.value).sum()
    }
}
