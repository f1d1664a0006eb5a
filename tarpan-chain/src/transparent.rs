//! Transparent value transfers: outpoints, inputs, outputs, and scripts.

mod opcodes;
mod script;
mod serialize;

pub use opcodes::OpCode;
pub use script::{Operation, Script};

use crate::{
    amount::{Amount, NonNegative},
    transaction,
};

/// The maturity threshold for coinbase outputs.
///
/// A transaction MUST NOT spend an output of a coinbase transaction from a
/// block less than 100 blocks prior to the spend.
pub const MIN_COINBASE_MATURITY: u32 = 100;

/// OutPoint
///
/// A particular transaction output reference.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub struct OutPoint {
    /// References the transaction that contains the output being spent.
    pub hash: transaction::Hash,

    /// Identifies which output from that transaction is referenced; the
    /// first output is 0, etc.
    pub index: u32,
}

impl OutPoint {
    /// The null outpoint, used as the previous output of coinbase inputs.
    pub const NULL: OutPoint = OutPoint {
        hash: transaction::Hash([0; 32]),
        index: u32::MAX,
    };

    /// Returns true if this outpoint is the distinguished null reference.
    ///
    /// Only coinbase inputs may carry a null previous output.
    pub fn is_null(&self) -> bool {
        *self == OutPoint::NULL
    }
}

/// A transparent input to a transaction.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Input {
    /// The previous output being spent.
    ///
    /// The input of a coinbase transaction references the null outpoint.
    pub previous_output: OutPoint,

    /// The script that authorizes spending `previous_output`.
    pub unlock_script: Script,

    /// The sequence number for the input.
    pub sequence: u32,
}

impl Input {
    /// The sequence number that marks an input as final.
    pub const FINAL_SEQUENCE: u32 = u32::MAX;

    /// Returns true if this input opts out of lock-time enforcement.
    pub fn is_final(&self) -> bool {
        self.sequence == Input::FINAL_SEQUENCE
    }
}

/// A transparent output from a transaction.
///
/// The most fundamental building block of a transaction is a transaction
/// output -- the coins you own are in fact a subset of the unspent
/// transaction outputs (or "UTXO"s) of the global UTXO set.
///
/// UTXOs are indivisible, discrete units of value which can only be consumed
/// in their entirety. Thus, if I want to send you 1 BTC and I only own one
/// UTXO worth 2 BTC, I would construct a transaction that spends my UTXO and
/// sends 1 BTC to you and 1 BTC back to me (just like receiving change).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Hash)]
pub struct Output {
    /// Transaction value.
    pub value: Amount<NonNegative>,

    /// The lock script defines the conditions under which this output can be
    /// spent.
    pub lock_script: Script,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_outpoint_is_distinguished() {
        assert!(OutPoint::NULL.is_null());

        let outpoint = OutPoint {
            hash: transaction::Hash([0; 32]),
            index: 0,
        };
        assert!(!outpoint.is_null(), "a zero index is a real reference");

        let outpoint = OutPoint {
            hash: transaction::Hash([1; 32]),
            index: u32::MAX,
        };
        assert!(!outpoint.is_null(), "a non-zero hash is a real reference");
    }
}
