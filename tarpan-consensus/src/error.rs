//! Errors that can occur when checking consensus rules.
//!
//! Each error variant corresponds to a consensus rule, so enumerating
//! all possible verification failures enumerates the consensus rules we
//! implement, and ensures that we don't reject blocks or transactions
//! for a non-enumerated reason.

use thiserror::Error;

use crate::BoxError;

/// A verdict rejecting a single transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction has no inputs or no outputs")]
    Empty,

    #[error("transaction output values exceed the money supply")]
    OutputValueOverflow,

    #[error("coinbase input script size is outside the 2 to 100 byte range")]
    InvalidCoinbaseScriptSize,

    #[error("non-coinbase transaction has a null previous output")]
    PreviousOutputNull,

    #[error("coinbase transactions are only valid inside a block")]
    Coinbase,

    #[error("transaction is not standard")]
    NotStandard,

    #[error("transaction already exists in the pool or the chain")]
    Duplicate,

    #[error("transaction spends an output that another transaction already spends")]
    DoubleSpend,

    #[error("previous transaction for input {index} was not found")]
    InputNotFound {
        /// The index of the input whose parent is missing.
        index: usize,
    },

    #[error("transaction inputs failed to connect to their previous outputs")]
    ValidateInputsFailed,
}

/// A verdict rejecting a block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("block contains an invalid transaction")]
    Transaction(#[from] TransactionError),

    #[error("block exceeds the size limits")]
    SizeLimits,

    #[error("block header hash does not satisfy its difficulty threshold")]
    ProofOfWork,

    #[error("block timestamp is more than two hours in the future")]
    FuturisticTimestamp,

    #[error("first transaction in a block must be a coinbase")]
    FirstNotCoinbase,

    #[error("block contains a coinbase after the first transaction")]
    ExtraCoinbases,

    #[error("block exceeds the signature operation budget")]
    TooManySigOps,

    #[error("block header merkle root does not match its transactions")]
    MerkleMismatch,

    #[error("block difficulty threshold does not match the required work")]
    IncorrectProofOfWork,

    #[error("block timestamp is not past the median time of recent blocks")]
    TimestampTooEarly,

    #[error("block contains a transaction that is not yet final")]
    NonFinalTransaction,

    #[error("block hash does not match a required checkpoint")]
    CheckpointsFailed,

    #[error("block repeats an existing transaction whose outputs are not all spent")]
    DuplicateOrSpent,

    #[error("block transaction inputs failed to connect to their previous outputs")]
    ValidateInputsFailed,

    #[error("block transaction fees are out of range")]
    FeesOutOfRange,

    #[error("coinbase output value exceeds the block subsidy and fees")]
    CoinbaseTooLarge,
}

/// An error from the transaction verifier: either a verdict rejecting the
/// transaction, or an infrastructure failure passed through unchanged.
#[derive(Error, Debug)]
pub enum VerifyTransactionError {
    #[error(transparent)]
    Transaction {
        #[from]
        source: TransactionError,
    },

    #[error("unable to query chain state during transaction verification")]
    Chain(#[source] BoxError),
}

/// An error from the block verifier: either a verdict rejecting the block,
/// or an infrastructure failure passed through unchanged.
#[derive(Error, Debug)]
pub enum VerifyBlockError {
    #[error(transparent)]
    Block {
        #[from]
        source: BlockError,
    },

    #[error("unable to query chain state during block verification")]
    Chain(#[source] BoxError),
}

impl VerifyTransactionError {
    /// Returns true if this error is a verdict rejecting the transaction,
    /// and false if it is an infrastructure failure.
    ///
    /// Verdicts are terminal for the object: retrying the same transaction
    /// yields the same verdict. Infrastructure failures say nothing about
    /// the object's validity.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, VerifyTransactionError::Transaction { .. })
    }
}

impl VerifyBlockError {
    /// Returns true if this error is a verdict rejecting the block, and
    /// false if it is an infrastructure failure.
    ///
    /// Verdicts are terminal for the object: retrying the same block yields
    /// the same verdict. Infrastructure failures say nothing about the
    /// object's validity.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, VerifyBlockError::Block { .. })
    }
}
