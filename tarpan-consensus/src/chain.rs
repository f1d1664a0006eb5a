//! The request/response protocol for the chain state service.
//!
//! The verifiers are generic over a [`tower::Service`] speaking this
//! protocol. The distinguished "not found" and "unspent" replies are
//! `None`s inside [`Response`] variants, so they are always distinguishable
//! from transport errors, which surface as the service's error type.
//!
//! [`Request::TransactionHeight`] is the one exception: the index lookup
//! is a two-outcome contract, and its callers treat a failed lookup the
//! same way as a `None` reply.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use tarpan_chain::{
    block::Height,
    transaction::{self, Transaction},
    transparent,
    work::difficulty::CompactDifficulty,
};

/// A query about the current best chain.
///
/// Verifiers never mutate the chain; installing verified objects is the
/// caller's responsibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// Returns [`Response::Tip`] with the height of the best chain tip, or
    /// `None` if the chain is empty.
    Tip,

    /// Looks up a transaction by hash in the best chain.
    ///
    /// Returns [`Response::Transaction`], with `None` if the transaction is
    /// not in the best chain.
    Transaction(transaction::Hash),

    /// Looks up the height of the block containing a transaction.
    ///
    /// Returns [`Response::TransactionHeight`], with `None` if the
    /// transaction is not in the best chain. This lookup carries no
    /// distinguished "not found" sentinel: the transaction verifier treats
    /// `None` and a failed lookup identically, falling back to the pool
    /// snapshot for the parent.
    TransactionHeight(transaction::Hash),

    /// Looks up a transaction and the height of its containing block.
    ///
    /// Returns [`Response::MinedTransaction`], with `None` if the
    /// transaction is not in the best chain.
    MinedTransaction(transaction::Hash),

    /// Looks up the spend record for an output.
    ///
    /// Returns [`Response::Spend`], with `None` if the output is unspent.
    /// `None` is the expected reply during transaction verification; any
    /// spend record means a double spend.
    Spend(transparent::OutPoint),

    /// Queries whether an output is spent.
    ///
    /// `exclude` identifies an input of the block currently being
    /// connected, so the store can disregard the spend recorded by that
    /// very input: a transaction in a block may spend an output of an
    /// earlier transaction in the same block.
    ///
    /// Returns [`Response::OutputSpent`].
    OutputSpent {
        /// The output being queried.
        outpoint: transparent::OutPoint,
        /// The in-block spend to disregard, if any.
        exclude: Option<BlockPosition>,
    },

    /// Looks up the difficulty threshold of the block at a height.
    ///
    /// Returns [`Response::Difficulty`].
    Difficulty(Height),

    /// Measures the time elapsed over the last `interval` blocks below
    /// `height`, for difficulty retargeting.
    ///
    /// Returns [`Response::ActualTimespan`].
    ActualTimespan {
        /// The height being retargeted.
        height: Height,
        /// The number of blocks to measure over.
        interval: u32,
    },

    /// Computes the median of the timestamps of the blocks preceding
    /// `height`.
    ///
    /// Returns [`Response::MedianTimePast`].
    MedianTimePast(Height),
}

/// A response to a chain state [`Request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// The height of the best chain tip.
    Tip(Option<Height>),

    /// The requested transaction.
    Transaction(Option<Arc<Transaction>>),

    /// The height of the block containing the requested transaction.
    TransactionHeight(Option<Height>),

    /// The requested transaction, and the height it was mined at.
    MinedTransaction(Option<MinedTx>),

    /// The spend record for the requested output, or `None` if it is
    /// unspent.
    Spend(Option<Spend>),

    /// Whether the requested output is spent.
    OutputSpent(bool),

    /// The difficulty threshold of the requested block.
    Difficulty(CompactDifficulty),

    /// The time elapsed over the requested interval.
    ActualTimespan(Duration),

    /// The median time past of the requested height.
    MedianTimePast(DateTime<Utc>),
}

/// A transaction in the best chain, and the height it was mined at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinedTx {
    /// The transaction.
    pub tx: Arc<Transaction>,

    /// The height of the block containing the transaction.
    pub height: Height,
}

/// The input that spends an output, as recorded in the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spend {
    /// The transaction containing the spending input.
    pub by_transaction: transaction::Hash,

    /// The index of the spending input in that transaction.
    pub input_index: u32,
}

/// The position of an input within the block being connected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockPosition {
    /// The index of the transaction in the block.
    pub transaction_index: usize,

    /// The index of the input in that transaction.
    pub input_index: usize,
}
