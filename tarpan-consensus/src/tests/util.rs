//! A scripted chain state service and stub script engines.

use std::{
    collections::{HashMap, HashSet},
    convert::TryInto,
    sync::Arc,
    task::{Context, Poll},
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::future::{self, Ready};
use tower::Service;

use tarpan_chain::{
    block::Height,
    transaction::{self, LockTime, Transaction},
    transparent::{Input, OutPoint, Output, Script},
    work::difficulty::CompactDifficulty,
};

use crate::{chain, script, BoxError};

/// A chain state service that answers from hash maps.
///
/// Queries for data the test did not configure panic, so tests only
/// exercise the lookups they mean to.
#[derive(Clone, Debug, Default)]
pub(crate) struct MockChain {
    pub tip: Option<Height>,
    pub transactions: HashMap<transaction::Hash, Arc<Transaction>>,
    pub heights: HashMap<transaction::Hash, Height>,
    pub spends: HashMap<OutPoint, chain::Spend>,
    pub spent_outputs: HashSet<OutPoint>,
    /// Outputs whose only spend is an input of the block currently being
    /// connected: reported spent, unless the query excludes that input.
    pub spent_by_current_block: HashSet<OutPoint>,
    pub difficulty: Option<CompactDifficulty>,
    pub actual_timespan: Option<Duration>,
    pub median_time_past: Option<DateTime<Utc>>,
}

impl MockChain {
    /// A chain with a tip at `height` and a median time in the distant
    /// past.
    pub fn with_tip(height: Height) -> MockChain {
        MockChain {
            tip: Some(height),
            median_time_past: Some(Utc.timestamp_opt(0, 0).unwrap()),
            ..MockChain::default()
        }
    }

    /// Record `transaction` as mined at `height`.
    pub fn insert_mined(&mut self, transaction: Arc<Transaction>, height: Height) {
        let hash = transaction.hash();
        self.transactions.insert(hash, transaction);
        self.heights.insert(hash, height);
    }
}

impl Service<chain::Request> for MockChain {
    type Response = chain::Response;
    type Error = BoxError;
    type Future = Ready<Result<chain::Response, BoxError>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: chain::Request) -> Self::Future {
        let response = match request {
            chain::Request::Tip => chain::Response::Tip(self.tip),
            chain::Request::Transaction(hash) => {
                chain::Response::Transaction(self.transactions.get(&hash).cloned())
            }
            chain::Request::TransactionHeight(hash) => {
                chain::Response::TransactionHeight(self.heights.get(&hash).copied())
            }
            chain::Request::MinedTransaction(hash) => chain::Response::MinedTransaction(
                match (self.transactions.get(&hash), self.heights.get(&hash)) {
                    (Some(tx), Some(height)) => Some(chain::MinedTx {
                        tx: tx.clone(),
                        height: *height,
                    }),
                    _ => None,
                },
            ),
            chain::Request::Spend(outpoint) => {
                chain::Response::Spend(self.spends.get(&outpoint).cloned())
            }
            chain::Request::OutputSpent { outpoint, exclude } => {
                let spent = self.spent_outputs.contains(&outpoint)
                    || (exclude.is_none() && self.spent_by_current_block.contains(&outpoint));
                chain::Response::OutputSpent(spent)
            }
            chain::Request::Difficulty(_) => chain::Response::Difficulty(
                self.difficulty
                    .expect("test queried difficulty without configuring it"),
            ),
            chain::Request::ActualTimespan { .. } => chain::Response::ActualTimespan(
                self.actual_timespan
                    .expect("test queried the timespan without configuring it"),
            ),
            chain::Request::MedianTimePast(_) => chain::Response::MedianTimePast(
                self.median_time_past
                    .expect("test queried the median time without configuring it"),
            ),
        };

        future::ready(Ok(response))
    }
}

/// A chain whose transaction-index lookups fail, while every other
/// request is answered by the wrapped [`MockChain`].
#[derive(Clone, Debug, Default)]
pub(crate) struct FailingIndexChain(pub MockChain);

impl Service<chain::Request> for FailingIndexChain {
    type Response = chain::Response;
    type Error = BoxError;
    type Future = Ready<Result<chain::Response, BoxError>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: chain::Request) -> Self::Future {
        match request {
            chain::Request::TransactionHeight(_) => {
                future::ready(Err("the transaction index is unavailable".into()))
            }
            request => self.0.call(request),
        }
    }
}

/// A service that fails every request, for exercising infrastructure
/// error pass-through.
#[derive(Clone, Debug, Default)]
pub(crate) struct FailingChain;

impl Service<chain::Request> for FailingChain {
    type Response = chain::Response;
    type Error = BoxError;
    type Future = Ready<Result<chain::Response, BoxError>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _request: chain::Request) -> Self::Future {
        future::ready(Err("the service is stopped".into()))
    }
}

/// A script engine that accepts every script.
pub(crate) struct AcceptingEngine;

impl script::Engine for AcceptingEngine {
    fn verify(&self, _: &Script, _: &Transaction, _: usize, _: bool) -> bool {
        true
    }
}

/// A script engine that rejects every script.
pub(crate) struct RejectingEngine;

impl script::Engine for RejectingEngine {
    fn verify(&self, _: &Script, _: &Transaction, _: usize, _: bool) -> bool {
        false
    }
}

/// An input spending `index` of `previous`, with a final sequence.
pub(crate) fn spend_of(previous: &Transaction, index: u32) -> Input {
    Input {
        previous_output: OutPoint {
            hash: previous.hash(),
            index,
        },
        unlock_script: Script::new(&[0x51]),
        sequence: Input::FINAL_SEQUENCE,
    }
}

/// An output worth `value` satoshis.
pub(crate) fn output(value: i64) -> Output {
    Output {
        value: value.try_into().expect("test amounts are valid"),
        lock_script: Script::new(&[0x51]),
    }
}

/// A coinbase transaction minting `value` satoshis.
pub(crate) fn coinbase(value: i64) -> Transaction {
    coinbase_with_tag(value, 0)
}

/// A coinbase transaction minting `value` satoshis, with `tag` baked into
/// its input script so equal-value coinbases get distinct hashes.
pub(crate) fn coinbase_with_tag(value: i64, tag: u8) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![Input {
            previous_output: OutPoint::NULL,
            unlock_script: Script::new(&[0x02, tag, 0x03]),
            sequence: Input::FINAL_SEQUENCE,
        }],
        outputs: vec![output(value)],
        lock_time: LockTime::unlocked(),
    }
}

/// A transaction spending output `index` of `previous` into a single
/// output worth `value`.
pub(crate) fn transfer(previous: &Transaction, index: u32, value: i64) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![spend_of(previous, index)],
        outputs: vec![output(value)],
        lock_time: LockTime::unlocked(),
    }
}
