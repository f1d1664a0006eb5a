//! Transaction verification for the memory pool.
//!
//! Verification occurs in multiple phases:
//!   - context-free structural checks (CPU-bound)
//!   - duplicate and conflict checks against the pool snapshot and the
//!     chain state
//!   - per-input connection to previous outputs, with script execution and
//!     coinbase maturity checks (depends on the chain state)
//!
//! Verification is provided via a `tower::Service`, to support backpressure
//! and concurrent verification. The phases of one request run strictly in
//! order; only the spending checks of distinct requests interleave.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::FutureExt;
use tower::{Service, ServiceExt};
use tracing::Instrument;

use tarpan_chain::{
    amount::{Amount, NonNegative},
    block::Height,
    transaction::{self, Transaction},
    transparent::MIN_COINBASE_MATURITY,
};

use crate::{
    chain,
    error::{TransactionError, VerifyTransactionError},
    mempool, script, BoxError,
};

pub(crate) mod check;


/// A service that verifies loose transactions for admission into the
/// memory pool.
pub struct Verifier<ZS> {
    /// The underlying chain state service, possibly wrapped in other
    /// services.
    state: ZS,

    /// The script interpreter consulted for every spent output.
    script_engine: Arc<dyn script::Engine>,
}

impl<ZS> Verifier<ZS>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>
        + Send
        + Clone
        + 'static,
    ZS::Future: Send + 'static,
{
    /// Create a transaction verifier over `state`, running scripts on
    /// `script_engine`.
    pub fn new(state: ZS, script_engine: Arc<dyn script::Engine>) -> Self {
        Self {
            state,
            script_engine,
        }
    }
}

/// A transaction verification request.
#[derive(Clone, Debug)]
pub struct Request {
    /// The candidate transaction.
    pub transaction: Arc<Transaction>,

    /// A snapshot of the pending transactions in the pool, taken at a
    /// consistent instant.
    pub pool: mempool::Snapshot,
}

/// The verifier's reply for an admissible transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// The hash of the verified transaction.
    pub hash: transaction::Hash,

    /// The indices of inputs whose previous outputs are unconfirmed: their
    /// parent transactions are still in the pool, not the chain.
    ///
    /// The caller should only install the transaction once its unconfirmed
    /// parents confirm.
    pub unconfirmed_inputs: Vec<usize>,
}

impl<ZS> Service<Request> for Verifier<ZS>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>
        + Send
        + Clone
        + 'static,
    ZS::Future: Send + 'static,
{
    type Response = Response;
    type Error = VerifyTransactionError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // We use the state for lookups, and we expect those queries to be
        // fast. So we don't need to call `state.poll_ready()` here.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mut state = self.state.clone();
        let script_engine = self.script_engine.clone();
        let Request { transaction: tx, pool } = req;

        let hash = tx.hash();
        let span = tracing::debug_span!("transaction::Verifier::call", ?hash);

        async move {
            tracing::trace!(?tx);

            // Context-free checks first, so obviously malformed
            // transactions never touch the state.
            check::transaction(&tx)?;

            // Loose coinbases mint money out of thin air; they are only
            // meaningful at index 0 of a block.
            if tx.is_coinbase() {
                Err(TransactionError::Coinbase)?;
            }

            check::is_standard(&tx)?;

            if pool.contains(&hash) {
                Err(TransactionError::Duplicate)?;
            }

            // Check for duplicates in the chain.
            match query(&mut state, chain::Request::Transaction(hash)).await? {
                chain::Response::Transaction(Some(_)) => Err(TransactionError::Duplicate)?,
                chain::Response::Transaction(None) => {}
                _ => unreachable!("wrong response to Request::Transaction"),
            }

            // Check for conflicts with pool transactions.
            for input in &tx.inputs {
                if pool.spends(&input.previous_output) {
                    Err(TransactionError::DoubleSpend)?;
                }
            }

            // Used for checking coinbase maturity.
            let tip_height = match query(&mut state, chain::Request::Tip).await? {
                chain::Response::Tip(Some(height)) => height,
                chain::Response::Tip(None) => {
                    return Err(VerifyTransactionError::Chain("the chain is empty".into()))
                }
                _ => unreachable!("wrong response to Request::Tip"),
            };

            let mut unconfirmed_inputs = Vec::new();
            let mut value_in = Amount::zero();

            // Connect each input in order; input i+1 starts only after the
            // spend check for input i completed, so `value_in` is monotone
            // and conflict detection sees a consistent view.
            for (index, input) in tx.inputs.iter().enumerate() {
                let previous_hash = input.previous_output.hash;

                let parent = match query(
                    &mut state,
                    chain::Request::TransactionHeight(previous_hash),
                )
                .await
                {
                    Ok(chain::Response::TransactionHeight(Some(parent_height))) => {
                        // Now fetch the actual transaction body.
                        match query(&mut state, chain::Request::Transaction(previous_hash))
                            .await?
                        {
                            chain::Response::Transaction(Some(previous_tx)) => {
                                Some((previous_tx, parent_height))
                            }
                            chain::Response::Transaction(None) => None,
                            _ => unreachable!("wrong response to Request::Transaction"),
                        }
                    }
                    // The index lookup has no distinguished "not found"
                    // reply: a parent missing from the best chain and a
                    // failed lookup both land here, and either way the
                    // parent may still be waiting in the pool.
                    // Pool transactions can never be coinbases, so the
                    // parent height is irrelevant here.
                    Ok(chain::Response::TransactionHeight(None)) | Err(_) => {
                        pool.transaction(&previous_hash).map(|previous_tx| {
                            unconfirmed_inputs.push(index);
                            (previous_tx.clone(), Height(0))
                        })
                    }
                    Ok(_) => unreachable!("wrong response to Request::TransactionHeight"),
                };

                let (previous_tx, parent_height) =
                    parent.ok_or(TransactionError::InputNotFound { index })?;

                value_in = connect_input(
                    script_engine.as_ref(),
                    &tx,
                    index,
                    &previous_tx,
                    parent_height,
                    tip_height,
                    value_in,
                )?;

                // Search for double spends in the chain.
                match query(&mut state, chain::Request::Spend(input.previous_output)).await? {
                    chain::Response::Spend(None) => {}
                    chain::Response::Spend(Some(_)) => Err(TransactionError::DoubleSpend)?,
                    _ => unreachable!("wrong response to Request::Spend"),
                }
            }

            // The fee is computed here but only enforced during block
            // connection, when a block claims the fees in its coinbase.
            let _fees = check::tally_fees(&tx, value_in, Amount::zero());

            tracing::trace!(unconfirmed = unconfirmed_inputs.len(), "verified transaction");

            Ok(Response {
                hash,
                unconfirmed_inputs,
            })
        }
        .instrument(span)
        .boxed()
    }
}

/// Drive one chain state request to completion, passing transport errors
/// through unchanged.
async fn query<ZS>(
    state: &mut ZS,
    request: chain::Request,
) -> Result<chain::Response, VerifyTransactionError>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>,
{
    state
        .ready()
        .await
        .map_err(VerifyTransactionError::Chain)?
        .call(request)
        .await
        .map_err(VerifyTransactionError::Chain)
}

/// Connect one input of `tx` to the output it spends.
///
/// Checks the outpoint bounds, coinbase maturity against the chain tip,
/// and the unlock script (with pay-to-script-hash evaluation off for loose
/// transactions), then accumulates the spent value into `value_in`.
fn connect_input(
    script_engine: &dyn script::Engine,
    tx: &Transaction,
    input_index: usize,
    previous_tx: &Transaction,
    parent_height: Height,
    tip_height: Height,
    value_in: Amount<NonNegative>,
) -> Result<Amount<NonNegative>, TransactionError> {
    let input = &tx.inputs[input_index];
    let previous_output = input.previous_output;

    let previous_out = previous_tx
        .outputs
        .get(previous_output.index as usize)
        .ok_or(TransactionError::ValidateInputsFailed)?;

    // The output value range is enforced by `Amount` itself.

    if previous_tx.is_coinbase() {
        let depth_difference = tip_height - parent_height;
        if depth_difference < MIN_COINBASE_MATURITY as i32 {
            return Err(TransactionError::ValidateInputsFailed);
        }
    }

    if !script_engine.verify(&previous_out.lock_script, tx, input_index, false) {
        return Err(TransactionError::ValidateInputsFailed);
    }

    (value_in + previous_out.value).map_err(|_| TransactionError::ValidateInputsFailed)
}
