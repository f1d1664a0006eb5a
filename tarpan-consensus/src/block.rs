//! Block verification.
//!
//! Verification occurs in three stages, in order:
//!   - context-free checks of the block itself (CPU-bound)
//!   - acceptance checks at the block's chain height: required work,
//!     timestamps, transaction finality, and checkpoints
//!   - connection checks against the spent-output state, running every
//!     transaction's scripts
//!
//! Verification is provided via a `tower::Service`, to support backpressure
//! and concurrent verification. The stages of one request run strictly in
//! order; the per-input loop is sequential, so the value and signature
//! operation totals grow monotonically.

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
    block::{self, Block, Height},
    transparent,
    work::difficulty::{CompactDifficulty, MAX_BITS},
};

use crate::{
    chain,
    checkpoint::CheckpointList,
    error::{BlockError, VerifyBlockError},
    parameters::{
        bip16_switchover_time, BIP16_SWITCHOVER_HEIGHT, BIP30_EXEMPT_HEIGHTS, MAX_BLOCK_SIGOPS,
        RETARGETING_INTERVAL,
    },
    script, BoxError,
};

mod check;
mod difficulty;
mod subsidy;


/// A service that verifies candidate blocks at a chain height.
pub struct Verifier<ZS> {
    /// The underlying chain state service, possibly wrapped in other
    /// services.
    state: ZS,

    /// The script interpreter consulted for every spent output.
    script_engine: Arc<dyn script::Engine>,

    /// The hard-coded checkpoints enforced during acceptance.
    checkpoints: CheckpointList,
}

impl<ZS> Verifier<ZS>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>
        + Send
        + Clone
        + 'static,
    ZS::Future: Send + 'static,
{
    /// Create a block verifier over `state`, running scripts on
    /// `script_engine` and enforcing the main network checkpoints.
    pub fn new(state: ZS, script_engine: Arc<dyn script::Engine>) -> Self {
        Self {
            state,
            script_engine,
            checkpoints: CheckpointList::mainnet().clone(),
        }
    }
}

/// A block verification request.
#[derive(Clone, Debug)]
pub struct Request {
    /// The candidate block.
    pub block: Arc<Block>,

    /// The chain height the block is being verified at: the height of its
    /// parent plus one.
    pub height: Height,
}

impl<ZS> Service<Request> for Verifier<ZS>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>
        + Send
        + Clone
        + 'static,
    ZS::Future: Send + 'static,
{
    type Response = block::Hash;
    type Error = VerifyBlockError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // We use the state for contextual verification, and we expect those
        // queries to be fast. So we don't need to call `state.poll_ready()`
        // here.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let mut state = self.state.clone();
        let script_engine = self.script_engine.clone();
        let checkpoints = self.checkpoints.clone();
        let Request { block, height } = req;

        let hash = block.hash();
        let span = tracing::debug_span!("block::Verifier::call", ?hash, ?height);

        async move {
            // Since errors cause an early exit, do the context-free checks
            // first: they are the cheapest, and they protect the state
            // queries below from structurally invalid blocks.
            check::block(&block)?;

            accept_block(&mut state, &checkpoints, &block, height, hash).await?;
            connect_block(&mut state, script_engine.as_ref(), &block, height).await?;

            tracing::trace!("verified block");
            Ok(hash)
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
) -> Result<chain::Response, VerifyBlockError>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>,
{
    state
        .ready()
        .await
        .map_err(VerifyBlockError::Chain)?
        .call(request)
        .await
        .map_err(VerifyBlockError::Chain)
}

/// The difficulty threshold required of a block at `height`.
///
/// The genesis block carries the easiest allowed target. Off the
/// retargeting boundary, the previous block's bits carry over; on the
/// boundary, the target is adjusted by the time the last interval actually
/// took.
async fn work_required<ZS>(
    state: &mut ZS,
    height: Height,
) -> Result<CompactDifficulty, VerifyBlockError>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>,
{
    if height == Height(0) {
        return Ok(MAX_BITS);
    }

    let previous_height = (height - 1).expect("verified above: height is not zero");
    let previous_bits = match query(state, chain::Request::Difficulty(previous_height)).await? {
        chain::Response::Difficulty(bits) => bits,
        _ => unreachable!("wrong response to Request::Difficulty"),
    };

    if height.0 % RETARGETING_INTERVAL != 0 {
        return Ok(previous_bits);
    }

    let actual_timespan = match query(
        state,
        chain::Request::ActualTimespan {
            height,
            interval: RETARGETING_INTERVAL,
        },
    )
    .await?
    {
        chain::Response::ActualTimespan(actual) => actual,
        _ => unreachable!("wrong response to Request::ActualTimespan"),
    };

    Ok(difficulty::retarget(previous_bits, actual_timespan))
}

/// The acceptance stage: checks that need the chain height and the
/// block's ancestors, but not the spent-output state.
async fn accept_block<ZS>(
    state: &mut ZS,
    checkpoints: &CheckpointList,
    block: &Block,
    height: Height,
    hash: block::Hash,
) -> Result<(), VerifyBlockError>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>,
{
    let required = work_required(state, height).await?;
    if block.header.difficulty_threshold != required {
        Err(BlockError::IncorrectProofOfWork)?;
    }

    let median_time_past = match query(state, chain::Request::MedianTimePast(height)).await? {
        chain::Response::MedianTimePast(time) => time,
        _ => unreachable!("wrong response to Request::MedianTimePast"),
    };
    if block.header.time <= median_time_past {
        Err(BlockError::TimestampTooEarly)?;
    }

    // Transactions must be final when included in a block.
    for tx in &block.transactions {
        if !tx.is_final(height, block.header.time) {
            Err(BlockError::NonFinalTransaction)?;
        }
    }

    if !checkpoints.validate(height, hash) {
        Err(BlockError::CheckpointsFailed)?;
    }

    Ok(())
}

/// The connection stage: checks against the spent-output state, script
/// execution, and the subsidy ceiling.
async fn connect_block<ZS>(
    state: &mut ZS,
    script_engine: &dyn script::Engine,
    block: &Block,
    height: Height,
) -> Result<(), VerifyBlockError>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>,
{
    // A block may not repeat the hash of an existing transaction unless
    // every output of the old transaction is already spent. Two historical
    // blocks predate this rule and are exempt.
    if !BIP30_EXEMPT_HEIGHTS.contains(&height) {
        for tx in &block.transactions {
            let tx_hash = tx.hash();

            let exists = match query(state, chain::Request::TransactionHeight(tx_hash)).await? {
                chain::Response::TransactionHeight(mined_height) => mined_height.is_some(),
                _ => unreachable!("wrong response to Request::TransactionHeight"),
            };
            if !exists {
                continue;
            }

            for output_index in 0..tx.outputs.len() {
                let outpoint = transparent::OutPoint {
                    hash: tx_hash,
                    index: output_index as u32,
                };
                match query(
                    state,
                    chain::Request::OutputSpent {
                        outpoint,
                        exclude: None,
                    },
                )
                .await?
                {
                    chain::Response::OutputSpent(true) => {}
                    chain::Response::OutputSpent(false) => {
                        Err(BlockError::DuplicateOrSpent)?;
                    }
                    _ => unreachable!("wrong response to Request::OutputSpent"),
                }
            }
        }
    }

    let mut fees = Amount::zero();
    let mut total_sigops = 0;

    for transaction_index in 1..block.transactions.len() {
        let tx = &block.transactions[transaction_index];
        debug_assert!(!tx.is_coinbase(), "checked by the context-free stage");

        total_sigops += script::transaction_sigops(tx);
        if total_sigops > MAX_BLOCK_SIGOPS {
            Err(BlockError::TooManySigOps)?;
        }

        let mut value_in = Amount::zero();
        for input_index in 0..tx.inputs.len() {
            let connected = connect_input(
                state,
                script_engine,
                block,
                height,
                transaction_index,
                input_index,
                value_in,
                total_sigops,
            )
            .await?;
            value_in = connected.0;
            total_sigops = connected.1;
        }

        fees = crate::transaction::check::tally_fees(tx, value_in, fees)
            .ok_or(BlockError::FeesOutOfRange)?;
    }

    check::coinbase_subsidy_is_valid(block, height, fees)?;

    Ok(())
}

/// Connect one input of the block's transaction at `transaction_index` to
/// the output it spends.
///
/// Returns the updated value-in and signature operation totals.
#[allow(clippy::too_many_arguments)]
async fn connect_input<ZS>(
    state: &mut ZS,
    script_engine: &dyn script::Engine,
    block: &Block,
    height: Height,
    transaction_index: usize,
    input_index: usize,
    value_in: Amount<NonNegative>,
    total_sigops: usize,
) -> Result<(Amount<NonNegative>, usize), VerifyBlockError>
where
    ZS: Service<chain::Request, Response = chain::Response, Error = BoxError>,
{
    let tx = &block.transactions[transaction_index];
    let input = &tx.inputs[input_index];
    let previous_output = input.previous_output;

    // Lookup previous output
    let mined = match query(
        state,
        chain::Request::MinedTransaction(previous_output.hash),
    )
    .await?
    {
        chain::Response::MinedTransaction(mined) => {
            mined.ok_or(BlockError::ValidateInputsFailed)?
        }
        _ => unreachable!("wrong response to Request::MinedTransaction"),
    };
    let previous_tx = &mined.tx;
    let previous_out = previous_tx
        .outputs
        .get(previous_output.index as usize)
        .ok_or(BlockError::ValidateInputsFailed)?;

    // Signature operations count, under pay-to-script-hash accounting
    let total_sigops = total_sigops
        + script::script_hash_sigops(&previous_out.lock_script, &input.unlock_script);
    if total_sigops > MAX_BLOCK_SIGOPS {
        Err(BlockError::ValidateInputsFailed)?;
    }

    // The output value range is enforced by `Amount` itself.

    // Check coinbase maturity has been reached
    if previous_tx.is_coinbase() {
        debug_assert!(mined.height <= height, "spends come after their outputs");
        let depth_difference = height - mined.height;
        if depth_difference < transparent::MIN_COINBASE_MATURITY as i32 {
            Err(BlockError::ValidateInputsFailed)?;
        }
    }

    // Pay-to-script-hash activates by timestamp; the height bound is a
    // redundant structural invariant on the same event.
    let pay_to_script_hash = block.header.time >= bip16_switchover_time();
    debug_assert!(
        !pay_to_script_hash || height >= BIP16_SWITCHOVER_HEIGHT,
        "pay-to-script-hash active below its switchover height"
    );

    if !script_engine.verify(
        &previous_out.lock_script,
        tx,
        input_index,
        pay_to_script_hash,
    ) {
        Err(BlockError::ValidateInputsFailed)?;
    }

    // Search for double spends, disregarding the spend recorded by this
    // very input: a transaction may spend an output of an earlier
    // transaction in the same block.
    match query(
        state,
        chain::Request::OutputSpent {
            outpoint: previous_output,
            exclude: Some(chain::BlockPosition {
                transaction_index,
                input_index,
            }),
        },
    )
    .await?
    {
        chain::Response::OutputSpent(false) => {}
        chain::Response::OutputSpent(true) => Err(BlockError::ValidateInputsFailed)?,
        _ => unreachable!("wrong response to Request::OutputSpent"),
    }

    // Increase value_in by this output's value
    let value_in =
        (value_in + previous_out.value).map_err(|_| BlockError::ValidateInputsFailed)?;

    Ok((value_in, total_sigops))
}
