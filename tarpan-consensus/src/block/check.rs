//! Context-free block checks.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use tarpan_chain::{
    amount::{Amount, NonNegative},
    block::{merkle, Block, Header, Height},
    serialization::SatoshiSerialize,
    work::difficulty::ExpandedDifficulty,
};

use crate::{
    error::{BlockError, TransactionError},
    parameters::{MAX_BLOCK_SIGOPS, MAX_BLOCK_SIZE},
    script,
};

use super::subsidy;

/// The context-free checks, in order.
///
/// These checks are independent of the block's position in the chain, so
/// they can run before an orphan block's parent arrives.
pub(super) fn block(block: &Block) -> Result<(), BlockError> {
    size_limits_are_valid(block)?;
    proof_of_work_is_valid(&block.header)?;
    time_is_valid_at(&block.header, Utc::now())?;
    coinbase_is_first(block)?;

    for tx in &block.transactions {
        crate::transaction::check::transaction(tx)?;
    }

    transaction_hashes_are_unique(block)?;
    sigops_are_in_limit(block)?;
    merkle_root_is_valid(block)?;

    Ok(())
}

/// Checks that the block has transactions, and that its serialization fits
/// the size limit.
pub(super) fn size_limits_are_valid(block: &Block) -> Result<(), BlockError> {
    if block.transactions.is_empty()
        || block.transactions.len() > MAX_BLOCK_SIZE
        || block.satoshi_serialized_size() > MAX_BLOCK_SIZE
    {
        return Err(BlockError::SizeLimits);
    }
    Ok(())
}

/// Checks that the header hash satisfies its own difficulty threshold.
///
/// The threshold must decode to a non-zero target no easier than the
/// proof-of-work limit, and the header hash, read as a 256-bit integer,
/// must not exceed it.
pub(super) fn proof_of_work_is_valid(header: &Header) -> Result<(), BlockError> {
    let target = header
        .difficulty_threshold
        .to_expanded()
        .ok_or(BlockError::ProofOfWork)?;

    if target > ExpandedDifficulty::max_target() {
        return Err(BlockError::ProofOfWork);
    }

    if header.hash() > target {
        return Err(BlockError::ProofOfWork);
    }

    Ok(())
}

/// Checks that `header.time` is at most 2 hours in the future, according
/// to the node's local clock (`now`).
///
/// This is a non-deterministic rule, as clocks vary over time, and between
/// different nodes: a block that is rejected by this rule at a given point
/// in time may later be accepted.
pub(super) fn time_is_valid_at(header: &Header, now: DateTime<Utc>) -> Result<(), BlockError> {
    header
        .time_is_valid_at(now)
        .map_err(|_| BlockError::FuturisticTimestamp)
}

/// Checks that there is exactly one coinbase transaction in the block, and
/// that it is the first transaction.
pub(super) fn coinbase_is_first(block: &Block) -> Result<(), BlockError> {
    let first = block
        .transactions
        .get(0)
        .ok_or(BlockError::SizeLimits)?;
    if !first.is_coinbase() {
        return Err(BlockError::FirstNotCoinbase);
    }

    let mut rest = block.transactions.iter().skip(1);
    if rest.any(|tx| tx.is_coinbase()) {
        return Err(BlockError::ExtraCoinbases);
    }

    Ok(())
}

/// Checks that every transaction hash in the block is distinct.
pub(super) fn transaction_hashes_are_unique(block: &Block) -> Result<(), BlockError> {
    let unique: HashSet<_> = block.transactions.iter().map(|tx| tx.hash()).collect();
    if unique.len() != block.transactions.len() {
        Err(TransactionError::Duplicate)?;
    }
    Ok(())
}

/// Checks the block's legacy signature operation count against the budget.
pub(super) fn sigops_are_in_limit(block: &Block) -> Result<(), BlockError> {
    if script::block_sigops(block) > MAX_BLOCK_SIGOPS {
        return Err(BlockError::TooManySigOps);
    }
    Ok(())
}

/// Checks that the header's merkle root commits to the block's
/// transactions.
pub(super) fn merkle_root_is_valid(block: &Block) -> Result<(), BlockError> {
    let merkle_root = block.transactions.iter().collect::<merkle::Root>();
    if block.header.merkle_root != merkle_root {
        return Err(BlockError::MerkleMismatch);
    }
    Ok(())
}

/// Checks the coinbase output total against the block subsidy plus the
/// fees collected from the block's other transactions.
pub(super) fn coinbase_subsidy_is_valid(
    block: &Block,
    height: Height,
    fees: Amount<NonNegative>,
) -> Result<(), BlockError> {
    let coinbase_value = block.transactions[0]
        .output_value_total()
        .expect("validated by the context-free stage");

    // The sum fits in an i64: both terms are within the money range.
    let ceiling = subsidy::block_reward(height).satoshis() + fees.satoshis();
    if coinbase_value.satoshis() > ceiling {
        return Err(BlockError::CoinbaseTooLarge);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use tarpan_chain::test_vectors;

    use super::*;
    use crate::tests::util::{coinbase, transfer};

    #[test]
    fn genesis_block_passes_the_context_free_stage() {
        let genesis = test_vectors::genesis_block();
        assert_eq!(Ok(()), block(&genesis));
    }

    #[test]
    fn empty_blocks_fail_the_size_limits() {
        let mut empty = test_vectors::genesis_block();
        empty.transactions.clear();

        assert_eq!(Err(BlockError::SizeLimits), size_limits_are_valid(&empty));
    }

    #[test]
    fn tampered_headers_fail_the_proof_of_work() {
        let mut tampered = test_vectors::genesis_block();
        tampered.header.nonce += 1;

        assert_eq!(
            Err(BlockError::ProofOfWork),
            proof_of_work_is_valid(&tampered.header)
        );
    }

    #[test]
    fn far_future_timestamps_are_rejected() {
        let genesis = test_vectors::genesis_block();

        let now = genesis.header.time + Duration::hours(1);
        assert_eq!(Ok(()), time_is_valid_at(&genesis.header, now));

        let now = genesis.header.time - Duration::hours(2) - Duration::seconds(1);
        assert_eq!(
            Err(BlockError::FuturisticTimestamp),
            time_is_valid_at(&genesis.header, now)
        );
    }

    #[test]
    fn coinbase_placement_is_enforced() {
        let genesis = test_vectors::genesis_block();
        let spend = Arc::new(transfer(&genesis.transactions[0], 0, 100));

        let mut shuffled = genesis.clone();
        shuffled.transactions.insert(0, spend.clone());
        assert_eq!(
            Err(BlockError::FirstNotCoinbase),
            coinbase_is_first(&shuffled)
        );

        let mut doubled = genesis.clone();
        doubled.transactions.push(Arc::new(coinbase(100)));
        assert_eq!(Err(BlockError::ExtraCoinbases), coinbase_is_first(&doubled));
    }

    #[test]
    fn repeated_transactions_are_duplicates() {
        let genesis = test_vectors::genesis_block();
        let spend = Arc::new(transfer(&genesis.transactions[0], 0, 100));

        let mut duplicated = genesis.clone();
        duplicated.transactions.push(spend.clone());
        duplicated.transactions.push(spend);

        assert_eq!(
            Err(BlockError::Transaction(TransactionError::Duplicate)),
            transaction_hashes_are_unique(&duplicated)
        );
    }

    #[test]
    fn merkle_roots_must_match_the_transactions() {
        let genesis = test_vectors::genesis_block();
        assert_eq!(Ok(()), merkle_root_is_valid(&genesis));

        let mut extended = genesis.clone();
        extended
            .transactions
            .push(Arc::new(transfer(&genesis.transactions[0], 0, 100)));
        assert_eq!(
            Err(BlockError::MerkleMismatch),
            merkle_root_is_valid(&extended)
        );
    }

    #[test]
    fn sigop_heavy_blocks_are_rejected() {
        let mut block = test_vectors::genesis_block();
        let mut heavy = transfer(&block.transactions[0], 0, 100);
        heavy.outputs[0].lock_script =
            tarpan_chain::transparent::Script::new(&vec![0xac; MAX_BLOCK_SIGOPS + 1]);
        block.transactions.push(Arc::new(heavy));

        assert_eq!(Err(BlockError::TooManySigOps), sigops_are_in_limit(&block));
    }

    #[test]
    fn coinbase_may_claim_subsidy_and_fees_exactly() {
        use std::convert::TryInto;

        // Scenario: at the first halving the subsidy drops to 25 coins.
        let height = Height(210_000);
        let reward = subsidy::block_reward(height).satoshis();

        let exact = Block {
            header: test_vectors::genesis_block().header,
            transactions: vec![Arc::new(coinbase(reward))],
        };
        assert_eq!(
            Ok(()),
            coinbase_subsidy_is_valid(&exact, height, Amount::zero())
        );

        let greedy = Block {
            header: test_vectors::genesis_block().header,
            transactions: vec![Arc::new(coinbase(reward + 1))],
        };
        assert_eq!(
            Err(BlockError::CoinbaseTooLarge),
            coinbase_subsidy_is_valid(&greedy, height, Amount::zero())
        );

        // Fees raise the ceiling.
        let fees: Amount<NonNegative> = 1i64.try_into().unwrap();
        assert_eq!(Ok(()), coinbase_subsidy_is_valid(&greedy, height, fees));
    }
}
