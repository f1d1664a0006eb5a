//! Block subsidies and the halving schedule.

use std::convert::TryFrom;

use tarpan_chain::{
    amount::{Amount, NonNegative, COIN},
    block::Height,
};

use crate::parameters::HALVING_INTERVAL;

/// The miner subsidy for a block at `height`, before fees.
///
/// The subsidy starts at 50 coins and halves every
/// [`HALVING_INTERVAL`] blocks, reaching zero after 64 halvings.
pub(super) fn block_reward(height: Height) -> Amount<NonNegative> {
    let halvings = height.0 / HALVING_INTERVAL;
    if halvings >= 64 {
        return Amount::zero();
    }

    Amount::try_from((50 * COIN) >> halvings)
        .expect("a halved subsidy is always within the money range")
}
