//! Difficulty retargeting.

use chrono::Duration;

use tarpan_chain::work::difficulty::{CompactDifficulty, ExpandedDifficulty, U256};

use crate::parameters::{RETARGET_CLAMP_FACTOR, TARGET_TIMESPAN_SECONDS};

/// Adjust `previous` bits by the time the last retargeting interval
/// actually took.
///
/// The measured timespan is clamped to a factor of
/// [`RETARGET_CLAMP_FACTOR`] around the target timespan, so a single
/// adjustment can change the target by at most that factor. The adjusted
/// target never exceeds the proof-of-work limit.
pub(super) fn retarget(
    previous: CompactDifficulty,
    actual_timespan: Duration,
) -> CompactDifficulty {
    let actual_seconds = (actual_timespan.num_seconds().max(0) as u64).clamp(
        TARGET_TIMESPAN_SECONDS / RETARGET_CLAMP_FACTOR,
        TARGET_TIMESPAN_SECONDS * RETARGET_CLAMP_FACTOR,
    );

    let previous_target = previous
        .to_expanded()
        .expect("difficulty of an accepted block is a valid target");

    // The multiplication cannot overflow: the target is at most 2^224ish
    // and the clamped timespan is far below 2^32.
    let mut retargeted: U256 = previous_target.into();
    retargeted = retargeted * U256::from(actual_seconds);
    retargeted = retargeted / U256::from(TARGET_TIMESPAN_SECONDS);

    let retargeted = ExpandedDifficulty::from(retargeted);
    let max_target = ExpandedDifficulty::max_target();

    if retargeted > max_target {
        max_target.to_compact()
    } else {
        retargeted.to_compact()
    }
}
