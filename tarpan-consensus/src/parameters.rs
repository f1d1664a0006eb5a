//! The consensus parameters for the block and transaction rules.
//!
//! Some consensus parameters are beyond this crate's scope: the script
//! interpreter's semantics live behind [`script::Engine`](crate::script::Engine),
//! and the money range lives with [`Amount`](tarpan_chain::amount::Amount).

use chrono::{DateTime, TimeZone, Utc};

use tarpan_chain::block::Height;

/// The maximum serialized size of a block, in bytes.
pub const MAX_BLOCK_SIZE: usize = 1_000_000;

/// The maximum number of signature operations in a block.
pub const MAX_BLOCK_SIGOPS: usize = MAX_BLOCK_SIZE / 50;

/// The number of blocks between difficulty adjustments.
pub const RETARGETING_INTERVAL: u32 = 2_016;

/// The intended elapsed time for one retargeting interval: two weeks.
pub const TARGET_TIMESPAN_SECONDS: u64 = 14 * 24 * 60 * 60;

/// The maximum factor by which one retargeting step may change the target.
pub const RETARGET_CLAMP_FACTOR: u64 = 4;

/// The number of blocks between block subsidy halvings.
pub const HALVING_INTERVAL: u32 = 210_000;

/// The timestamp at which pay-to-script-hash evaluation activates.
///
/// The timestamp check is authoritative; [`BIP16_SWITCHOVER_HEIGHT`] is a
/// redundant structural bound on the same event.
pub const BIP16_SWITCHOVER_TIMESTAMP: i64 = 1_333_238_400;

/// The chain height reached at [`BIP16_SWITCHOVER_TIMESTAMP`].
pub const BIP16_SWITCHOVER_HEIGHT: Height = Height(173_805);

/// The two historical heights exempt from the duplicate-transaction rule.
///
/// These blocks duplicated the coinbases of earlier blocks before the rule
/// existed, and are grandfathered into the chain.
pub const BIP30_EXEMPT_HEIGHTS: [Height; 2] = [Height(91_842), Height(91_880)];

/// The instant at which pay-to-script-hash evaluation activates.
pub fn bip16_switchover_time() -> DateTime<Utc> {
    Utc.timestamp_opt(BIP16_SWITCHOVER_TIMESTAMP, 0)
        .single()
        .expect("the switchover timestamp is a valid time")
}
