use std::{convert::TryInto, io};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, TimeZone, Utc};

use crate::block;
use crate::serialization::{SatoshiDeserialize, SatoshiSerialize, SerializationError};

/// A Bitcoin `locktime`, representing either a block height or an epoch
/// time.
///
/// # Invariants
///
/// Users should not construct a `LockTime` with:
///   - a `block::Height` greater than `Height::MAX`,
///   - a timestamp before 6 November 1985
///     (Unix timestamp less than `MIN_TIMESTAMP`), or
///   - a timestamp after 7 February 2106
///     (Unix timestamp greater than `MAX_TIMESTAMP`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum LockTime {
    /// Unlock at a particular block height.
    Height(block::Height),
    /// Unlock at a particular time.
    Time(DateTime<Utc>),
}

impl LockTime {
    /// The minimum `LockTime::Time`, as a timestamp in seconds.
    ///
    /// Smaller values are interpreted as block heights.
    pub const MIN_TIMESTAMP: i64 = 500_000_000;

    /// The maximum `LockTime::Time`, as a timestamp in seconds.
    ///
    /// `LockTime` is u32 on the wire, so times are limited to `u32::MAX`.
    pub const MAX_TIMESTAMP: i64 = u32::MAX as i64;

    /// The `LockTime` that does not constrain inclusion at all.
    pub fn unlocked() -> LockTime {
        LockTime::Height(block::Height(0))
    }
}

impl SatoshiSerialize for LockTime {
    fn satoshi_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        // This implementation does not check the invariants on `LockTime` so
        // that the serialization is fallible only if the underlying writer
        // is. This ensures that we can always compute a hash of a
        // transaction object.
        match self {
            LockTime::Height(block::Height(n)) => writer.write_u32::<LittleEndian>(*n)?,
            LockTime::Time(t) => writer
                .write_u32::<LittleEndian>(t.timestamp().try_into().expect("time is in range"))?,
        }
        Ok(())
    }
}

impl SatoshiDeserialize for LockTime {
    fn satoshi_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let n = reader.read_u32::<LittleEndian>()?;
        if n < LockTime::MIN_TIMESTAMP as u32 {
            Ok(LockTime::Height(block::Height(n)))
        } else {
            // This can't panic, because all u32 values are valid timestamps.
            Ok(LockTime::Time(
                Utc.timestamp_opt(n.into(), 0)
                    .single()
                    .expect("all u32 values are valid timestamps"),
            ))
        }
    }
}
