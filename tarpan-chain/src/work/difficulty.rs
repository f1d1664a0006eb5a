//! Block difficulty data structures and calculations
//!
//! The block difficulty "target threshold" is stored in the block header as a
//! 32-bit `CompactDifficulty`. The `block::Hash` must be less than or equal
//! to the `ExpandedDifficulty` threshold, when represented as a 256-bit
//! integer in little-endian order.

use std::{cmp::Ordering, convert::TryFrom, fmt};

use crate::block;

pub use crate::work::u256::U256;

#[cfg(test)]
mod tests;

/// A 32-bit "compact bits" value, which represents the difficulty threshold
/// for a block header.
///
/// Used for:
///   - checking the `difficulty_threshold` value in the block header, and
///   - calculating the 256-bit `ExpandedDifficulty` threshold, for comparison
///     with the block header hash.
///
/// Details:
///
/// This is a floating-point encoding, with a 24-bit signed mantissa,
/// an 8-bit exponent, an offset of 3, and a radix of 256.
/// (IEEE 754 32-bit floating-point values use a separate sign bit, an
/// implicit leading mantissa bit, an offset of 127, and a radix of 2.)
///
/// The precise bit pattern of a `CompactDifficulty` value is
/// consensus-critical, because it is used for the `difficulty_threshold`
/// field, which is part of the block header, and which must be bitwise equal
/// to the output of the difficulty retargeting calculation.
///
/// Without these consensus rules, some `ExpandedDifficulty` values would
/// have multiple equivalent `CompactDifficulty` values, due to redundancy in
/// the floating-point format.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CompactDifficulty(pub(crate) u32);

/// The easiest allowed proof-of-work target, in compact form.
///
/// This is the difficulty encoding of the genesis block; no block may have
/// an easier target.
pub const MAX_BITS: CompactDifficulty = CompactDifficulty(0x1d00_ffff);

impl fmt::Debug for CompactDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // There isn't a standard way to show different representations of the
        // same value
        f.debug_tuple("CompactDifficulty")
            // Use hex, because it's a float
            .field(&format_args!("{:#010x}", self.0))
            .finish()
    }
}

/// A 256-bit unsigned "expanded difficulty" value.
///
/// Used as a target threshold for the difficulty of a `block::Hash`.
///
/// The precise bit pattern of an `ExpandedDifficulty` value is
/// consensus-critical, because it is compared with the `block::Hash`.
///
/// Note that each `CompactDifficulty` value can be converted from a
/// range of `ExpandedDifficulty` values, because the precision of
/// the floating-point format requires rounding on conversion.
///
/// Therefore, consensus-critical code must perform the specified
/// conversions to `CompactDifficulty`, even if the original
/// `ExpandedDifficulty` values are known.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
pub struct ExpandedDifficulty(U256);

impl fmt::Debug for ExpandedDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut buf = [0; 32];
        // Use the same byte order as block::Hash
        self.0.to_big_endian(&mut buf);
        f.debug_tuple("ExpandedDifficulty")
            .field(&hex::encode(&buf))
            .finish()
    }
}

impl CompactDifficulty {
    /// CompactDifficulty exponent base.
    const BASE: u32 = 256;

    /// CompactDifficulty exponent offset.
    const OFFSET: i32 = 3;

    /// CompactDifficulty floating-point precision.
    const PRECISION: u32 = 24;

    /// CompactDifficulty sign bit, part of the signed mantissa.
    const SIGN_BIT: u32 = 1 << (CompactDifficulty::PRECISION - 1);

    /// CompactDifficulty unsigned mantissa mask.
    ///
    /// Also the maximum unsigned mantissa value.
    const UNSIGNED_MANTISSA_MASK: u32 = CompactDifficulty::SIGN_BIT - 1;

    /// Create a CompactDifficulty from its raw 32-bit header encoding.
    pub fn from_bits(bits: u32) -> CompactDifficulty {
        CompactDifficulty(bits)
    }

    /// The raw 32-bit header encoding of this difficulty.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Calculate the ExpandedDifficulty for a compact representation.
    ///
    /// See `CheckProofOfWork()` in the reference implementation.
    ///
    /// Returns None for negative, zero, and overflow values. (The reference
    /// implementation rejects these values, before comparing the hash.)
    pub fn to_expanded(self) -> Option<ExpandedDifficulty> {
        // The constants for this floating-point representation.
        // Alias the struct constants here, so the code is easier to read.
        const BASE: u32 = CompactDifficulty::BASE;
        const OFFSET: i32 = CompactDifficulty::OFFSET;
        const PRECISION: u32 = CompactDifficulty::PRECISION;
        const SIGN_BIT: u32 = CompactDifficulty::SIGN_BIT;
        const UNSIGNED_MANTISSA_MASK: u32 = CompactDifficulty::UNSIGNED_MANTISSA_MASK;

        // Negative values in this floating-point representation.
        // 0 if (x & 2^23 == 2^23)
        //
        // The reference implementation rejects negative values without
        // comparing the hash.
        if self.0 & SIGN_BIT == SIGN_BIT {
            return None;
        }

        // The fractional part of the floating-point number
        // x & (2^23 - 1)
        let mantissa = self.0 & UNSIGNED_MANTISSA_MASK;

        // The exponent for the multiplier in the floating-point number
        // 256^(floor(x/(2^24)) - 3)
        //
        // The i32 conversion is safe, because we've just divided self by 2^24.
        let exponent = i32::try_from(self.0 >> PRECISION).expect("fits in i32") - OFFSET;

        // Normalise the mantissa and exponent before multiplying.
        //
        // The reference implementation rejects non-zero overflow values, but
        // accepts overflows where all the overflowing bits are zero. It also
        // allows underflows.
        let (mantissa, exponent) = match (mantissa, exponent) {
            // Overflow: check for non-zero overflow bits
            //
            // If m is non-zero, overflow. If m is zero, invalid.
            (_, e) if (e >= 32) => return None,
            // If m is larger than the remaining bytes, overflow.
            // Otherwise, avoid overflows in base^exponent.
            (m, e) if (e == 31 && m > u8::MAX.into()) => return None,
            (m, e) if (e == 31 && m <= u8::MAX.into()) => (m << 16, e - 2),
            (m, e) if (e == 30 && m > u16::MAX.into()) => return None,
            (m, e) if (e == 30 && m <= u16::MAX.into()) => (m << 8, e - 1),

            // Underflow: perform the right shift.
            // The abs is safe, because we've just divided by 2^24, and offset
            // is small.
            (m, e) if (e < 0) => (m >> ((e.abs() * 8) as u32), 0),
            (m, e) => (m, e),
        };

        // Now calculate the result: mantissa*base^exponent
        // Earlier code should make sure all these values are in range.
        let mantissa: U256 = mantissa.into();
        let base: U256 = BASE.into();
        let exponent: U256 = exponent.into();
        let result = mantissa * base.pow(exponent);

        if result == U256::zero() {
            // The reference implementation rejects zero values, without
            // comparing the hash.
            None
        } else {
            Some(result.into())
        }
    }
}

impl ExpandedDifficulty {
    /// Returns the difficulty of the hash.
    ///
    /// Used to implement comparisons between difficulties and hashes.
    ///
    /// Hashes are not used to calculate the difficulties of future blocks,
    /// so users of this module should avoid converting hashes into
    /// difficulties where a difficulty is not being compared with a hash.
    pub fn from_hash(hash: &block::Hash) -> ExpandedDifficulty {
        U256::from_little_endian(&hash.0).into()
    }

    /// Returns the easiest target difficulty allowed by the consensus rules.
    pub fn max_target() -> ExpandedDifficulty {
        MAX_BITS
            .to_expanded()
            .expect("the genesis difficulty is a valid expanded value")
    }

    /// Calculate the CompactDifficulty for an expanded difficulty.
    ///
    /// See `GetCompact()` in the reference implementation.
    ///
    /// # Panics
    ///
    /// If `self` is zero.
    ///
    /// `ExpandedDifficulty` values are generated in two ways:
    ///   * conversion from `CompactDifficulty` values, which rejects zeroes,
    ///     and
    ///   * difficulty retargeting calculations, which impose a non-zero
    ///     minimum via the clamped timespan.
    ///
    /// Neither of these methods yield zero values.
    pub fn to_compact(self) -> CompactDifficulty {
        // The reference implementation supports negative and zero compact
        // values. These values are rejected by the protocol rules, so this
        // function does not produce negative compact values, and panics on
        // zero compact values.
        assert!(self.0 > 0.into(), "Zero difficulty values are invalid");

        // The constants for this floating-point representation.
        // Alias the constants here, so the code is easier to read.
        const UNSIGNED_MANTISSA_MASK: u32 = CompactDifficulty::UNSIGNED_MANTISSA_MASK;
        const OFFSET: i32 = CompactDifficulty::OFFSET;

        // Calculate the final size, accounting for the sign bit.
        // This is the size *after* applying the sign bit adjustment in
        // `GetCompact()`.
        let size = self.0.bits() / 8 + 1;

        // Make sure the mantissa is non-negative, by shifting down values
        // that would otherwise overflow into the sign bit
        let mantissa = if self.0 <= UNSIGNED_MANTISSA_MASK.into() {
            // Value is small, shift up if needed
            self.0 << (8 * (3 - size))
        } else {
            // Value is large, shift down
            self.0 >> (8 * (size - 3))
        };

        // This assertion also makes sure that size fits in its 8 bit compact
        // field
        assert!(
            size < (31 + OFFSET) as _,
            "256^size (256^{}) must fit in a u256, after the sign bit adjustment and offset",
            size
        );
        let size = u32::try_from(size).expect("a 0-6 bit value fits in a u32");

        assert!(
            mantissa <= UNSIGNED_MANTISSA_MASK.into(),
            "mantissa {:x?} must fit in its compact field",
            mantissa
        );
        let mantissa = u32::try_from(mantissa).expect("a 0-23 bit value fits in a u32");

        if mantissa > 0 {
            CompactDifficulty(mantissa + (size << 24))
        } else {
            // This check catches invalid mantissas. Overflows and underflows
            // should also be unreachable, but they aren't caught here.
            unreachable!("converted CompactDifficulty values must be valid")
        }
    }
}

impl From<U256> for ExpandedDifficulty {
    fn from(value: U256) -> Self {
        ExpandedDifficulty(value)
    }
}

impl From<ExpandedDifficulty> for U256 {
    fn from(value: ExpandedDifficulty) -> Self {
        value.0
    }
}

impl PartialEq<block::Hash> for ExpandedDifficulty {
    fn eq(&self, other: &block::Hash) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd<block::Hash> for ExpandedDifficulty {
    /// Compare this difficulty threshold with a block hash, interpreting the
    /// hash as a 256-bit little-endian integer.
    fn partial_cmp(&self, other: &block::Hash) -> Option<Ordering> {
        self.0.partial_cmp(&ExpandedDifficulty::from_hash(other).0)
    }
}

impl PartialEq<ExpandedDifficulty> for block::Hash {
    fn eq(&self, other: &ExpandedDifficulty) -> bool {
        other.eq(self)
    }
}

impl PartialOrd<ExpandedDifficulty> for block::Hash {
    /// Compare this block hash with a difficulty threshold.
    ///
    /// The block satisfies the proof of work iff it is less than or equal to
    /// the threshold.
    fn partial_cmp(&self, other: &ExpandedDifficulty) -> Option<Ordering> {
        use Ordering::*;

        // Use the canonical implementation, but reverse the order
        other.partial_cmp(self).map(|order| match order {
            Less => Greater,
            Equal => Equal,
            Greater => Less,
        })
    }
}
