use super::*;

use crate::block;

/// The genesis bits expand to `0xffff * 256^26`.
#[test]
fn max_bits_expands_to_the_pow_limit() {
    let expected: U256 = U256::from(0xffffu64) << (26 * 8);

    let expanded = MAX_BITS.to_expanded().expect("genesis bits are valid");
    assert_eq!(expected, expanded.into());
    assert_eq!(expanded, ExpandedDifficulty::max_target());
}

#[test]
fn compact_round_trip() {
    for bits in &[0x1d00_ffffu32, 0x1c05_a3f4, 0x1b04_864c, 0x1a05_db8b] {
        let compact = CompactDifficulty::from_bits(*bits);
        let expanded = compact.to_expanded().expect("test vectors are valid");
        assert_eq!(compact, expanded.to_compact(), "bits {:#010x}", bits);
    }
}

#[test]
fn negative_and_zero_encodings_are_invalid() {
    // Sign bit set
    assert_eq!(None, CompactDifficulty::from_bits(0x0180_0000).to_expanded());
    // Zero mantissa
    assert_eq!(None, CompactDifficulty::from_bits(0x1d00_0000).to_expanded());
    // Zero
    assert_eq!(None, CompactDifficulty::from_bits(0).to_expanded());
    // Overflow: large exponent with a non-zero mantissa
    assert_eq!(None, CompactDifficulty::from_bits(0xff12_3456).to_expanded());
}

#[test]
fn hash_ordering_against_difficulty() {
    let target = ExpandedDifficulty::max_target();

    let zero_hash = block::Hash([0; 32]);
    assert!(zero_hash < target);

    let max_hash = block::Hash([0xff; 32]);
    assert!(max_hash > target);
}
