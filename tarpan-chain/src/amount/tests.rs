use std::convert::{TryFrom, TryInto};

use super::*;

#[test]
fn test_add() {
    let zero: Amount = Amount::zero();
    let one: Amount = 1i64.try_into().unwrap();

    assert!(
        Amount::<NonNegative>::try_from(-1i64).is_err(),
        "negative amounts are rejected"
    );
    assert_eq!(Ok(zero), zero + zero);
    assert_eq!(Ok(one), zero + one);
}

#[test]
fn add_overflow() {
    let max: Amount = MAX_MONEY.try_into().unwrap();
    let one: Amount = 1i64.try_into().unwrap();

    assert!((max + one).is_err(), "above MAX_MONEY is invalid");
    assert_eq!(Ok(max), max + Amount::zero());
}

#[test]
fn sub_checks_bounds() {
    let one: Amount = 1i64.try_into().unwrap();
    let two: Amount = 2i64.try_into().unwrap();

    assert_eq!(Ok(one), two - one);
    assert!((one - two).is_err(), "negative results are invalid");
}

#[test]
fn sum_checks_running_total() {
    let max: Amount = MAX_MONEY.try_into().unwrap();
    let one: Amount = 1i64.try_into().unwrap();

    let overflowing: Result<Amount> = vec![max, one].into_iter().sum();
    assert!(overflowing.is_err());

    let valid: Result<Amount> = vec![one, one, one].into_iter().sum();
    assert_eq!(Ok(Amount::try_from(3i64).unwrap()), valid);
}

#[test]
fn try_from_rejects_out_of_range() {
    assert!(Amount::<NonNegative>::try_from(MAX_MONEY).is_ok());
    assert!(Amount::<NonNegative>::try_from(MAX_MONEY + 1).is_err());
    assert!(Amount::<NonNegative>::try_from(-1i64).is_err());
    assert!(Amount::<NonNegative>::try_from(u64::MAX).is_err());
}

#[test]
fn serialize_round_trip() {
    use crate::serialization::{SatoshiDeserialize, SatoshiSerialize};

    let amount: Amount = (50 * COIN).try_into().unwrap();
    let bytes = amount.satoshi_serialize_to_vec().unwrap();
    assert_eq!(8, bytes.len());

    let parsed = Amount::satoshi_deserialize(&bytes[..]).unwrap();
    assert_eq!(amount, parsed);
}

#[test]
fn deserialize_rejects_over_max_money() {
    use crate::serialization::SatoshiDeserialize;

    let bytes = (MAX_MONEY as u64 + 1).to_le_bytes();
    assert!(Amount::<NonNegative>::satoshi_deserialize(&bytes[..]).is_err());
}
