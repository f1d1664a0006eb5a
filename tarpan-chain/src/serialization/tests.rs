use std::{convert::TryInto, io::Cursor};

use proptest::prelude::*;

use super::{ReadSatoshiExt, SatoshiDeserialize, SatoshiSerialize, WriteSatoshiExt};

use crate::{
    block::Height,
    transaction::{LockTime, Transaction},
    transparent::{Input, OutPoint, Output, Script},
};

#[test]
fn compactsize_boundary_encodings() {
    for (n, expected) in &[
        (0x12u64, &b"\x12"[..]),
        (0xfc, b"\xfc"),
        (0xfd, b"\xfd\xfd\x00"),
        (0xaafd, b"\xfd\xfd\xaa"),
        (0xffff, b"\xfd\xff\xff"),
        (0x0001_0000, b"\xfe\x00\x00\x01\x00"),
        (0xbbaa_fd00, b"\xfe\x00\xfd\xaa\xbb"),
        (0xffff_ffff, b"\xfe\xff\xff\xff\xff"),
        (0x1_0000_0000, b"\xff\x00\x00\x00\x00\x01\x00\x00\x00"),
    ] {
        let mut buf = Vec::new();
        buf.write_compactsize(*n).unwrap();
        assert_eq!(&buf[..], *expected, "encoding of {:#x}", n);

        assert_eq!(*n, Cursor::new(&buf).read_compactsize().unwrap());
    }
}

fn arbitrary_script() -> impl Strategy<Value = Script> {
    prop::collection::vec(any::<u8>(), 0..32).prop_map(|bytes| {
        // Avoid truncated trailing pushes, so parse_ops round trips too.
        Script::new(&bytes.iter().map(|b| b | 0x80).collect::<Vec<u8>>())
    })
}

fn arbitrary_transaction() -> impl Strategy<Value = Transaction> {
    let input = (any::<[u8; 32]>(), any::<u32>(), arbitrary_script(), any::<u32>()).prop_map(
        |(hash, index, unlock_script, sequence)| Input {
            previous_output: OutPoint {
                hash: crate::transaction::Hash(hash),
                index,
            },
            unlock_script,
            sequence,
        },
    );
    let output = (0i64..=1_000_000_000, arbitrary_script()).prop_map(|(value, lock_script)| {
        Output {
            value: value.try_into().expect("value is in range"),
            lock_script,
        }
    });

    (
        any::<u32>(),
        prop::collection::vec(input, 1..4),
        prop::collection::vec(output, 1..4),
        0u32..500_000_000,
    )
        .prop_map(|(version, inputs, outputs, lock)| Transaction {
            version,
            inputs,
            outputs,
            lock_time: if lock < Height::MAX.0 {
                LockTime::Height(Height(lock))
            } else {
                LockTime::unlocked()
            },
        })
}

proptest! {
    #[test]
    fn compactsize_round_trip(n in any::<u64>()) {
        let mut buf = Vec::new();
        buf.write_compactsize(n).unwrap();
        prop_assert_eq!(n, Cursor::new(&buf).read_compactsize().unwrap());
    }

    #[test]
    fn transaction_round_trip(tx in arbitrary_transaction()) {
        let bytes = tx.satoshi_serialize_to_vec().unwrap();
        let parsed = Transaction::satoshi_deserialize(&bytes[..]).unwrap();

        prop_assert_eq!(&tx, &parsed);
        // Hashing commits to the same canonical bytes.
        prop_assert_eq!(tx.hash(), parsed.hash());
    }
}
