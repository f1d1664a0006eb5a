//! The script interpreter boundary, and signature operation counting.
//!
//! Script execution is kept behind the narrow [`Engine`] trait so the
//! validators can be tested with stub engines that return scripted
//! verdicts. Signature operation counting is consensus logic and lives
//! here, outside the engine.

use tarpan_chain::{
    block::Block,
    transaction::Transaction,
    transparent::{OpCode, Operation, Script},
};

/// Runs unlock scripts against the outputs they spend.
///
/// Implementations are consulted once per transaction input, and must judge
/// the input's unlock script against `lock_script` in the context of the
/// spending transaction.
pub trait Engine: Send + Sync {
    /// Execute the unlock script of `transaction`'s input at `input_index`
    /// against `lock_script`.
    ///
    /// When `pay_to_script_hash` is true, script-hash outputs are redeemed
    /// by evaluating the script embedded in the unlock script's final push.
    fn verify(
        &self,
        lock_script: &Script,
        transaction: &Transaction,
        input_index: usize,
        pay_to_script_hash: bool,
    ) -> bool;
}

/// Count the signature operations in a parsed script.
///
/// In `accurate` mode, a multisig check costs the number of public keys
/// announced by the preceding small-integer push; legacy counting always
/// charges the 20-key maximum.
pub fn count_sigops(ops: &[Operation], accurate: bool) -> usize {
    let mut sigops = 0;
    let mut last_number = 0;

    for op in ops {
        if op.code == OpCode::CheckSig as u8 || op.code == OpCode::CheckSigVerify as u8 {
            sigops += 1;
        } else if op.code == OpCode::CheckMultisig as u8
            || op.code == OpCode::CheckMultisigVerify as u8
        {
            if accurate && last_number != 0 {
                sigops += last_number;
            } else {
                sigops += 20;
            }
        }

        if (OpCode::Op1 as u8..=OpCode::Op16 as u8).contains(&op.code) {
            last_number = (op.code - OpCode::Op1 as u8 + 1) as usize;
        }
    }

    sigops
}

/// Count the legacy signature operations in every script of `transaction`.
///
/// A script that does not parse contributes no operations: scripts are
/// parsed from raw bytes on demand, and a malformed script can never be
/// executed.
pub fn transaction_sigops(transaction: &Transaction) -> usize {
    let mut sigops = 0;

    for input in &transaction.inputs {
        let ops = input.unlock_script.parse_ops().unwrap_or_default();
        sigops += count_sigops(&ops, false);
    }
    for output in &transaction.outputs {
        let ops = output.lock_script.parse_ops().unwrap_or_default();
        sigops += count_sigops(&ops, false);
    }

    sigops
}

/// Count the legacy signature operations in every transaction of `block`.
pub fn block_sigops(block: &Block) -> usize {
    block
        .transactions
        .iter()
        .map(|tx| transaction_sigops(tx))
        .sum()
}

/// Count the signature operations an input contributes under
/// pay-to-script-hash accounting.
///
/// For ordinary outputs this is the accurate count of the lock script. For
/// script-hash outputs the operations live in the script embedded in the
/// unlock script's final push, so that script is parsed and counted
/// instead; an unlock script with no trailing push contributes nothing.
pub fn script_hash_sigops(lock_script: &Script, unlock_script: &Script) -> usize {
    if !lock_script.is_pay_to_script_hash() {
        return count_sigops(&lock_script.parse_ops().unwrap_or_default(), true);
    }

    let ops = unlock_script.parse_ops().unwrap_or_default();
    match ops.last().and_then(|op| op.data.as_ref()) {
        Some(embedded) => {
            let embedded_ops = Script::new(embedded).parse_ops().unwrap_or_default();
            count_sigops(&embedded_ops, true)
        }
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use tarpan_chain::{transaction::LockTime, transparent::Output};

    use super::*;

    fn ops(bytes: &[u8]) -> Vec<Operation> {
        Script::new(bytes).parse_ops().expect("test script parses")
    }

    #[test]
    fn checksig_counts_one() {
        assert_eq!(1, count_sigops(&ops(&[0xac]), false));
        assert_eq!(1, count_sigops(&ops(&[0xad]), true));
        assert_eq!(2, count_sigops(&ops(&[0xac, 0xad]), false));
    }

    #[test]
    fn multisig_counts_twenty_unless_accurate() {
        // OP_2 <multisig>
        let script = [0x52, 0xae];

        assert_eq!(20, count_sigops(&ops(&script), false));
        assert_eq!(2, count_sigops(&ops(&script), true));

        // Without a preceding small-integer push, even accurate counting
        // charges the maximum.
        assert_eq!(20, count_sigops(&ops(&[0xae]), true));

        // OP_16 <multisigverify>
        assert_eq!(16, count_sigops(&ops(&[0x60, 0xaf]), true));
    }

    #[test]
    fn data_pushes_reset_nothing() {
        // A push between the number and the multisig leaves the number
        // standing.
        let script = [0x52, 0x01, 0xaa, 0xae];
        assert_eq!(2, count_sigops(&ops(&script), true));
    }

    #[test]
    fn malformed_scripts_count_zero() {
        let truncated = Script::new(&[0x4b]);
        assert!(truncated.parse_ops().is_err());

        let tx = Transaction {
            version: 1,
            inputs: vec![],
            outputs: vec![Output {
                value: 0i64.try_into().unwrap(),
                lock_script: truncated,
            }],
            lock_time: LockTime::unlocked(),
        };
        assert_eq!(0, transaction_sigops(&tx));
    }

    #[test]
    fn script_hash_outputs_count_the_embedded_script() {
        let mut lock = vec![OpCode::Hash160 as u8, OpCode::Push20Bytes as u8];
        lock.extend([0x42; 20]);
        lock.push(OpCode::Equal as u8);
        let lock = Script::new(&lock);

        // The embedded script: OP_3 <multisig>
        let embedded = [0x53, 0xae];
        let unlock = Script::new(&[0x02, embedded[0], embedded[1]]);

        assert_eq!(3, script_hash_sigops(&lock, &unlock));

        // An empty unlock script contributes nothing.
        assert_eq!(0, script_hash_sigops(&lock, &Script::new(&[])));

        // A non-script-hash output counts its own operations.
        assert_eq!(1, script_hash_sigops(&Script::new(&[0xac]), &unlock));
    }
}
