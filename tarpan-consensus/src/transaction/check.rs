//! Context-free transaction checks.

use tarpan_chain::{
    amount::{Amount, NonNegative},
    transaction::Transaction,
};

use crate::error::TransactionError;

/// The context-free structural checks shared by the transaction verifier
/// and block verification.
///
/// These checks are pure: the same transaction always yields the same
/// verdict.
pub fn transaction(tx: &Transaction) -> Result<(), TransactionError> {
    has_inputs_and_outputs(tx)?;
    output_values_are_in_range(tx)?;

    if tx.is_coinbase() {
        coinbase_script_size_is_valid(tx)
    } else {
        no_null_previous_outputs(tx)
    }
}

/// Checks that the transaction has at least one input and one output.
pub fn has_inputs_and_outputs(tx: &Transaction) -> Result<(), TransactionError> {
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        Err(TransactionError::Empty)
    } else {
        Ok(())
    }
}

/// Checks the total output value against the money range.
///
/// Individual output values above the money range are unrepresentable by
/// [`Amount`], so this reduces to the running total staying in range after
/// every addition.
fn output_values_are_in_range(tx: &Transaction) -> Result<(), TransactionError> {
    tx.output_value_total()
        .map_err(|_| TransactionError::OutputValueOverflow)?;
    Ok(())
}

/// Checks that the coinbase input script is between 2 and 100 bytes.
fn coinbase_script_size_is_valid(tx: &Transaction) -> Result<(), TransactionError> {
    let script_size = tx.inputs[0].unlock_script.as_raw_bytes().len();
    if (2..=100).contains(&script_size) {
        Ok(())
    } else {
        Err(TransactionError::InvalidCoinbaseScriptSize)
    }
}

/// Checks that no input of a non-coinbase transaction references the null
/// outpoint.
fn no_null_previous_outputs(tx: &Transaction) -> Result<(), TransactionError> {
    for input in &tx.inputs {
        if input.previous_output.is_null() {
            return Err(TransactionError::PreviousOutputNull);
        }
    }
    Ok(())
}

/// The standardness policy hook.
///
/// Everything is currently standard; a relay policy can tighten this
/// without touching the consensus rules.
pub fn is_standard(_tx: &Transaction) -> Result<(), TransactionError> {
    Ok(())
}

/// Add the fee claimed by `tx` to a running fee total.
///
/// Returns the new total, or `None` when the inputs are worth less than
/// the outputs or the total leaves the money range.
pub(crate) fn tally_fees(
    tx: &Transaction,
    value_in: Amount<NonNegative>,
    total_fees: Amount<NonNegative>,
) -> Option<Amount<NonNegative>> {
    let value_out = tx.output_value_total().ok()?;
    if value_in < value_out {
        return None;
    }
    let fee = (value_in - value_out).ok()?;
    (total_fees + fee).ok()
}
