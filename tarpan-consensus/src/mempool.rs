//! Read-only snapshots of the unconfirmed transaction pool.
//!
//! The transaction verifier checks candidates against a [`Snapshot`] taken
//! at a consistent instant; the pool must not be re-indexed while a
//! verification that borrowed the snapshot is still running. Snapshots are
//! cheap to clone and keep the pool's insertion order.

use std::sync::Arc;

use tarpan_chain::{
    transaction::{self, Transaction},
    transparent,
};

/// A pending transaction and its precomputed hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// The hash of `transaction`.
    pub hash: transaction::Hash,

    /// The pending transaction.
    pub transaction: Arc<Transaction>,
}

impl Entry {
    /// Create a pool entry for `transaction`, computing its hash.
    pub fn new(transaction: Arc<Transaction>) -> Entry {
        Entry {
            hash: transaction.hash(),
            transaction,
        }
    }
}

/// An ordered, immutable view of the pending transactions in the pool.
#[derive(Clone, Debug)]
pub struct Snapshot {
    entries: Arc<[Entry]>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            entries: Vec::new().into(),
        }
    }
}

impl Snapshot {
    /// Returns the pool transaction with `hash`, if it is in this snapshot.
    pub fn transaction(&self, hash: &transaction::Hash) -> Option<&Arc<Transaction>> {
        self.entries
            .iter()
            .find(|entry| entry.hash == *hash)
            .map(|entry| &entry.transaction)
    }

    /// Returns true if a transaction with `hash` is in this snapshot.
    pub fn contains(&self, hash: &transaction::Hash) -> bool {
        self.transaction(hash).is_some()
    }

    /// Returns true if any pool transaction already spends `outpoint`.
    pub fn spends(&self, outpoint: &transparent::OutPoint) -> bool {
        self.entries.iter().any(|entry| {
            entry
                .transaction
                .inputs
                .iter()
                .any(|input| input.previous_output == *outpoint)
        })
    }

    /// The number of transactions in this snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if this snapshot has no transactions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries, in pool order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}

impl std::iter::FromIterator<Entry> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Snapshot {
            entries: iter.into_iter().collect::<Vec<_>>().into(),
        }
    }
}

impl std::iter::FromIterator<Arc<Transaction>> for Snapshot {
    fn from_iter<I: IntoIterator<Item = Arc<Transaction>>>(iter: I) -> Self {
        iter.into_iter().map(Entry::new).collect()
    }
}
