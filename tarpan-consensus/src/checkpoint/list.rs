//! Checkpoint lists for block verification.
//!
//! This is actually a bijective map, but since it is read-only, we use a
//! `BTreeMap`, and do the value uniqueness check on initialisation.

use std::{
    collections::{BTreeMap, HashSet},
    str::FromStr,
};

use lazy_static::lazy_static;

use tarpan_chain::block::{self, Height};

use crate::BoxError;

/// The hard-coded checkpoints for the main network.
///
/// Each line has one checkpoint, consisting of a `Height` and a
/// `block::Hash` in display order, separated by a single space.
const MAINNET_CHECKPOINTS: &str = include_str!("main-checkpoints.txt");

lazy_static! {
    static ref MAINNET: CheckpointList = MAINNET_CHECKPOINTS
        .parse()
        .expect("hard-coded checkpoint list parses and validates");
}

/// A list of block height and hash checkpoints.
///
/// Checkpoints should be chosen to avoid forks or chain reorganizations,
/// which only happen in the last few hundred blocks in the chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CheckpointList(BTreeMap<Height, block::Hash>);

/// Parses a checkpoint line into a [`Height`] and [`block::Hash`].
fn checkpoint_height_and_hash(checkpoint: &str) -> Result<(Height, block::Hash), BoxError> {
    let fields = checkpoint.split(' ').collect::<Vec<_>>();
    if let [height, hash] = fields[..] {
        Ok((height.parse()?, hash.parse()?))
    } else {
        Err(format!(
            "invalid checkpoint format: expected 2 space-separated fields but found {}: '{}'",
            fields.len(),
            checkpoint
        )
        .into())
    }
}

impl FromStr for CheckpointList {
    type Err = BoxError;

    /// Parse a string into a CheckpointList, one checkpoint per line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut checkpoint_list: Vec<(Height, block::Hash)> = Vec::new();

        for checkpoint in s.lines() {
            checkpoint_list.push(checkpoint_height_and_hash(checkpoint)?);
        }

        CheckpointList::from_list(checkpoint_list)
    }
}

impl CheckpointList {
    /// The hard-coded checkpoint list for the main network.
    pub fn mainnet() -> &'static CheckpointList {
        &MAINNET
    }

    /// Create a new checkpoint list from `list`.
    ///
    /// Checkpoint heights and checkpoint hashes must be unique. There must
    /// be a checkpoint for the genesis block at `Height(0)`. (All other
    /// checkpoints are optional.)
    pub(crate) fn from_list(
        list: impl IntoIterator<Item = (Height, block::Hash)>,
    ) -> Result<Self, BoxError> {
        // BTreeMap silently ignores duplicates, so we count the checkpoints
        // before adding them to the map
        let original_checkpoints: Vec<(Height, block::Hash)> = list.into_iter().collect();
        let original_len = original_checkpoints.len();

        let checkpoints: BTreeMap<Height, block::Hash> =
            original_checkpoints.into_iter().collect();

        // Check that the list starts with the genesis block
        match checkpoints.iter().next() {
            Some((Height(0), _hash)) => {}
            Some(_) => Err("checkpoints must start at the genesis block height 0")?,
            None => Err("there must be at least one checkpoint, for the genesis block")?,
        };

        // This check rejects duplicate heights, whether they have the same
        // or different hashes
        if checkpoints.len() != original_len {
            Err("checkpoint heights must be unique")?;
        }

        let block_hashes: HashSet<&block::Hash> = checkpoints.values().collect();
        if block_hashes.len() != original_len {
            Err("checkpoint hashes must be unique")?;
        }

        // Make sure all the hashes are valid. In Bitcoin, [0; 32] is the
        // null hash. It is also used as the parent hash of genesis blocks.
        if block_hashes.contains(&block::Hash([0; 32])) {
            Err("checkpoint list contains invalid checkpoint hash: found null hash")?;
        }

        Ok(CheckpointList(checkpoints))
    }

    /// Return true if there is a checkpoint at `height`.
    pub fn contains(&self, height: Height) -> bool {
        self.0.contains_key(&height)
    }

    /// Returns the hash corresponding to the checkpoint at `height`, or
    /// None if there is no checkpoint at that height.
    pub fn hash(&self, height: Height) -> Option<block::Hash> {
        self.0.get(&height).cloned()
    }

    /// Check a block hash against this list.
    ///
    /// Returns false only when `height` is checkpointed and `hash` does not
    /// match the tabulated value; a height with no checkpoint passes.
    pub fn validate(&self, height: Height, hash: block::Hash) -> bool {
        match self.hash(height) {
            Some(expected) => expected == hash,
            None => true,
        }
    }

    /// Return the block height of the highest checkpoint in the list.
    ///
    /// If there is only a single checkpoint, then the maximum height will
    /// be zero. (The genesis block.)
    pub fn max_height(&self) -> Height {
        self.0
            .keys()
            .next_back()
            .cloned()
            .expect("checkpoint lists must have at least one checkpoint")
    }

    /// Returns the number of checkpoints in the list.
    //
    // Checkpoint lists are never empty by construction.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
