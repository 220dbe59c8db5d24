use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::item::ItemId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("cannot merge item {from} into {to}: items must differ and both must exist")]
    InvalidMerge { from: ItemId, to: ItemId },
    #[error("merging item {from} into {to} would create a loop")]
    MergeCycle { from: ItemId, to: ItemId },
}

/// Directed "fold `from` into `to`" edges, keyed by `from`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<ItemId, ItemId>", into = "BTreeMap<ItemId, ItemId>")]
pub struct MergeMap {
    edges: BTreeMap<ItemId, ItemId>,
}

impl From<BTreeMap<ItemId, ItemId>> for MergeMap {
    fn from(stored: BTreeMap<ItemId, ItemId>) -> Self {
        let mut merges = Self::new();
        for (from, to) in stored {
            if let Err(error) = merges.add(from, to, |_| true) {
                tracing::warn!(from, to, %error, "dropping stored merge");
            }
        }
        merges
    }
}

impl From<MergeMap> for BTreeMap<ItemId, ItemId> {
    fn from(merges: MergeMap) -> Self {
        merges.edges
    }
}

impl MergeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn target_of(&self, from: ItemId) -> Option<ItemId> {
        self.edges.get(&from).copied()
    }

    pub fn root_of(&self, id: ItemId) -> ItemId {
        resolve_root(id, &self.edges)
    }

    pub fn add(
        &mut self,
        from: ItemId,
        to: ItemId,
        known: impl Fn(ItemId) -> bool,
    ) -> Result<(), MergeError> {
        if from == to || !known(from) || !known(to) {
            return Err(MergeError::InvalidMerge { from, to });
        }

        if self.would_cycle(from, to) {
            return Err(MergeError::MergeCycle { from, to });
        }

        self.edges.insert(from, to);
        Ok(())
    }

    /// Returns whether an edge was removed.
    pub fn remove(&mut self, from: ItemId) -> bool {
        self.edges.remove(&from).is_some()
    }

    pub fn retain_known(&mut self, known: impl Fn(ItemId) -> bool) -> usize {
        let before = self.edges.len();
        self.edges.retain(|&from, &mut to| known(from) && known(to));
        before - self.edges.len()
    }

    fn would_cycle(&self, from: ItemId, to: ItemId) -> bool {
        // Walk `to`'s chain as if `from -> to` were already committed.
        let mut visited = HashSet::new();
        let mut cursor = to;
        loop {
            if cursor == from {
                return true;
            }
            if !visited.insert(cursor) {
                return false;
            }
            match self.edges.get(&cursor) {
                Some(&next) => cursor = next,
                None => return false,
            }
        }
    }
}

/// Follows merge edges from `id` to its terminal root.
pub fn resolve_root(id: ItemId, edges: &BTreeMap<ItemId, ItemId>) -> ItemId {
    let mut visited = HashSet::new();
    let mut cursor = id;
    visited.insert(cursor);

    while let Some(&next) = edges.get(&cursor) {
        if !visited.insert(next) {
            break;
        }
        cursor = next;
    }

    cursor
}
