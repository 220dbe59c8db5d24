use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::item::{ItemId, ManualEntry};
use super::merge::{MergeError, MergeMap};

/// User-owned state: merge edges, hidden ids and manual items.
///
/// All edits go through `&mut self`; a rejected edit leaves the value as it was.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub merges: MergeMap,
    #[serde(default)]
    pub hidden: BTreeSet<ItemId>,
    #[serde(default)]
    pub manual: Vec<ManualEntry>,
}

impl Session {
    pub fn add_merge(
        &mut self,
        from: ItemId,
        to: ItemId,
        known: impl Fn(ItemId) -> bool,
    ) -> Result<(), MergeError> {
        match self.merges.add(from, to, known) {
            Ok(()) => {
                tracing::info!(from, to, "merge committed");
                Ok(())
            }
            Err(error) => {
                tracing::warn!(from, to, %error, "merge rejected");
                Err(error)
            }
        }
    }

    pub fn remove_merge(&mut self, from: ItemId) -> bool {
        self.merges.remove(from)
    }

    pub fn hide(&mut self, id: ItemId) -> bool {
        self.hidden.insert(id)
    }

    pub fn unhide(&mut self, id: ItemId) -> bool {
        self.hidden.remove(&id)
    }

    pub fn is_hidden(&self, id: ItemId) -> bool {
        self.hidden.contains(&id)
    }

    /// Inserts or replaces the manual entry with the same appid.
    pub fn upsert_manual(&mut self, entry: ManualEntry) {
        match self
            .manual
            .iter_mut()
            .find(|existing| existing.appid == entry.appid)
        {
            Some(existing) => *existing = entry,
            None => self.manual.push(entry),
        }
    }

    pub fn remove_manual(&mut self, appid: ItemId) -> bool {
        let before = self.manual.len();
        self.manual.retain(|entry| entry.appid != appid);
        self.manual.len() != before
    }
}
