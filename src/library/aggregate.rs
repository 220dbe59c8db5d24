use std::collections::{BTreeSet, HashMap};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::item::{
    Item, ItemId, ManualEntry, default_image_ref, default_link_ref, rank_order, sanitize_weight,
};
use super::session::Session;

pub const MIN_SELECTION: usize = 5;

#[derive(Clone, Debug, Default)]
pub struct Aggregation {
    unmerged: Vec<Item>,
    index_by_id: HashMap<ItemId, usize>,
    root_by_id: HashMap<ItemId, ItemId>,
    canonical: Vec<Item>,
}

impl Aggregation {
    pub fn build(catalog: &[Item], session: &Session) -> Self {
        let (unmerged, index_by_id) = unmerged_items(catalog, &session.manual);

        let mut root_by_id = HashMap::with_capacity(unmerged.len());
        let mut group_by_root: HashMap<ItemId, usize> = HashMap::new();
        let mut groups: Vec<MergeGroup> = Vec::new();

        for (index, item) in unmerged.iter().enumerate() {
            let root = session.merges.root_of(item.id);
            root_by_id.insert(item.id, root);

            let group_index = *group_by_root.entry(root).or_insert_with(|| {
                groups.push(MergeGroup {
                    root,
                    weight: 0.0,
                    first_catalog: None,
                    first_manual: None,
                });
                groups.len() - 1
            });

            let group = &mut groups[group_index];
            group.weight += item.weight;
            if item.is_manual {
                group.first_manual.get_or_insert(index);
            } else {
                group.first_catalog.get_or_insert(index);
            }
        }

        let canonical = groups
            .into_iter()
            .filter_map(|group| {
                let meta = group.first_catalog.or(group.first_manual)?;
                let source = &unmerged[meta];
                Some(Item {
                    id: group.root,
                    weight: sanitize_weight(group.weight),
                    ..source.clone()
                })
            })
            .collect::<Vec<_>>();

        Self {
            unmerged,
            index_by_id,
            root_by_id,
            canonical,
        }
    }

    pub fn unmerged(&self) -> &[Item] {
        &self.unmerged
    }

    pub fn canonical(&self) -> &[Item] {
        &self.canonical
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index_by_id.contains_key(&id)
    }

    pub fn root_of(&self, id: ItemId) -> Option<ItemId> {
        self.root_by_id.get(&id).copied()
    }

    pub fn merge_members(&self, root: ItemId) -> Vec<ItemId> {
        self.unmerged
            .iter()
            .filter(|item| self.root_by_id.get(&item.id) == Some(&root))
            .map(|item| item.id)
            .collect()
    }

    pub fn visible_pool(&self, hidden: &BTreeSet<ItemId>) -> Vec<Item> {
        self.canonical
            .iter()
            .filter(|item| !hidden.contains(&item.id))
            .cloned()
            .collect()
    }

    /// Fuzzy name search over the unmerged set, best match first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Item> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .unmerged
            .iter()
            .filter_map(|item| {
                fuzzy_match_score(&matcher, &item.name, query).map(|score| (score, item))
            })
            .collect::<Vec<_>>();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        scored.truncate(limit);
        scored.into_iter().map(|(_, item)| item).collect()
    }
}

struct MergeGroup {
    root: ItemId,
    weight: f64,
    first_catalog: Option<usize>,
    first_manual: Option<usize>,
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn unmerged_items(
    catalog: &[Item],
    manual: &[ManualEntry],
) -> (Vec<Item>, HashMap<ItemId, usize>) {
    let mut items = Vec::with_capacity(catalog.len() + manual.len());
    let mut index_by_id = HashMap::with_capacity(catalog.len() + manual.len());

    for item in catalog {
        if index_by_id.contains_key(&item.id) {
            continue;
        }
        index_by_id.insert(item.id, items.len());
        items.push(item.with_weight(item.weight));
    }

    for entry in manual {
        if entry.appid == 0 {
            continue;
        }

        if let Some(&index) = index_by_id.get(&entry.appid) {
            let existing: &mut Item = &mut items[index];
            if existing.is_manual {
                continue;
            }
            if existing.image_ref.is_empty()
                && let Some(image_ref) = &entry.image_ref
            {
                existing.image_ref = image_ref.clone();
            }
            continue;
        }

        index_by_id.insert(entry.appid, items.len());
        items.push(manual_item(entry));
    }

    (items, index_by_id)
}

fn manual_item(entry: &ManualEntry) -> Item {
    let name = entry
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("App {}", entry.appid));

    let image_ref = entry
        .image_ref
        .clone()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default_image_ref(entry.appid));

    Item {
        id: entry.appid,
        name,
        weight: sanitize_weight(entry.hours),
        image_ref,
        link_ref: default_link_ref(entry.appid),
        is_manual: true,
    }
}

/// Ranks `pool` by weight (ties by id) and keeps the first `max(5, n)`
/// entries unless `show_all` is set.
pub fn top_n(pool: &[Item], n: usize, show_all: bool) -> Vec<Item> {
    let mut ranked = pool.to_vec();
    ranked.sort_by(rank_order);
    if !show_all {
        ranked.truncate(n.max(MIN_SELECTION));
    }
    ranked
}
