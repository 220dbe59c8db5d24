use serde::{Deserialize, Serialize};

pub type ItemId = u64;

/// A weighted library entry. Weight is hours played.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub weight: f64,
    pub image_ref: String,
    pub link_ref: String,
    pub is_manual: bool,
}

impl Item {
    pub fn with_weight(&self, weight: f64) -> Self {
        Self {
            weight: sanitize_weight(weight),
            ..self.clone()
        }
    }
}

/// A user-entered item, persisted with the session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub appid: ItemId,
    #[serde(default)]
    pub hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

pub fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

pub fn default_image_ref(id: ItemId) -> String {
    format!("https://cdn.cloudflare.steamstatic.com/steam/apps/{id}/header.jpg")
}

pub fn default_link_ref(id: ItemId) -> String {
    format!("https://store.steampowered.com/app/{id}")
}

/// Weight descending, ties by ascending id.
pub fn rank_order(a: &Item, b: &Item) -> std::cmp::Ordering {
    b.weight
        .total_cmp(&a.weight)
        .then_with(|| a.id.cmp(&b.id))
}
