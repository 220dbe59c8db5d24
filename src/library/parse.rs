use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use super::item::{Item, ItemId, default_image_ref, default_link_ref, sanitize_weight};

const MINUTES_KEYS: [&str; 2] = ["minutesPlayed", "playtime_forever"];
const IMAGE_KEYS: [&str; 2] = ["imageRef", "img_icon_url"];

/// Coerces an upstream catalog payload into strict items.
///
/// Accepts a bare array or an object carrying a `games` array. Records
/// without a positive integer `appid` or a non-empty `name` are dropped.
pub fn parse_catalog(payload: &Value) -> Result<Vec<Item>> {
    let records = match payload {
        Value::Array(records) => records,
        Value::Object(object) => object
            .get("games")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("catalog object has no `games` array"))?,
        _ => return Err(anyhow!("unexpected JSON type for catalog payload")),
    };

    let items = records
        .iter()
        .filter_map(parse_catalog_record)
        .collect::<Vec<_>>();

    let dropped = records.len() - items.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = items.len(), "dropped malformed catalog records");
    }

    Ok(items)
}

pub fn parse_catalog_str(raw: &str) -> Result<Vec<Item>> {
    let payload: Value = serde_json::from_str(raw).context("invalid catalog JSON")?;
    parse_catalog(&payload)
}

fn parse_catalog_record(record: &Value) -> Option<Item> {
    let object = record.as_object()?;
    let id = parse_id(object.get("appid")?)?;
    let name = object
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())?
        .to_owned();

    let minutes = MINUTES_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_f64))
        .unwrap_or(0.0);

    let image_ref = IMAGE_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| default_image_ref(id));

    let link_ref = object
        .get("linkRef")
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| default_link_ref(id));

    Some(Item {
        id,
        name,
        weight: sanitize_weight(minutes / 60.0),
        image_ref,
        link_ref,
        is_manual: false,
    })
}

fn parse_id(value: &Value) -> Option<ItemId> {
    let id = match value {
        Value::Number(number) => number.as_u64()?,
        Value::String(text) => text.trim().parse::<ItemId>().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}
