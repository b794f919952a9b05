use serde_json::{Map, Value};

use crate::model::{
    Category, CharacterRecord, CharacterStatus, EpisodeRecord, ListPage, LocationRecord, Record,
};

fn has_string(obj: &Map<String, Value>, key: &str) -> bool {
    matches!(obj.get(key), Some(Value::String(_)))
}

fn has_strings(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().all(|k| has_string(obj, k))
}

pub fn is_character(data: &Value) -> bool {
    let Some(obj) = data.as_object() else {
        return false;
    };
    if !has_strings(obj, &["name", "species", "gender", "image"]) {
        return false;
    }
    let status_ok = obj
        .get("status")
        .and_then(Value::as_str)
        .map(|s| CharacterStatus::TAGS.contains(&s))
        .unwrap_or(false);
    let origin_ok = obj
        .get("origin")
        .and_then(Value::as_object)
        .map(|origin| has_string(origin, "name"))
        .unwrap_or(false);
    status_ok && origin_ok
}

pub fn is_location(data: &Value) -> bool {
    data.as_object()
        .map(|obj| has_strings(obj, &["name", "type", "dimension"]))
        .unwrap_or(false)
}

pub fn is_episode(data: &Value) -> bool {
    data.as_object()
        .map(|obj| has_strings(obj, &["air_date", "name", "episode"]))
        .unwrap_or(false)
}

fn is_array_of(data: &Value, pred: fn(&Value) -> bool) -> bool {
    data.as_array()
        .map(|items| items.iter().all(pred))
        .unwrap_or(false)
}

pub fn is_character_arr(data: &Value) -> bool {
    is_array_of(data, is_character)
}

pub fn is_location_arr(data: &Value) -> bool {
    is_array_of(data, is_location)
}

pub fn is_episode_arr(data: &Value) -> bool {
    is_array_of(data, is_episode)
}

pub fn is_record_arr(category: Category, data: &Value) -> bool {
    match category {
        Category::Characters => is_character_arr(data),
        Category::Locations => is_location_arr(data),
        Category::Episodes => is_episode_arr(data),
    }
}

/// Reads `info.pages` as a non-negative whole number.
pub fn page_count(data: &Value) -> Option<u32> {
    let pages = data.as_object()?.get("info")?.as_object()?.get("pages")?;
    if let Some(n) = pages.as_u64() {
        return u32::try_from(n).ok();
    }
    let f = pages.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) {
        Some(f as u32)
    } else {
        None
    }
}

pub fn is_list_response(data: &Value) -> bool {
    let Some(results) = data.as_object().and_then(|obj| obj.get("results")) else {
        return false;
    };
    (is_character_arr(results) || is_location_arr(results) || is_episode_arr(results))
        && page_count(data).is_some()
}

pub fn is_list_response_for(category: Category, data: &Value) -> bool {
    let Some(results) = data.as_object().and_then(|obj| obj.get("results")) else {
        return false;
    };
    is_record_arr(category, results) && page_count(data).is_some()
}

/// Validates `data` as `category`'s envelope and converts it into typed records.
pub fn decode_envelope(category: Category, data: Value) -> Option<ListPage> {
    if !is_list_response_for(category, &data) {
        return None;
    }
    let total_pages = page_count(&data)?;
    let results = match data {
        Value::Object(mut obj) => obj.remove("results")?,
        _ => return None,
    };
    let records = match category {
        Category::Characters => serde_json::from_value::<Vec<CharacterRecord>>(results)
            .ok()?
            .into_iter()
            .map(Record::Character)
            .collect(),
        Category::Locations => serde_json::from_value::<Vec<LocationRecord>>(results)
            .ok()?
            .into_iter()
            .map(Record::Location)
            .collect(),
        Category::Episodes => serde_json::from_value::<Vec<EpisodeRecord>>(results)
            .ok()?
            .into_iter()
            .map(Record::Episode)
            .collect(),
    };
    Some(ListPage {
        records,
        total_pages,
    })
}
