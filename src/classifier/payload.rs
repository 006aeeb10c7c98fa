//! 応答JSONオブジェクトから型付きの分類結果を組み立てる。
//!
//! サービスの応答は型が揺れるため、真偽値や数値の文字列表現も受け入れる。
//! 解釈できない値は未設定として扱い、既知でないキーは `extra` に残す。

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::domain::{CategorizationResult, RecipeRecord};

const KNOWN_KEYS: [&str; 11] = [
    "is_recipe",
    "content_summary",
    "title_needs_improvement",
    "proposed_title",
    "quality_score",
    "primary_category",
    "cuisine_type",
    "dietary_tags",
    "usage_tags",
    "confidence",
    "reasoning",
];

/// 解析済みペイロードにレコード情報を刻印して分類結果を作る。
#[must_use]
pub fn into_result(record: &RecipeRecord, mut payload: Map<String, Value>) -> CategorizationResult {
    let is_recipe = payload.get("is_recipe").and_then(as_bool).unwrap_or(true);
    let title_needs_improvement = payload
        .get("title_needs_improvement")
        .and_then(as_bool)
        .unwrap_or(false);
    let proposed_title = if title_needs_improvement {
        payload.get("proposed_title").and_then(as_text)
    } else {
        None
    };
    let quality_score = payload.get("quality_score").map_or(0, as_score);
    let confidence = payload.get("confidence").map_or(0, as_score);

    let result = CategorizationResult {
        recipe_index: record.index,
        record_id: record.record_id.clone(),
        original_title: record.title.clone(),
        existing_tags: record.tags.clone(),
        is_recipe,
        primary_category: payload.get("primary_category").and_then(as_text),
        cuisine_type: payload.get("cuisine_type").and_then(as_text),
        dietary_tags: payload.get("dietary_tags").map(as_tags).unwrap_or_default(),
        usage_tags: payload.get("usage_tags").map(as_tags).unwrap_or_default(),
        quality_score,
        title_needs_improvement,
        proposed_title,
        confidence,
        reasoning: payload
            .get("reasoning")
            .and_then(as_text)
            .unwrap_or_default(),
        content_summary: payload.get("content_summary").and_then(as_text),
        extra: BTreeMap::new(),
    };

    for key in KNOWN_KEYS {
        payload.remove(key);
    }
    CategorizationResult {
        extra: payload.into_iter().collect(),
        ..result
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64)),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// 1〜5 の範囲外や解釈できない値は 0（未設定）。
fn as_score(value: &Value) -> u8 {
    as_integer(value)
        .and_then(|score| u8::try_from(score).ok())
        .filter(|score| (1..=5).contains(score))
        .unwrap_or(0)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

fn as_tags(value: &Value) -> Vec<String> {
    let candidates: Vec<&str> = match value {
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::String(single) => vec![single.as_str()],
        _ => Vec::new(),
    };

    let mut tags: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let tag = candidate.trim();
        if !tag.is_empty() && !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}
