/// 分類サービス応答のJSON Schema定義。
use once_cell::sync::Lazy;
use serde_json::{Value, json};

/// コンテンツレビューモードで必須のキー。
pub(crate) const CONTENT_REVIEW_REQUIRED_KEYS: [&str; 6] = [
    "is_recipe",
    "content_summary",
    "title_needs_improvement",
    "proposed_title",
    "quality_score",
    "primary_category",
];

/// コンテンツレビューモードの応答スキーマ。
///
/// キーの有無だけを契約として扱う。値の型は抽出側が緩く解釈する。
pub(crate) static CONTENT_REVIEW_RESPONSE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://recipe-analyzer.local/schemas/categorization/content-review.json",
        "title": "Recipe Categorization Response (content review)",
        "type": "object",
        "required": CONTENT_REVIEW_REQUIRED_KEYS
    })
});
