//! レビュー表の行。表の上では全セルが文字列で、取り込み時に型付きの行へ変換する。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::CategorizationResult;

/// 表の列。順序も含めて固定。
pub const COLUMNS: [&str; 20] = [
    "recipe_index",
    "record_id",
    "original_title",
    "proposed_title",
    "title_needs_improvement",
    "is_recipe",
    "primary_category",
    "cuisine_type",
    "dietary_tags",
    "usage_tags",
    "quality_score",
    "content_summary",
    "confidence",
    "reasoning",
    "existing_tags",
    "corrected_title",
    "corrected_category",
    "corrected_is_recipe",
    "review_notes",
    "approved",
];

/// 複数値セルの区切り。
pub const LIST_SEPARATOR: &str = "; ";

/// 表の1行をそのまま文字列で保持する。フィールド順は [`COLUMNS`] と一致させる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRow {
    pub recipe_index: String,
    pub record_id: String,
    pub original_title: String,
    pub proposed_title: String,
    pub title_needs_improvement: String,
    pub is_recipe: String,
    pub primary_category: String,
    pub cuisine_type: String,
    pub dietary_tags: String,
    pub usage_tags: String,
    pub quality_score: String,
    pub content_summary: String,
    pub confidence: String,
    pub reasoning: String,
    pub existing_tags: String,
    pub corrected_title: String,
    pub corrected_category: String,
    pub corrected_is_recipe: String,
    pub review_notes: String,
    pub approved: String,
}

/// 行を型付きに変換できなかった理由。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("invalid recipe_index '{0}'")]
    InvalidIndex(String),
    #[error("recipe_index {0} is not in the analysis report")]
    UnknownIndex(usize),
    #[error("malformed row: {0}")]
    Malformed(String),
}

/// 取り込み用に型付けした行。修正欄は空なら `None`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub recipe_index: usize,
    pub record_id: String,
    pub original_title: String,
    pub primary_category: Option<String>,
    pub is_recipe: bool,
    pub corrected_title: Option<String>,
    pub corrected_category: Option<String>,
    pub corrected_is_recipe: Option<bool>,
    pub review_notes: Option<String>,
}

impl TableRow {
    /// 分類結果からエクスポート行を作る。修正欄は空のまま。
    #[must_use]
    pub fn from_result(result: &CategorizationResult) -> Self {
        Self {
            recipe_index: result.recipe_index.to_string(),
            record_id: result.record_id.clone(),
            original_title: result.original_title.clone(),
            proposed_title: result.proposed_title.clone().unwrap_or_default(),
            title_needs_improvement: result.title_needs_improvement.to_string(),
            is_recipe: result.is_recipe.to_string(),
            primary_category: result.primary_category.clone().unwrap_or_default(),
            cuisine_type: result.cuisine_type.clone().unwrap_or_default(),
            dietary_tags: result.dietary_tags.join(LIST_SEPARATOR),
            usage_tags: result.usage_tags.join(LIST_SEPARATOR),
            quality_score: score_cell(result.quality_score),
            content_summary: result.content_summary.clone().unwrap_or_default(),
            confidence: score_cell(result.confidence),
            reasoning: result.reasoning.clone(),
            existing_tags: result.existing_tags.join(LIST_SEPARATOR),
            ..Self::default()
        }
    }

    /// 型付きの行に変換する。`recipe_index` が空の行はレビュー対象外として `None`。
    ///
    /// 真偽値セルは `true`/`false` 以外なら未入力として扱う。
    ///
    /// # Errors
    /// インデックスが解釈できない場合は [`RowError`]。
    pub fn parse(&self) -> Result<Option<ReviewRow>, RowError> {
        let raw_index = self.recipe_index.trim();
        if raw_index.is_empty() {
            return Ok(None);
        }
        let recipe_index = raw_index
            .parse::<usize>()
            .map_err(|_| RowError::InvalidIndex(raw_index.to_string()))?;

        let is_recipe = parse_bool_cell(&self.is_recipe).unwrap_or(true);
        let corrected_is_recipe = parse_bool_cell(&self.corrected_is_recipe);

        Ok(Some(ReviewRow {
            recipe_index,
            record_id: self.record_id.clone(),
            original_title: self.original_title.clone(),
            primary_category: non_empty(&self.primary_category),
            is_recipe,
            corrected_title: non_empty(&self.corrected_title),
            corrected_category: non_empty(&self.corrected_category),
            corrected_is_recipe,
            review_notes: non_empty(&self.review_notes),
        }))
    }
}

/// 複数値セルを分解する。
#[must_use]
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(LIST_SEPARATOR.trim())
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn score_cell(score: u8) -> String {
    if score == 0 {
        String::new()
    } else {
        score.to_string()
    }
}

fn non_empty(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_bool_cell(cell: &str) -> Option<bool> {
    let trimmed = cell.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn result() -> CategorizationResult {
        CategorizationResult {
            recipe_index: 3,
            record_id: "rec-3".to_string(),
            original_title: "Chili".to_string(),
            existing_tags: vec!["Dinner".to_string(), "Winter".to_string()],
            is_recipe: true,
            primary_category: Some("Beef".to_string()),
            cuisine_type: None,
            dietary_tags: vec!["Gluten-Free".to_string(), "One Pot".to_string()],
            usage_tags: Vec::new(),
            quality_score: 0,
            title_needs_improvement: false,
            proposed_title: None,
            confidence: 4,
            reasoning: "beef chili".to_string(),
            content_summary: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn from_result_fills_original_columns_only() {
        let row = TableRow::from_result(&result());

        assert_eq!(row.recipe_index, "3");
        assert_eq!(row.is_recipe, "true");
        assert_eq!(row.dietary_tags, "Gluten-Free; One Pot");
        assert_eq!(row.existing_tags, "Dinner; Winter");
        assert_eq!(row.quality_score, "");
        assert_eq!(row.confidence, "4");
        assert!(row.corrected_title.is_empty());
        assert!(row.approved.is_empty());
        assert_eq!(split_list(&row.dietary_tags), vec!["Gluten-Free", "One Pot"]);
    }

    #[test]
    fn parse_round_trips_typed_originals() {
        let parsed = TableRow::from_result(&result())
            .parse()
            .expect("row should parse")
            .expect("row has an index");

        assert_eq!(parsed.recipe_index, 3);
        assert_eq!(parsed.primary_category.as_deref(), Some("Beef"));
        assert!(parsed.is_recipe);
        assert_eq!(parsed.corrected_is_recipe, None);
    }

    #[test]
    fn blank_index_is_skipped() {
        let row = TableRow {
            recipe_index: "  ".to_string(),
            corrected_title: "Ignored".to_string(),
            ..TableRow::default()
        };
        assert_eq!(row.parse(), Ok(None));
    }

    #[rstest]
    #[case("TRUE", Some(true))]
    #[case(" False ", Some(false))]
    #[case("", None)]
    #[case("yes", None)]
    #[case("1", None)]
    fn corrected_is_recipe_literals(#[case] cell: &str, #[case] expected: Option<bool>) {
        let row = TableRow {
            recipe_index: "0".to_string(),
            corrected_is_recipe: cell.to_string(),
            ..TableRow::default()
        };
        let parsed = row.parse().expect("parse").expect("indexed");
        assert_eq!(parsed.corrected_is_recipe, expected);
    }

    #[test]
    fn non_literal_original_is_recipe_defaults_to_true() {
        let row = TableRow {
            recipe_index: "2".to_string(),
            is_recipe: "maybe".to_string(),
            ..TableRow::default()
        };
        let parsed = row.parse().expect("parse").expect("indexed");
        assert!(parsed.is_recipe);
    }

    #[rstest]
    #[case("abc")]
    #[case("-1")]
    fn malformed_index_is_an_error(#[case] index: &str) {
        let row = TableRow {
            recipe_index: index.to_string(),
            corrected_is_recipe: "yes".to_string(),
            ..TableRow::default()
        };
        assert_eq!(row.parse(), Err(RowError::InvalidIndex(index.to_string())));
    }
}
