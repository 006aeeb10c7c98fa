use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::recipe::RecipeRecord;

/// 分類サービスに要求する出力の範囲。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// カテゴリ・料理ジャンル・タグのみ。
    Basic,
    /// 上記に加えてレシピ判定・タイトル改善・品質スコアを求める。
    #[default]
    ContentReview,
}

impl AnalysisMode {
    #[must_use]
    pub fn is_content_review(self) -> bool {
        matches!(self, Self::ContentReview)
    }
}

/// 1レシピの分類結果。生成後は変更しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationResult {
    pub recipe_index: usize,
    pub record_id: String,
    pub original_title: String,
    pub existing_tags: Vec<String>,
    #[serde(default = "default_true")]
    pub is_recipe: bool,
    pub primary_category: Option<String>,
    pub cuisine_type: Option<String>,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default)]
    pub usage_tags: Vec<String>,
    /// 1〜5。0 は未設定。
    #[serde(default)]
    pub quality_score: u8,
    #[serde(default)]
    pub title_needs_improvement: bool,
    #[serde(default)]
    pub proposed_title: Option<String>,
    /// 1〜5。0 は未設定。
    #[serde(default)]
    pub confidence: u8,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_summary: Option<String>,
    /// 語彙拡張などで返ってきた未知のキー。
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

fn default_true() -> bool {
    true
}

impl CategorizationResult {
    /// レビューで優先的に確認すべき結果かどうか。
    ///
    /// 未設定の品質スコア（0）は低品質とみなさない。
    #[must_use]
    pub fn needs_attention(&self) -> bool {
        !self.is_recipe || self.title_needs_improvement || self.has_low_quality(3)
    }

    /// `0 < quality_score < below` のとき true。
    #[must_use]
    pub fn has_low_quality(&self, below: u8) -> bool {
        self.quality_score > 0 && self.quality_score < below
    }
}

/// 分類結果を得られなかったレコード。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAnalysis {
    pub recipe_index: usize,
    pub title: String,
    pub existing_tags: Vec<String>,
    pub kind: FailureKind,
    pub reason: String,
}

impl FailedAnalysis {
    #[must_use]
    pub fn for_record(record: &RecipeRecord, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            recipe_index: record.index,
            title: record.title.clone(),
            existing_tags: record.tags.clone(),
            kind,
            reason: reason.into(),
        }
    }
}

/// レコード単位の終端失敗の種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TimedOut,
    ServiceError,
    InvalidJson,
    IncompletePayload,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TimedOut => "timed_out",
            Self::ServiceError => "service_error",
            Self::InvalidJson => "invalid_json",
            Self::IncompletePayload => "incomplete_payload",
        }
    }
}

/// ワーカーが呼び出し元に返す結果。集計側はこれをパターンマッチで畳み込む。
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Categorized(Box<CategorizationResult>),
    Failed(FailedAnalysis),
}

impl AnalysisOutcome {
    #[must_use]
    pub fn recipe_index(&self) -> usize {
        match self {
            Self::Categorized(result) => result.recipe_index,
            Self::Failed(failed) => failed.recipe_index,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Categorized(_))
    }
}
