use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::CategorizationResult;

const LOW_SCORE_THRESHOLD: u8 = 2;

/// レビューで確認すべき観点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MarkedAsNonRecipe,
    TitleNeedsImprovement,
    LowQuality,
    LowConfidence,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPriorities {
    pub non_recipes: usize,
    pub title_improvements: usize,
    pub low_quality: usize,
    pub low_confidence: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialIssue {
    pub recipe_index: usize,
    pub title: String,
    pub issues: Vec<IssueKind>,
    pub reasoning: String,
}

/// 分類結果全体のレビュー用サマリー。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub generated_at: DateTime<Utc>,
    pub total_recipes: usize,
    pub review_priorities: ReviewPriorities,
    pub category_distribution: BTreeMap<String, usize>,
    pub potential_issues: Vec<PotentialIssue>,
}

impl ReviewSummary {
    /// 未設定（0）のスコアは低品質・低信頼度に数えない。
    #[must_use]
    pub fn build(categorizations: &[CategorizationResult], generated_at: DateTime<Utc>) -> Self {
        let mut priorities = ReviewPriorities::default();
        let mut category_distribution = BTreeMap::new();
        let mut potential_issues = Vec::new();

        for result in categorizations {
            let category = result.primary_category.as_deref().unwrap_or("Unknown");
            *category_distribution.entry(category.to_string()).or_insert(0) += 1;

            let issues = issue_kinds(result);
            for issue in &issues {
                match issue {
                    IssueKind::MarkedAsNonRecipe => priorities.non_recipes += 1,
                    IssueKind::TitleNeedsImprovement => priorities.title_improvements += 1,
                    IssueKind::LowQuality => priorities.low_quality += 1,
                    IssueKind::LowConfidence => priorities.low_confidence += 1,
                }
            }
            if !issues.is_empty() {
                potential_issues.push(PotentialIssue {
                    recipe_index: result.recipe_index,
                    title: result.original_title.clone(),
                    issues,
                    reasoning: result.reasoning.clone(),
                });
            }
        }

        Self {
            generated_at,
            total_recipes: categorizations.len(),
            review_priorities: priorities,
            category_distribution,
            potential_issues,
        }
    }
}

fn issue_kinds(result: &CategorizationResult) -> Vec<IssueKind> {
    let mut issues = Vec::new();
    if !result.is_recipe {
        issues.push(IssueKind::MarkedAsNonRecipe);
    }
    if result.title_needs_improvement {
        issues.push(IssueKind::TitleNeedsImprovement);
    }
    if result.has_low_quality(LOW_SCORE_THRESHOLD + 1) {
        issues.push(IssueKind::LowQuality);
    }
    if result.confidence > 0 && result.confidence <= LOW_SCORE_THRESHOLD {
        issues.push(IssueKind::LowConfidence);
    }
    issues
}
