//! 分類結果の畳み込み集計。I/Oを持たない純粋な処理。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{AnalysisMode, AnalysisOutcome, CategorizationResult, FailedAnalysis};

/// 品質関連の集計値。コンテンツレビューモード以外では0のまま。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentQualityStats {
    pub non_recipes: usize,
    pub titles_needing_improvement: usize,
    /// スコア > 0 のレコードのみの平均。該当なしなら0。
    pub average_quality_score: f64,
    pub quality_distribution: BTreeMap<u8, usize>,
}

/// 1回の分析実行の集計結果。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub total_analyzed: usize,
    pub total_attempted: usize,
    #[serde(default)]
    pub mode: AnalysisMode,
    pub category_distribution: BTreeMap<String, usize>,
    pub cuisine_distribution: BTreeMap<String, usize>,
    pub dietary_tags_distribution: BTreeMap<String, usize>,
    pub usage_tags_distribution: BTreeMap<String, usize>,
    pub content_quality_stats: ContentQualityStats,
    pub failed_analyses: Vec<FailedAnalysis>,
    #[serde(default)]
    pub categorizations: Vec<CategorizationResult>,
}

impl AggregateReport {
    /// 成功率（%）。試行0件なら0。
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total_attempted == 0 {
            return 0.0;
        }
        self.total_analyzed as f64 / self.total_attempted as f64 * 100.0
    }
}

/// ワーカーの結果を1件ずつ受け取り、レポートを組み立てる。
#[derive(Debug)]
pub struct ResultAggregator {
    report: AggregateReport,
    quality_sum: u64,
    quality_count: u64,
}

impl ResultAggregator {
    #[must_use]
    pub fn new(mode: AnalysisMode) -> Self {
        Self {
            report: AggregateReport {
                mode,
                ..AggregateReport::default()
            },
            quality_sum: 0,
            quality_count: 0,
        }
    }

    /// 結果を1件取り込む。
    pub fn record(&mut self, outcome: AnalysisOutcome) {
        let report = &mut self.report;
        report.total_attempted += 1;

        let result = match outcome {
            AnalysisOutcome::Categorized(result) => result,
            AnalysisOutcome::Failed(failed) => {
                report.failed_analyses.push(failed);
                return;
            }
        };

        report.total_analyzed += 1;
        if let Some(category) = &result.primary_category {
            bump(&mut report.category_distribution, category);
        }
        if let Some(cuisine) = &result.cuisine_type {
            bump(&mut report.cuisine_distribution, cuisine);
        }
        for tag in &result.dietary_tags {
            bump(&mut report.dietary_tags_distribution, tag);
        }
        for tag in &result.usage_tags {
            bump(&mut report.usage_tags_distribution, tag);
        }

        if report.mode.is_content_review() {
            let stats = &mut report.content_quality_stats;
            if !result.is_recipe {
                stats.non_recipes += 1;
            }
            if result.title_needs_improvement {
                stats.titles_needing_improvement += 1;
            }
            if result.quality_score > 0 {
                *stats
                    .quality_distribution
                    .entry(result.quality_score)
                    .or_insert(0) += 1;
                self.quality_sum += u64::from(result.quality_score);
                self.quality_count += 1;
            }
        }

        report.categorizations.push(*result);
    }

    /// 平均品質スコアを確定してレポートを返す。
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn finish(mut self) -> AggregateReport {
        if self.quality_count > 0 {
            self.report.content_quality_stats.average_quality_score =
                self.quality_sum as f64 / self.quality_count as f64;
        }
        self.report
    }
}

fn bump(distribution: &mut BTreeMap<String, usize>, key: &str) {
    *distribution.entry(key.to_string()).or_insert(0) += 1;
}
