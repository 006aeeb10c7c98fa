/// Prometheusメトリクス定義。
use prometheus::{
    Counter, Histogram, Registry, register_counter_with_registry,
    register_histogram_with_registry,
};
use std::sync::Arc;

/// メトリクスコレクター。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub records_attempted: Counter,
    pub records_categorized: Counter,
    pub records_failed: Counter,
    pub incomplete_payloads: Counter,
    pub batches_completed: Counter,

    // ヒストグラム
    pub classification_duration: Histogram,
    pub run_duration: Histogram,
}

impl Metrics {
    /// 新しいメトリクスコレクターを作成する。
    ///
    /// # Errors
    /// 同名のメトリクスが既に登録されている場合。
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            records_attempted: register_counter_with_registry!(
                "recipe_analyzer_records_attempted_total",
                "Total number of records sent to the classification service",
                registry
            )?,
            records_categorized: register_counter_with_registry!(
                "recipe_analyzer_records_categorized_total",
                "Total number of records categorized successfully",
                registry
            )?,
            records_failed: register_counter_with_registry!(
                "recipe_analyzer_records_failed_total",
                "Total number of records recorded as failed analyses",
                registry
            )?,
            incomplete_payloads: register_counter_with_registry!(
                "recipe_analyzer_incomplete_payloads_total",
                "Number of content-review responses missing required keys",
                registry
            )?,
            batches_completed: register_counter_with_registry!(
                "recipe_analyzer_batches_completed_total",
                "Total number of batches completed",
                registry
            )?,
            classification_duration: register_histogram_with_registry!(
                "recipe_analyzer_classification_duration_seconds",
                "Latency of a single classification call",
                vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0],
                registry
            )?,
            run_duration: register_histogram_with_registry!(
                "recipe_analyzer_run_duration_seconds",
                "Duration of a full analysis run",
                vec![1.0, 10.0, 60.0, 300.0, 900.0, 3600.0],
                registry
            )?,
        })
    }
}
