use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::classifier::CategorizationWorker;
use crate::clients::ClassificationService;
use crate::domain::RecipeRecord;
use crate::observability::metrics::Metrics;

use super::aggregate::{AggregateReport, ResultAggregator};
use super::batch::BatchScheduler;
use super::select::WorkingSet;

/// 選択済みの処理対象をバッチ単位で順に分類し、集計レポートを返す。
///
/// 個々のレコードの失敗は実行を止めない。常にベストエフォートのレポートを返す。
pub struct AnalysisPipeline<C: ?Sized> {
    worker: CategorizationWorker<C>,
    scheduler: BatchScheduler,
    metrics: Option<Arc<Metrics>>,
}

impl<C> AnalysisPipeline<C>
where
    C: ClassificationService + ?Sized,
{
    #[must_use]
    pub fn new(worker: CategorizationWorker<C>, scheduler: BatchScheduler) -> Self {
        Self {
            worker,
            scheduler,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.worker = self.worker.with_metrics(Arc::clone(&metrics));
        self.metrics = Some(metrics);
        self
    }

    /// 処理対象を分類する。
    pub async fn run(&self, records: &[RecipeRecord], working_set: &WorkingSet) -> AggregateReport {
        let started = Instant::now();
        let batches = self.scheduler.plan(&working_set.indices);
        let batch_count = batches.len();
        let mut aggregator = ResultAggregator::new(self.worker.mode());

        info!(
            records = working_set.len(),
            batches = batch_count,
            policy = ?working_set.policy,
            mode = ?self.worker.mode(),
            "starting categorization run"
        );

        for (position, batch) in batches.iter().enumerate() {
            let batch_number = position + 1;
            info!(
                batch = batch_number,
                of = batch_count,
                size = batch.len(),
                first_index = batch.first().copied(),
                "processing batch"
            );

            for &index in *batch {
                let Some(record) = records.get(index) else {
                    error!(recipe_index = index, "selected index is outside the collection");
                    continue;
                };
                if let Some(metrics) = &self.metrics {
                    metrics.records_attempted.inc();
                }

                let outcome = self.worker.categorize(record).await;
                if let Some(metrics) = &self.metrics {
                    if outcome.is_success() {
                        metrics.records_categorized.inc();
                    } else {
                        metrics.records_failed.inc();
                    }
                }
                aggregator.record(outcome);
            }

            if let Some(metrics) = &self.metrics {
                metrics.batches_completed.inc();
            }
            if batch_number < batch_count {
                self.scheduler.pause().await;
            }
        }

        let report = aggregator.finish();
        if let Some(metrics) = &self.metrics {
            metrics.run_duration.observe(started.elapsed().as_secs_f64());
        }
        info!(
            attempted = report.total_attempted,
            analyzed = report.total_analyzed,
            failed = report.failed_analyses.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "categorization run finished"
        );
        report
    }
}
