//! サブコマンドの実行。設定・入出力・パイプラインを組み合わせる。

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::classifier::{CategorizationWorker, PromptBuilder};
use crate::cli::{AnalyzeArgs, ReviewCommand};
use crate::clients::AzureOpenAiClient;
use crate::config::Config;
use crate::domain::Vocabulary;
use crate::error::AnalyzerError;
use crate::observability::Telemetry;
use crate::pipeline::{AnalysisPipeline, BatchScheduler, CollectionStats};
use crate::review::{ExportFilter, ReviewSummary, export_review_table, import_corrections};
use crate::storage::{self, AnalysisDocument};

/// `analyze` サブコマンド。
///
/// 選択条件と設定の誤りはレコードを1件も処理する前にエラーにする。
///
/// # Errors
/// 設定・選択条件の誤り、入出力の失敗。
pub async fn run_analyze(config: &Config, args: &AnalyzeArgs) -> Result<()> {
    let selection = args.selection().map_err(AnalyzerError::from)?;
    let settings = args
        .settings(config.analysis())
        .map_err(AnalyzerError::from)?;

    let records = storage::load_records(&args.input)?;
    let basic_stats = CollectionStats::compute(&records);
    info!(
        total_recipes = basic_stats.total_recipes,
        recipes_with_urls = basic_stats.recipes_with_urls,
        recipes_with_tags = basic_stats.recipes_with_tags,
        unique_tags = basic_stats.unique_tags.len(),
        top_tags = ?basic_stats.top_tags(5),
        "collection statistics computed"
    );

    if args.quick {
        storage::write_json(&args.output, &AnalysisDocument::new(basic_stats, None))?;
        return Ok(());
    }

    let credentials = config.credentials().map_err(AnalyzerError::from)?;
    let vocabulary = match &args.vocabulary {
        Some(path) => load_vocabulary(path)?,
        None => Vocabulary::default(),
    };
    let client = AzureOpenAiClient::new(&credentials).map_err(AnalyzerError::Client)?;

    let working_set = selection.resolve(records.len());
    for warning in &working_set.warnings {
        warn!(warning = warning.as_str(), "selection adjusted");
    }

    let telemetry = Telemetry::new()?;
    let worker = CategorizationWorker::new(
        Arc::new(client),
        PromptBuilder::new(vocabulary, settings.mode),
        &settings,
    );
    let pipeline = AnalysisPipeline::new(
        worker,
        BatchScheduler::new(settings.batch_size, settings.batch_delay),
    )
    .with_metrics(telemetry.metrics());

    let report = pipeline.run(&records, &working_set).await;
    info!(
        analyzed = report.total_analyzed,
        attempted = report.total_attempted,
        success_rate_pct = report.success_rate(),
        non_recipes = report.content_quality_stats.non_recipes,
        titles_needing_improvement = report.content_quality_stats.titles_needing_improvement,
        average_quality_score = report.content_quality_stats.average_quality_score,
        "analysis complete"
    );

    storage::write_json(&args.output, &AnalysisDocument::new(basic_stats, Some(report)))?;
    if let Some(path) = &args.metrics_file {
        fs::write(path, telemetry.render_prometheus())
            .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    }
    Ok(())
}

/// `review` サブコマンド。
///
/// # Errors
/// 入力の読み込み・出力の書き込みに失敗した場合。
pub fn run_review(command: &ReviewCommand) -> Result<()> {
    match command {
        ReviewCommand::Export {
            analysis,
            output,
            issues_only,
        } => {
            let report = storage::load_report(analysis)?;
            let filter = if *issues_only {
                ExportFilter::IssuesOnly
            } else {
                ExportFilter::All
            };
            let file = create_file(output)?;
            let rows = export_review_table(BufWriter::new(file), &report.categorizations, filter)?;
            info!(rows, path = %output.display(), "review table written");
        }
        ReviewCommand::Import {
            csv,
            analysis,
            output,
        } => {
            let baseline = analysis
                .as_deref()
                .map(storage::load_report)
                .transpose()?;
            let file = File::open(csv)
                .with_context(|| format!("failed to open review table {}", csv.display()))?;
            let corrections = import_corrections(
                file,
                baseline.as_ref().map(|report| report.categorizations.as_slice()),
            )?;
            for issue in corrections.import_issues.iter().take(5) {
                warn!(row = issue.row, detail = issue.message.as_str(), "review table issue");
            }
            info!(by_type = ?corrections.counts_by_type(), "corrections by type");
            storage::write_json(output, &corrections)?;
        }
        ReviewCommand::Summary { analysis, output } => {
            let report = storage::load_report(analysis)?;
            let summary = ReviewSummary::build(&report.categorizations, Utc::now());
            info!(
                non_recipes = summary.review_priorities.non_recipes,
                title_improvements = summary.review_priorities.title_improvements,
                low_quality = summary.review_priorities.low_quality,
                low_confidence = summary.review_priorities.low_confidence,
                potential_issues = summary.potential_issues.len(),
                "review summary generated"
            );
            storage::write_json(output, &summary)?;
        }
    }
    Ok(())
}

fn load_vocabulary(path: &Path) -> Result<Vocabulary> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read vocabulary {}", path.display()))?;
    Vocabulary::from_yaml(&raw).with_context(|| format!("invalid vocabulary in {}", path.display()))
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvGuard;
    use crate::review::CorrectionsReport;

    const RECORDS: &str = r#"[
        {"title": "Tacos", "tags": ["Dinner"], "record_id": "a", "url": "https://food.test/tacos"},
        {"title": "Soup", "tags": [], "record_id": "b"}
    ]"#;

    fn analyze_args(input: &Path, output: &Path) -> AnalyzeArgs {
        AnalyzeArgs {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            sample: None,
            range: None,
            start_index: None,
            end_index: None,
            batch_size: None,
            batch_delay: None,
            timeout: None,
            no_content_review: false,
            strict: false,
            quick: false,
            vocabulary: None,
            metrics_file: None,
        }
    }

    fn config_without_credentials() -> Config {
        let _env = EnvGuard::acquire();
        Config::from_env().expect("config")
    }

    #[tokio::test]
    async fn quick_run_needs_no_credentials() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("records.json");
        let output = dir.path().join("analysis.json");
        fs::write(&input, RECORDS).expect("write records");
        let mut args = analyze_args(&input, &output);
        args.quick = true;

        run_analyze(&config_without_credentials(), &args)
            .await
            .expect("quick run");

        let document: AnalysisDocument = storage::read_json(&output).expect("document");
        assert_eq!(document.basic_stats.total_recipes, 2);
        assert_eq!(document.basic_stats.recipes_with_urls, 1);
        assert!(document.llm_categorization.is_none());
    }

    #[tokio::test]
    async fn full_run_without_credentials_fails_before_writing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("records.json");
        let output = dir.path().join("analysis.json");
        fs::write(&input, RECORDS).expect("write records");

        let error = run_analyze(&config_without_credentials(), &analyze_args(&input, &output))
            .await
            .expect_err("missing credentials");

        assert!(matches!(
            error.downcast_ref::<AnalyzerError>(),
            Some(AnalyzerError::Config(_))
        ));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn invalid_range_fails_before_loading_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut args = analyze_args(&dir.path().join("missing.json"), &dir.path().join("out.json"));
        args.range = Some("10".to_string());

        let error = run_analyze(&config_without_credentials(), &args)
            .await
            .expect_err("invalid range");

        assert!(matches!(
            error.downcast_ref::<AnalyzerError>(),
            Some(AnalyzerError::Selection(_))
        ));
    }

    #[test]
    fn import_without_analysis_uses_table_columns() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv_path = dir.path().join("edited.csv");
        let output = dir.path().join("out").join("corrections.json");
        fs::write(
            &csv_path,
            format!(
                "{}\n0,a,Tacos,,false,true,Beef,,,,,,,,,Street Tacos,,,,\n",
                crate::review::table::COLUMNS.join(",")
            ),
        )
        .expect("write csv");

        run_review(&ReviewCommand::Import {
            csv: csv_path,
            analysis: None,
            output: output.clone(),
        })
        .expect("import");

        let report: CorrectionsReport = storage::read_json(&output).expect("corrections");
        assert_eq!(report.total_corrections, 1);
        assert_eq!(report.corrections[0].corrections.title.as_deref(), Some("Street Tacos"));
    }
}
