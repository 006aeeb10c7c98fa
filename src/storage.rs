//! ファイル入出力。レコードの読み込みと分析結果ドキュメントの保存・読み込み。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domain::{RecipeRecord, RecordInput};
use crate::pipeline::{AggregateReport, CollectionStats};

/// 1回の実行で保存するドキュメント。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDocument {
    pub analysis_timestamp: DateTime<Utc>,
    pub run_id: Uuid,
    pub basic_stats: CollectionStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_categorization: Option<AggregateReport>,
}

impl AnalysisDocument {
    #[must_use]
    pub fn new(basic_stats: CollectionStats, llm_categorization: Option<AggregateReport>) -> Self {
        Self {
            analysis_timestamp: Utc::now(),
            run_id: Uuid::now_v7(),
            basic_stats,
            llm_categorization,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsFile {
    Bare(Vec<RecordInput>),
    Wrapped {
        #[serde(default)]
        total_records: Option<usize>,
        records: Vec<RecordInput>,
    },
}

/// レコードファイルを読み込み、位置インデックスを振る。
///
/// 配列そのもの、または `{"records": [...]}` の形式を受け付ける。
///
/// # Errors
/// 読み込みまたはJSONの解釈に失敗した場合。
pub fn load_records(path: &Path) -> Result<Vec<RecipeRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read records from {}", path.display()))?;
    let inputs = match serde_json::from_str::<RecordsFile>(&raw)
        .with_context(|| format!("failed to parse records in {}", path.display()))?
    {
        RecordsFile::Bare(records) => records,
        RecordsFile::Wrapped {
            total_records,
            records,
        } => {
            if let Some(declared) = total_records.filter(|declared| *declared != records.len()) {
                tracing::warn!(
                    declared,
                    loaded = records.len(),
                    "total_records does not match the number of records"
                );
            }
            records
        }
    };

    let records = RecipeRecord::index_all(inputs);
    info!(path = %path.display(), records = records.len(), "records loaded");
    Ok(records)
}

/// 値を整形済みJSONとして書き出す。親ディレクトリがなければ作る。
///
/// # Errors
/// シリアライズまたは書き込みに失敗した場合。
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(value).context("failed to serialize JSON output")?;
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote JSON output");
    Ok(())
}

/// JSONファイルを読み込む。
///
/// # Errors
/// 読み込みまたはデシリアライズに失敗した場合。
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// 分析ドキュメント、または集計レポート単体のファイルから集計レポートを取り出す。
///
/// # Errors
/// どちらの形式でもない場合、または分類結果を含まないドキュメントの場合。
pub fn load_report(path: &Path) -> Result<AggregateReport> {
    let value: serde_json::Value = read_json(path)?;
    if value.get("llm_categorization").is_some() || value.get("basic_stats").is_some() {
        let document: AnalysisDocument = serde_json::from_value(value)
            .with_context(|| format!("invalid analysis document in {}", path.display()))?;
        return document.llm_categorization.ok_or_else(|| {
            anyhow!(
                "{} has no categorization results (was it a statistics-only run?)",
                path.display()
            )
        });
    }
    serde_json::from_value(value)
        .with_context(|| format!("invalid aggregate report in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AnalysisMode;
    use crate::pipeline::ResultAggregator;
    use std::io::Write;

    #[test]
    fn load_records_accepts_bare_and_wrapped_files() {
        let mut bare = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            bare,
            r#"[{{"title": "Tacos", "tags": ["Dinner"], "record_id": "a"}}, {{"title": "Soup"}}]"#
        )
        .expect("write");
        let mut wrapped = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            wrapped,
            r#"{{"total_records": 1, "records": [{{"title": "Pie", "record_id": "p", "url": "https://x.test/pie"}}]}}"#
        )
        .expect("write");

        let bare_records = load_records(bare.path()).expect("bare records");
        let wrapped_records = load_records(wrapped.path()).expect("wrapped records");

        assert_eq!(bare_records.len(), 2);
        assert_eq!(bare_records[1].index, 1);
        assert!(bare_records[1].tags.is_empty());
        assert_eq!(wrapped_records[0].url.as_deref(), Some("https://x.test/pie"));
    }

    #[test]
    fn load_records_reports_path_on_error() {
        let mut broken = tempfile::NamedTempFile::new().expect("tempfile");
        write!(broken, "{{not json").expect("write");

        let error = load_records(broken.path()).expect_err("should fail");

        assert!(format!("{error:#}").contains("failed to parse records"));
    }

    #[test]
    fn document_round_trip_and_report_extraction() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("analysis.json");
        let report = ResultAggregator::new(AnalysisMode::ContentReview).finish();
        let document = AnalysisDocument::new(CollectionStats::default(), Some(report.clone()));

        write_json(&path, &document).expect("write");
        let restored: AnalysisDocument = read_json(&path).expect("read");

        assert_eq!(restored, document);
        assert_eq!(load_report(&path).expect("report"), report);
    }

    #[test]
    fn stats_only_document_has_no_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("quick.json");
        write_json(&path, &AnalysisDocument::new(CollectionStats::default(), None)).expect("write");

        let error = load_report(&path).expect_err("no report");

        assert!(error.to_string().contains("statistics-only"));
    }
}
