use std::io::Write;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use tracing::info;

use crate::domain::CategorizationResult;

use super::table::{COLUMNS, TableRow};

/// エクスポート対象の絞り込み。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFilter {
    #[default]
    All,
    /// 非レシピ・タイトル要改善・低品質（0 < スコア < 3）のいずれか。
    IssuesOnly,
}

impl ExportFilter {
    fn includes(self, result: &CategorizationResult) -> bool {
        match self {
            Self::All => true,
            Self::IssuesOnly => result.needs_attention(),
        }
    }
}

/// 分類結果をレビュー表として書き出し、書いた行数を返す。ヘッダ行は常に書く。
///
/// # Errors
/// 書き込みに失敗した場合。
pub fn export_review_table<W: Write>(
    writer: W,
    categorizations: &[CategorizationResult],
    filter: ExportFilter,
) -> Result<usize> {
    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer
        .write_record(COLUMNS)
        .context("failed to write review table header")?;

    let mut written = 0;
    for result in categorizations.iter().filter(|result| filter.includes(result)) {
        csv_writer
            .serialize(TableRow::from_result(result))
            .with_context(|| format!("failed to write review row for recipe {}", result.recipe_index))?;
        written += 1;
    }
    csv_writer.flush().context("failed to flush review table")?;

    info!(
        rows = written,
        total = categorizations.len(),
        filter = ?filter,
        "review table exported"
    );
    Ok(written)
}
