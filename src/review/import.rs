use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::CategorizationResult;

use super::table::{ReviewRow, RowError, TableRow};

/// レビュアーが変更したフィールドだけを持つ修正内容。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recipe: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
}

impl CorrectionSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.primary_category.is_none()
            && self.is_recipe.is_none()
            && self.review_notes.is_none()
    }

    /// 含まれる修正の種類名。
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds = Vec::with_capacity(4);
        if self.title.is_some() {
            kinds.push("title");
        }
        if self.primary_category.is_some() {
            kinds.push("primary_category");
        }
        if self.is_recipe.is_some() {
            kinds.push("is_recipe");
        }
        if self.review_notes.is_some() {
            kinds.push("review_notes");
        }
        kinds
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub recipe_index: usize,
    pub record_id: String,
    pub original_title: String,
    pub corrections: CorrectionSet,
}

/// 取り込めなかった行。行番号はヘッダを1行目として数える。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIssue {
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionsReport {
    pub total_corrections: usize,
    pub corrections: Vec<Correction>,
    pub import_issues: Vec<ImportIssue>,
}

impl CorrectionsReport {
    /// 修正の種類ごとの件数。
    #[must_use]
    pub fn counts_by_type(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for correction in &self.corrections {
            for kind in correction.corrections.kinds() {
                *counts.entry(kind).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// 比較元となる元の値。
struct Originals<'a> {
    record_id: &'a str,
    title: &'a str,
    primary_category: Option<&'a str>,
    is_recipe: bool,
}

/// 編集済みのレビュー表から修正を取り出す。
///
/// `baseline` があればその分類結果と比較し、なければ行自身の元の値の列と比較する。
/// 不正な行は取り込み問題として記録し、次の行へ進む。
///
/// # Errors
/// 入力の読み込み自体に失敗した場合のみ。
pub fn import_corrections<R: Read>(
    reader: R,
    baseline: Option<&[CategorizationResult]>,
) -> Result<CorrectionsReport> {
    let by_index: Option<HashMap<usize, &CategorizationResult>> = baseline.map(|results| {
        results
            .iter()
            .map(|result| (result.recipe_index, result))
            .collect()
    });

    let mut csv_reader = ReaderBuilder::new().from_reader(reader);
    let mut report = CorrectionsReport::default();

    for (position, row) in csv_reader.deserialize::<TableRow>().enumerate() {
        let row_number = position + 2;
        let outcome = match row {
            Ok(row) => reconcile_row(&row, by_index.as_ref()),
            Err(error) if matches!(error.kind(), csv::ErrorKind::Io(_)) => {
                return Err(error).context("failed to read review table");
            }
            Err(error) => Err(RowError::Malformed(error.to_string())),
        };

        match outcome {
            Ok(Some(correction)) => report.corrections.push(correction),
            Ok(None) => {}
            Err(error) => {
                warn!(row = row_number, error = %error, "skipping review row");
                report.import_issues.push(ImportIssue {
                    row: row_number,
                    message: format!("Error processing row: {error}"),
                });
            }
        }
    }

    report.total_corrections = report.corrections.len();
    info!(
        corrections = report.total_corrections,
        issues = report.import_issues.len(),
        "review corrections imported"
    );
    Ok(report)
}

fn reconcile_row(
    row: &TableRow,
    baseline: Option<&HashMap<usize, &CategorizationResult>>,
) -> Result<Option<Correction>, RowError> {
    let Some(parsed) = row.parse()? else {
        return Ok(None);
    };

    let originals = match baseline {
        Some(results) => {
            let result = results
                .get(&parsed.recipe_index)
                .ok_or(RowError::UnknownIndex(parsed.recipe_index))?;
            Originals {
                record_id: &result.record_id,
                title: &result.original_title,
                primary_category: result.primary_category.as_deref(),
                is_recipe: result.is_recipe,
            }
        }
        None => Originals {
            record_id: &parsed.record_id,
            title: &parsed.original_title,
            primary_category: parsed.primary_category.as_deref(),
            is_recipe: parsed.is_recipe,
        },
    };

    let corrections = diff(&parsed, &originals);
    if corrections.is_empty() {
        return Ok(None);
    }
    Ok(Some(Correction {
        recipe_index: parsed.recipe_index,
        record_id: originals.record_id.to_string(),
        original_title: originals.title.to_string(),
        corrections,
    }))
}

fn diff(row: &ReviewRow, originals: &Originals<'_>) -> CorrectionSet {
    CorrectionSet {
        title: row
            .corrected_title
            .clone()
            .filter(|title| title != originals.title),
        primary_category: row
            .corrected_category
            .clone()
            .filter(|category| Some(category.as_str()) != originals.primary_category),
        is_recipe: row
            .corrected_is_recipe
            .filter(|is_recipe| *is_recipe != originals.is_recipe),
        review_notes: row.review_notes.clone(),
    }
}
