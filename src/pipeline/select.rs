//! 処理対象レコードの選択。
//!
//! 範囲指定・サンプル指定・全件のどれか1つに必ず解決する。両方指定された場合は範囲を優先する。

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("invalid range '{raw}': expected START-END with non-negative integers (e.g. 50-100)")]
    InvalidRange { raw: String },
}

/// 呼び出し元から渡される選択条件。`end_index` は含む。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionSpec {
    pub sample_size: Option<usize>,
    pub start_index: Option<usize>,
    pub end_index: Option<usize>,
}

/// 実際に適用された選択方針。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SelectionPolicy {
    Sample { requested: usize },
    Range { start: usize, end: usize },
    Full,
}

/// 解決済みの処理対象。`indices` は狭義単調増加。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingSet {
    pub indices: Vec<usize>,
    pub policy: SelectionPolicy,
    pub warnings: Vec<String>,
}

impl WorkingSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl SelectionSpec {
    /// `START-END` 形式の文字列から範囲を設定する。
    ///
    /// # Errors
    /// 2つの非負整数に分解できない場合は [`SelectionError::InvalidRange`]。
    pub fn with_range(mut self, raw: &str) -> Result<Self, SelectionError> {
        let (start, end) = parse_range(raw)?;
        self.start_index = Some(start);
        self.end_index = Some(end);
        Ok(self)
    }

    fn has_range(&self) -> bool {
        self.start_index.is_some() || self.end_index.is_some()
    }

    /// コレクションサイズ `total` に対して選択条件を解決する。
    #[must_use]
    pub fn resolve(&self, total: usize) -> WorkingSet {
        let mut warnings = Vec::new();

        if self.has_range() {
            if let Some(sample_size) = self.sample_size {
                warnings.push(format!(
                    "both a range and a sample size ({sample_size}) were given; using the range and ignoring the sample"
                ));
            }
            let start = self.start_index.unwrap_or(0);
            let end = self
                .end_index
                .unwrap_or(total.saturating_sub(1))
                .min(total.saturating_sub(1));
            let indices = if total == 0 || start > end {
                warnings.push(format!(
                    "range {start}-{end} selects no records from a collection of {total}"
                ));
                Vec::new()
            } else {
                (start..=end).collect()
            };
            return WorkingSet {
                indices,
                policy: SelectionPolicy::Range { start, end },
                warnings,
            };
        }

        if let Some(requested) = self.sample_size {
            return WorkingSet {
                indices: (0..requested.min(total)).collect(),
                policy: SelectionPolicy::Sample { requested },
                warnings,
            };
        }

        WorkingSet {
            indices: (0..total).collect(),
            policy: SelectionPolicy::Full,
            warnings,
        }
    }
}

/// `"50-100"` を `(50, 100)` に分解する。
///
/// # Errors
/// 区切りがない、または両側が非負整数でない場合は [`SelectionError::InvalidRange`]。
pub fn parse_range(raw: &str) -> Result<(usize, usize), SelectionError> {
    let invalid = || SelectionError::InvalidRange {
        raw: raw.to_string(),
    };
    let (start, end) = raw.split_once('-').ok_or_else(invalid)?;
    let start = start.trim().parse::<usize>().map_err(|_| invalid())?;
    let end = end.trim().parse::<usize>().map_err(|_| invalid())?;
    Ok((start, end))
}
