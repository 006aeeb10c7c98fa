//! 人手レビュー用の表形式エクスポートと、編集済み表からの修正取り込み。

pub mod export;
pub mod import;
pub mod summary;
pub mod table;

pub use export::{ExportFilter, export_review_table};
pub use import::{Correction, CorrectionSet, CorrectionsReport, ImportIssue, import_corrections};
pub use summary::{IssueKind, ReviewSummary};
pub use table::{RowError, TableRow};
