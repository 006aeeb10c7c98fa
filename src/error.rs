use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::select::SelectionError;

/// 実行全体を止める致命的なエラー。レコード単位・行単位の失敗はここに含めない。
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("failed to build classification client: {0}")]
    Client(#[source] anyhow::Error),
}
