use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{AnalysisSettings, ConfigError};
use crate::domain::AnalysisMode;
use crate::observability::LogFormat;
use crate::pipeline::{SelectionError, SelectionSpec};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Categorize a recipe collection and review the results", long_about = None)]
pub struct Cli {
    /// Log output format
    #[arg(long, env = "ANALYZER_LOG_FORMAT", value_enum, default_value = "plain", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compute collection statistics and categorize records
    Analyze(AnalyzeArgs),
    /// Export, import and summarize human review tables
    #[command(subcommand)]
    Review(ReviewCommand),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Records JSON file (array or {"records": [...]})
    #[arg(long, short)]
    pub input: PathBuf,

    /// Analysis document output path
    #[arg(long, short, default_value = "data/analysis.json")]
    pub output: PathBuf,

    /// Analyze only the first N records
    #[arg(long)]
    pub sample: Option<usize>,

    /// Inclusive index range, e.g. 50-100
    #[arg(long, conflicts_with_all = ["start_index", "end_index"])]
    pub range: Option<String>,

    /// First index to analyze (inclusive)
    #[arg(long)]
    pub start_index: Option<usize>,

    /// Last index to analyze (inclusive)
    #[arg(long)]
    pub end_index: Option<usize>,

    /// Records per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Seconds to wait between batches
    #[arg(long)]
    pub batch_delay: Option<f64>,

    /// Per-call timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Request basic categorization only
    #[arg(long)]
    pub no_content_review: bool,

    /// Record incomplete content-review payloads as failures
    #[arg(long)]
    pub strict: bool,

    /// Collection statistics only; no classification calls
    #[arg(long)]
    pub quick: bool,

    /// YAML file replacing the built-in vocabulary
    #[arg(long, env = "ANALYZER_VOCABULARY")]
    pub vocabulary: Option<PathBuf>,

    /// Write Prometheus metrics to this file after the run
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReviewCommand {
    /// Write the review table (CSV) for an analysis document
    Export {
        #[arg(long, short)]
        analysis: PathBuf,
        #[arg(long, short, default_value = "data/review/categorization_review.csv")]
        output: PathBuf,
        /// Only rows that are non-recipes, need a better title or have low quality
        #[arg(long)]
        issues_only: bool,
    },
    /// Read an edited review table and write the corrections
    Import {
        #[arg(long, short)]
        csv: PathBuf,
        /// Compare against this analysis document instead of the table's own columns
        #[arg(long, short)]
        analysis: Option<PathBuf>,
        #[arg(long, short, default_value = "data/review/corrections.json")]
        output: PathBuf,
    },
    /// Write review priorities and potential issues
    Summary {
        #[arg(long, short)]
        analysis: PathBuf,
        #[arg(long, short, default_value = "data/review/review_summary.json")]
        output: PathBuf,
    },
}

impl AnalyzeArgs {
    /// 選択条件を組み立てる。
    ///
    /// # Errors
    /// `--range` が解釈できない場合。
    pub fn selection(&self) -> Result<SelectionSpec, SelectionError> {
        let spec = SelectionSpec {
            sample_size: self.sample,
            start_index: self.start_index,
            end_index: self.end_index,
        };
        match &self.range {
            Some(raw) => spec.with_range(raw),
            None => Ok(spec),
        }
    }

    /// 環境変数由来の設定にCLIの指定を上書きする。
    ///
    /// # Errors
    /// タイムアウトが0、またはバッチ間隔が負・非有限の場合。
    pub fn settings(&self, base: &AnalysisSettings) -> Result<AnalysisSettings, ConfigError> {
        let mut settings = base.clone();

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err(ConfigError::Invalid {
                    name: "--timeout",
                    source: anyhow::anyhow!("must be greater than zero"),
                });
            }
            settings.timeout = Duration::from_secs(timeout);
        }
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = NonZeroUsize::new(batch_size);
        }
        if let Some(delay) = self.batch_delay {
            settings.batch_delay =
                Duration::try_from_secs_f64(delay).map_err(|error| ConfigError::Invalid {
                    name: "--batch-delay",
                    source: anyhow::Error::new(error),
                })?;
        }
        if self.no_content_review {
            settings.mode = AnalysisMode::Basic;
        }
        if self.strict {
            settings.strict_payload = true;
        }
        Ok(settings)
    }
}
