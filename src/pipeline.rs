pub mod aggregate;
pub mod batch;
pub mod orchestrator;
pub mod select;
pub mod stats;

pub use aggregate::{AggregateReport, ContentQualityStats, ResultAggregator};
pub use batch::BatchScheduler;
pub use orchestrator::AnalysisPipeline;
pub use select::{SelectionError, SelectionPolicy, SelectionSpec, WorkingSet, parse_range};
pub use stats::CollectionStats;
