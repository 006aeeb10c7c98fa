pub mod categorization;
pub mod recipe;
pub mod vocabulary;

pub use categorization::{AnalysisMode, AnalysisOutcome, CategorizationResult, FailedAnalysis};
pub use recipe::{RecipeRecord, RecordInput};
pub use vocabulary::Vocabulary;
