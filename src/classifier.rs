//! 1レコード分の分類: プロンプト生成 → サービス呼び出し → 応答の構造検証。

pub mod payload;
pub mod prompt;
pub mod worker;

pub use prompt::PromptBuilder;
pub use worker::CategorizationWorker;
