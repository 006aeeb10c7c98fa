pub mod azure_openai;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

pub use azure_openai::AzureOpenAiClient;

/// 分類サービスへの1回分の呼び出し内容。
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// 自然言語分類サービス。生の応答テキストを返すだけで、解釈は呼び出し側が行う。
#[async_trait]
pub trait ClassificationService: Send + Sync {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String>;
}
