use std::{env, num::NonZeroUsize, time::Duration};

use thiserror::Error;

use crate::domain::AnalysisMode;

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

/// 設定が読む環境変数の一覧。テストでの掃除に使う。
#[cfg(test)]
pub(crate) const ENV_KEYS: [&str; 11] = [
    "AZURE_OPENAI_ENDPOINT",
    "AZURE_OPENAI_KEY",
    "AZURE_OPENAI_DEPLOYMENT",
    "AZURE_OPENAI_VERSION",
    "ANALYZER_TIMEOUT_SECS",
    "ANALYZER_TEMPERATURE",
    "ANALYZER_MAX_TOKENS",
    "ANALYZER_CONTENT_REVIEW",
    "ANALYZER_STRICT_PAYLOAD",
    "ANALYZER_BATCH_SIZE",
    "ANALYZER_BATCH_DELAY_SECS",
];

/// `ENV_MUTEX` を保持し、取得時と破棄時に [`ENV_KEYS`] を消す。
#[cfg(test)]
pub(crate) struct EnvGuard {
    _lock: std::sync::MutexGuard<'static, ()>,
}

#[cfg(test)]
impl EnvGuard {
    pub(crate) fn acquire() -> Self {
        let lock = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        clear_env();
        Self { _lock: lock }
    }
}

#[cfg(test)]
impl Drop for EnvGuard {
    fn drop(&mut self) {
        clear_env();
    }
}

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        // SAFETY: only called while ENV_MUTEX is held.
        unsafe {
            env::remove_var(key);
        }
    }
}

const DEFAULT_DEPLOYMENT: &str = "gpt-4.1";
const DEFAULT_API_VERSION: &str = "2025-04-01-preview";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    azure_openai_endpoint: Option<String>,
    azure_openai_key: Option<String>,
    azure_openai_deployment: String,
    azure_openai_version: String,
    analysis: AnalysisSettings,
}

/// 分類サービスへの接続情報。LLMを使う実行でのみ必須。
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// 1回の分析実行の設定。CLIの値で上書きされる。
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
    pub mode: AnalysisMode,
    pub strict_payload: bool,
    pub batch_size: Option<NonZeroUsize>,
    pub batch_delay: Duration,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            temperature: 0.1,
            max_tokens: 800,
            mode: AnalysisMode::ContentReview,
            strict_payload: false,
            batch_size: None,
            batch_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から設定値を読み込み、検証する。
    ///
    /// 認証情報はここでは必須にしない。LLMを使う実行は [`Config::credentials`] で検証する。
    ///
    /// # Errors
    /// 数値・真偽値のパースに失敗した場合は [`ConfigError::Invalid`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let azure_openai_endpoint = env_var_opt("AZURE_OPENAI_ENDPOINT");
        let azure_openai_key = env_var_opt("AZURE_OPENAI_KEY");
        let azure_openai_deployment = env::var("AZURE_OPENAI_DEPLOYMENT")
            .unwrap_or_else(|_| DEFAULT_DEPLOYMENT.to_string());
        let azure_openai_version = env::var("AZURE_OPENAI_VERSION")
            .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        let timeout = parse_duration_secs("ANALYZER_TIMEOUT_SECS", 30)?;
        if timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "ANALYZER_TIMEOUT_SECS",
                source: anyhow::anyhow!("must be greater than zero"),
            });
        }
        let temperature = parse_f32("ANALYZER_TEMPERATURE", 0.1)?;
        let max_tokens = parse_u32("ANALYZER_MAX_TOKENS", 800)?;
        let mode = if parse_bool("ANALYZER_CONTENT_REVIEW", true)? {
            AnalysisMode::ContentReview
        } else {
            AnalysisMode::Basic
        };
        let strict_payload = parse_bool("ANALYZER_STRICT_PAYLOAD", false)?;

        // Batch processing settings
        let batch_size = parse_optional_usize("ANALYZER_BATCH_SIZE")?.and_then(NonZeroUsize::new);
        let batch_delay = parse_delay_secs("ANALYZER_BATCH_DELAY_SECS", 0.0)?;

        Ok(Self {
            azure_openai_endpoint,
            azure_openai_key,
            azure_openai_deployment,
            azure_openai_version,
            analysis: AnalysisSettings {
                timeout,
                temperature,
                max_tokens,
                mode,
                strict_payload,
                batch_size,
                batch_delay,
            },
        })
    }

    /// 分類サービスの認証情報を取り出す。
    ///
    /// # Errors
    /// エンドポイントまたはキーが未設定（空文字を含む）の場合は [`ConfigError::Missing`] を返す。
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let endpoint = self
            .azure_openai_endpoint
            .clone()
            .ok_or(ConfigError::Missing("AZURE_OPENAI_ENDPOINT"))?;
        let api_key = self
            .azure_openai_key
            .clone()
            .ok_or(ConfigError::Missing("AZURE_OPENAI_KEY"))?;

        Ok(Credentials {
            endpoint,
            api_key,
            deployment: self.azure_openai_deployment.clone(),
            api_version: self.azure_openai_version.clone(),
        })
    }

    #[must_use]
    pub fn analysis(&self) -> &AnalysisSettings {
        &self.analysis
    }

    #[must_use]
    pub fn azure_openai_deployment(&self) -> &str {
        &self.azure_openai_deployment
    }

    #[must_use]
    pub fn azure_openai_version(&self) -> &str {
        &self.azure_openai_version
    }
}

fn env_var_opt(name: &'static str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_duration_secs(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let value = parse_u64(name, default_secs)?;
    Ok(Duration::from_secs(value))
}

fn parse_delay_secs(name: &'static str, default_secs: f64) -> Result<Duration, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default_secs.to_string());
    let secs = raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    Duration::try_from_secs_f64(secs).map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_optional_usize(name: &'static str) -> Result<Option<usize>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<usize>()
                .map(Some)
                .map_err(|error| ConfigError::Invalid {
                    name,
                    source: anyhow::Error::new(error),
                })
        }
        _ => Ok(None),
    }
}

fn parse_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<u64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_f32(name: &'static str, default: f32) -> Result<f32, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<f32>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("invalid boolean value: {raw}"),
        }),
    }
}
