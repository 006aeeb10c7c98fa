use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::clients::{ClassificationRequest, ClassificationService};
use crate::config::AnalysisSettings;
use crate::domain::categorization::FailureKind;
use crate::domain::{AnalysisMode, AnalysisOutcome, FailedAnalysis, RecipeRecord};
use crate::observability::metrics::Metrics;
use crate::schema::categorization::CONTENT_REVIEW_RESPONSE_SCHEMA;
use crate::schema::validate_json;
use crate::util::error::classify_service_error;
use crate::util::json::parse_json_object;

use super::payload::into_result;
use super::prompt::PromptBuilder;

/// 1レコードを分類サービスに問い合わせ、結果か失敗のどちらかを返す。
///
/// 集計状態には触れない。再試行もしない。
pub struct CategorizationWorker<C: ?Sized> {
    service: Arc<C>,
    prompts: PromptBuilder,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
    strict_payload: bool,
    metrics: Option<Arc<Metrics>>,
}

impl<C> CategorizationWorker<C>
where
    C: ClassificationService + ?Sized,
{
    #[must_use]
    pub fn new(service: Arc<C>, prompts: PromptBuilder, settings: &AnalysisSettings) -> Self {
        Self {
            service,
            prompts,
            timeout: settings.timeout,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            strict_payload: settings.strict_payload,
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub fn mode(&self) -> AnalysisMode {
        self.prompts.mode()
    }

    /// 1レコード分の分類を実行する。
    pub async fn categorize(&self, record: &RecipeRecord) -> AnalysisOutcome {
        let request = ClassificationRequest {
            system_prompt: self.prompts.system_prompt().to_string(),
            prompt: self.prompts.build(record),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: self.timeout,
        };

        let started = Instant::now();
        let response =
            tokio::time::timeout(self.timeout, self.service.classify(&request)).await;
        if let Some(metrics) = &self.metrics {
            metrics
                .classification_duration
                .observe(started.elapsed().as_secs_f64());
        }

        let text = match response {
            Ok(Ok(text)) => text,
            Ok(Err(error)) => {
                let kind = classify_service_error(&error);
                warn!(
                    recipe_index = record.index,
                    kind = kind.as_str(),
                    error = %error,
                    "classification call failed"
                );
                return Self::failed(record, kind, format!("{error:#}"));
            }
            Err(_) => {
                warn!(
                    recipe_index = record.index,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "classification call timed out"
                );
                return Self::failed(
                    record,
                    FailureKind::TimedOut,
                    format!("no response within {:.1}s", self.timeout.as_secs_f64()),
                );
            }
        };

        let payload = match parse_json_object(&text) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(
                    recipe_index = record.index,
                    title = record.display_title(),
                    response_chars = text.len(),
                    error = %error,
                    "classification response is not a JSON object"
                );
                return Self::failed(record, FailureKind::InvalidJson, error.to_string());
            }
        };

        if self.mode().is_content_review() {
            let validation = validate_json(
                &CONTENT_REVIEW_RESPONSE_SCHEMA,
                &serde_json::Value::Object(payload.clone()),
            );
            if !validation.valid {
                if let Some(metrics) = &self.metrics {
                    metrics.incomplete_payloads.inc();
                }
                if self.strict_payload {
                    warn!(
                        recipe_index = record.index,
                        errors = ?validation.errors,
                        "rejecting incomplete classification payload"
                    );
                    return Self::failed(
                        record,
                        FailureKind::IncompletePayload,
                        validation.errors.join("; "),
                    );
                }
                warn!(
                    recipe_index = record.index,
                    errors = ?validation.errors,
                    "accepting incomplete classification payload"
                );
            }
        }

        let result = into_result(record, payload);
        debug!(
            recipe_index = record.index,
            primary_category = result.primary_category.as_deref().unwrap_or("-"),
            confidence = result.confidence,
            "record categorized"
        );
        AnalysisOutcome::Categorized(Box::new(result))
    }

    fn failed(record: &RecipeRecord, kind: FailureKind, reason: impl Into<String>) -> AnalysisOutcome {
        AnalysisOutcome::Failed(FailedAnalysis::for_record(record, kind, reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Vocabulary;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use prometheus::Registry;

    enum Reply {
        Text(&'static str),
        Error(&'static str),
        Hang,
    }

    struct FixedService(Reply);

    #[async_trait]
    impl ClassificationService for FixedService {
        async fn classify(&self, _request: &ClassificationRequest) -> Result<String> {
            match &self.0 {
                Reply::Text(text) => Ok((*text).to_string()),
                Reply::Error(message) => Err(anyhow!(*message)),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(String::new())
                }
            }
        }
    }

    fn record() -> RecipeRecord {
        RecipeRecord {
            index: 4,
            title: "Pancakes".to_string(),
            tags: vec!["Breakfast".to_string()],
            record_id: "rec-4".to_string(),
            url: None,
        }
    }

    fn worker(reply: Reply, mode: AnalysisMode, strict: bool) -> CategorizationWorker<FixedService> {
        let settings = AnalysisSettings {
            timeout: Duration::from_millis(50),
            mode,
            strict_payload: strict,
            ..AnalysisSettings::default()
        };
        CategorizationWorker::new(
            Arc::new(FixedService(reply)),
            PromptBuilder::new(Vocabulary::default(), mode),
            &settings,
        )
    }

    fn failure_kind(outcome: &AnalysisOutcome) -> Option<FailureKind> {
        match outcome {
            AnalysisOutcome::Failed(failed) => Some(failed.kind),
            AnalysisOutcome::Categorized(_) => None,
        }
    }

    const FULL_REVIEW: &str = r#"{"is_recipe": true, "content_summary": "Fluffy pancakes",
        "title_needs_improvement": false, "proposed_title": null, "quality_score": 5,
        "primary_category": "Breakfast", "confidence": 5, "reasoning": "breakfast staple"}"#;

    #[tokio::test]
    async fn categorizes_valid_payload() {
        let outcome = worker(Reply::Text(FULL_REVIEW), AnalysisMode::ContentReview, true)
            .categorize(&record())
            .await;

        match outcome {
            AnalysisOutcome::Categorized(result) => {
                assert_eq!(result.recipe_index, 4);
                assert_eq!(result.primary_category.as_deref(), Some("Breakfast"));
                assert_eq!(result.quality_score, 5);
            }
            AnalysisOutcome::Failed(failed) => panic!("unexpected failure: {failed:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_invalid() {
        let outcome = worker(Reply::Text("Sure! Here is the JSON"), AnalysisMode::Basic, false)
            .categorize(&record())
            .await;

        assert_eq!(failure_kind(&outcome), Some(FailureKind::InvalidJson));
        assert_eq!(outcome.recipe_index(), 4);
    }

    #[tokio::test]
    async fn service_error_is_recorded() {
        let outcome = worker(Reply::Error("status 500"), AnalysisMode::Basic, false)
            .categorize(&record())
            .await;

        assert_eq!(failure_kind(&outcome), Some(FailureKind::ServiceError));
    }

    #[tokio::test]
    async fn hanging_call_times_out() {
        let outcome = worker(Reply::Hang, AnalysisMode::Basic, false)
            .categorize(&record())
            .await;

        assert_eq!(failure_kind(&outcome), Some(FailureKind::TimedOut));
    }

    #[tokio::test]
    async fn partial_payload_accepted_when_lenient() {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(Metrics::new(Arc::clone(&registry)).expect("metrics"));
        let outcome = worker(
            Reply::Text(r#"{"primary_category": "Breakfast"}"#),
            AnalysisMode::ContentReview,
            false,
        )
        .with_metrics(Arc::clone(&metrics))
        .categorize(&record())
        .await;

        assert!(outcome.is_success());
        assert!((metrics.incomplete_payloads.get() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn partial_payload_rejected_when_strict() {
        let outcome = worker(
            Reply::Text(r#"{"primary_category": "Breakfast"}"#),
            AnalysisMode::ContentReview,
            true,
        )
        .categorize(&record())
        .await;

        match outcome {
            AnalysisOutcome::Failed(failed) => {
                assert_eq!(failed.kind, FailureKind::IncompletePayload);
                assert!(failed.reason.contains("is_recipe"));
            }
            AnalysisOutcome::Categorized(_) => panic!("strict mode must reject"),
        }
    }

    #[tokio::test]
    async fn strict_basic_mode_accepts_loose_types() {
        let registry = Arc::new(Registry::new());
        let metrics = Arc::new(Metrics::new(Arc::clone(&registry)).expect("metrics"));
        let outcome = worker(
            Reply::Text(
                r#"{"primary_category": "Beef", "dietary_tags": "Vegetarian", "confidence": "4"}"#,
            ),
            AnalysisMode::Basic,
            true,
        )
        .with_metrics(Arc::clone(&metrics))
        .categorize(&record())
        .await;

        match outcome {
            AnalysisOutcome::Categorized(result) => {
                assert_eq!(result.dietary_tags, vec!["Vegetarian"]);
                assert_eq!(result.confidence, 4);
            }
            AnalysisOutcome::Failed(failed) => panic!("unexpected failure: {failed:?}"),
        }
        assert!(metrics.incomplete_payloads.get().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn strict_content_review_ignores_value_types() {
        let outcome = worker(
            Reply::Text(
                r#"{"is_recipe": "true", "content_summary": "Fluffy", "title_needs_improvement": "no",
                "proposed_title": null, "quality_score": "5", "primary_category": "Breakfast",
                "dietary_tags": "Vegetarian"}"#,
            ),
            AnalysisMode::ContentReview,
            true,
        )
        .categorize(&record())
        .await;

        assert!(outcome.is_success());
    }
}
