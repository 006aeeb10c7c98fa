use std::fmt::Write as _;

use crate::domain::{AnalysisMode, RecipeRecord, Vocabulary};

/// システムメッセージ。JSONのみで答えるよう指示する。
pub const SYSTEM_PROMPT: &str = "You are a culinary expert helping categorize recipes. \
Always respond with valid JSON in the exact format requested.";

const BASIC_RESPONSE_FORMAT: &str = r#"{
    "primary_category": "category_name",
    "cuisine_type": "cuisine_name_or_Other",
    "dietary_tags": ["tag1", "tag2"],
    "usage_tags": ["tag1"],
    "confidence": 4,
    "reasoning": "Brief explanation of your categorization choices"
}"#;

const CONTENT_REVIEW_RESPONSE_FORMAT: &str = r#"{
    "is_recipe": true,
    "content_summary": "One sentence describing what this entry is",
    "title_needs_improvement": false,
    "proposed_title": null,
    "quality_score": 4,
    "primary_category": "category_name",
    "cuisine_type": "cuisine_name_or_Other",
    "dietary_tags": ["tag1", "tag2"],
    "usage_tags": ["tag1"],
    "confidence": 4,
    "reasoning": "Brief explanation of your categorization choices"
}"#;

/// 語彙と実行モードからユーザープロンプトを組み立てる。
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    vocabulary: Vocabulary,
    mode: AnalysisMode,
}

impl PromptBuilder {
    #[must_use]
    pub fn new(vocabulary: Vocabulary, mode: AnalysisMode) -> Self {
        Self { vocabulary, mode }
    }

    #[must_use]
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    #[must_use]
    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    /// 1レコード分のプロンプトを生成する。
    #[must_use]
    pub fn build(&self, record: &RecipeRecord) -> String {
        let mut prompt = String::with_capacity(2048);
        let vocabulary = &self.vocabulary;

        prompt.push_str("Analyze this recipe and categorize it according to the schema below.\n\n");
        let _ = writeln!(prompt, "Recipe Title: \"{}\"", record.display_title());
        if record.tags.is_empty() {
            prompt.push_str("Existing Tags: None\n\n");
        } else {
            let _ = writeln!(prompt, "Existing Tags: {}\n", record.tags.join(", "));
        }

        prompt.push_str("Please categorize this recipe using the following schema:\n\n");
        push_section(
            &mut prompt,
            "PRIMARY CATEGORY (choose exactly one):",
            &vocabulary.categories,
        );
        push_section(
            &mut prompt,
            "CUISINE TYPE (choose one if applicable, or \"Other\"):",
            &vocabulary.cuisines,
        );
        push_section(
            &mut prompt,
            "DIETARY TAGS (select all that apply):",
            &vocabulary.dietary_tags,
        );
        push_section(
            &mut prompt,
            "USAGE TAGS (select all that apply):",
            &vocabulary.usage_tags,
        );

        if !vocabulary.conflict_rules.is_empty() {
            prompt.push_str("CONFLICT RESOLUTION RULES:\n");
            for (position, rule) in vocabulary.conflict_rules.iter().enumerate() {
                let _ = writeln!(prompt, "{}. {rule}", position + 1);
            }
            prompt.push('\n');
        }

        if self.mode.is_content_review() {
            prompt.push_str(
                "CONTENT REVIEW:\n\
                 - is_recipe: false when the entry is not a recipe (an article, a note, a shopping list).\n\
                 - content_summary: one sentence describing the entry.\n\
                 - title_needs_improvement: true when the title is vague, misspelled or not descriptive.\n\
                 - proposed_title: a better title when title_needs_improvement is true, otherwise null.\n\
                 - quality_score: 1 (unusable) to 5 (complete and clear).\n\n",
            );
        }

        prompt.push_str("CONFIDENCE (1-5 scale):\n");
        prompt.push_str(
            "Rate your confidence in this categorization from 1 (uncertain) to 5 (very confident).\n\n",
        );
        prompt.push_str("Respond in this exact JSON format:\n");
        prompt.push_str(if self.mode.is_content_review() {
            CONTENT_REVIEW_RESPONSE_FORMAT
        } else {
            BASIC_RESPONSE_FORMAT
        });
        prompt.push('\n');
        prompt
    }
}

fn push_section(prompt: &mut String, heading: &str, values: &[String]) {
    prompt.push_str(heading);
    prompt.push('\n');
    for value in values {
        let _ = writeln!(prompt, "- {value}");
    }
    prompt.push('\n');
}
