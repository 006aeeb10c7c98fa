use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// プロンプトに埋め込む閉じた語彙と競合解決ルール。
///
/// 読み込みは外部の責務。ここでは値として受け取るだけ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub categories: Vec<String>,
    pub cuisines: Vec<String>,
    pub dietary_tags: Vec<String>,
    pub usage_tags: Vec<String>,
    #[serde(default)]
    pub conflict_rules: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            categories: to_strings(&[
                "Breakfast",
                "Beef",
                "Chicken",
                "Pork",
                "Seafood",
                "Vegetarian",
                "Baking",
                "Sides & Appetizers",
                "Desserts",
            ]),
            cuisines: to_strings(&[
                "Mexican",
                "Italian",
                "American",
                "Asian",
                "Mediterranean",
                "Indian",
                "French",
                "Other",
            ]),
            dietary_tags: to_strings(&[
                "Food Allergy Safe",
                "Vegetarian",
                "Vegan",
                "Gluten-Free",
                "Dairy-Free",
                "Low-Carb",
                "Keto",
                "Quick & Easy",
                "One Pot",
            ]),
            usage_tags: to_strings(&[
                "Weeknight",
                "Meal Prep",
                "Entertaining",
                "Kid Friendly",
                "Holiday",
            ]),
            conflict_rules: to_strings(&[
                "When a dish fits several protein categories, choose the protein that dominates the title.",
                "Desserts and baked sweets go to Desserts unless the title names bread, rolls or pastry dough, which go to Baking.",
                "Only assign Vegetarian as a primary category when no meat or seafood appears in the title or tags.",
                "Dietary tags must never contradict the primary category (no Vegan tag on a Beef dish).",
            ]),
        }
    }
}

impl Vocabulary {
    /// YAML文字列から語彙を読み込む。
    ///
    /// # Errors
    /// YAMLとして解釈できない場合、またはカテゴリが空の場合はエラーを返す。
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let vocabulary: Self =
            serde_yaml::from_str(raw).context("failed to parse vocabulary YAML")?;
        anyhow::ensure!(
            !vocabulary.categories.is_empty(),
            "vocabulary must define at least one category"
        );
        Ok(vocabulary)
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
