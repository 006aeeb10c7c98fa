use std::collections::{BTreeMap, BTreeSet};

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::domain::RecipeRecord;

/// エクスポート側がURLなしのレコードに入れる値。
const NO_URL_SENTINEL: &str = "No URL";

/// 分類サービスを使わないコレクション全体の統計。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub total_recipes: usize,
    pub recipes_with_urls: usize,
    pub recipes_with_tags: usize,
    pub unique_tags: Vec<String>,
    pub tag_usage: BTreeMap<String, usize>,
    pub url_domains: BTreeMap<String, usize>,
}

impl CollectionStats {
    #[must_use]
    pub fn compute(records: &[RecipeRecord]) -> Self {
        let mut stats = Self {
            total_recipes: records.len(),
            ..Self::default()
        };
        let mut unique_tags = BTreeSet::new();

        for record in records {
            if let Some(url) = record.url.as_deref().filter(|url| *url != NO_URL_SENTINEL) {
                stats.recipes_with_urls += 1;
                if let Some(domain) = url_domain(url) {
                    *stats.url_domains.entry(domain).or_insert(0) += 1;
                }
            }

            if !record.tags.is_empty() {
                stats.recipes_with_tags += 1;
                for tag in &record.tags {
                    unique_tags.insert(tag.clone());
                    *stats.tag_usage.entry(tag.clone()).or_insert(0) += 1;
                }
            }
        }

        stats.unique_tags = unique_tags.into_iter().collect();
        stats
    }

    /// 使用回数の多い順に上位 `limit` 件のタグを返す。
    #[must_use]
    pub fn top_tags(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut tags: Vec<(&str, usize)> = self
            .tag_usage
            .iter()
            .map(|(tag, count)| (tag.as_str(), *count))
            .collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        tags.truncate(limit);
        tags
    }
}

fn url_domain(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
