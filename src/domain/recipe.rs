use serde::{Deserialize, Serialize};

/// ソースコレクションから読み込んだレシピ1件。読み込み後は不変。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRecord {
    /// ソースコレクション内の位置（0始まり）。
    pub index: usize,
    pub title: String,
    pub tags: Vec<String>,
    pub record_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// 入力ファイル上のレコード形式。`index` は読み込み順で採番する。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub record_id: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl RecipeRecord {
    /// 入力レコード列に位置インデックスを振ってコレクションを作る。
    ///
    /// 既存タグは順序を保ったまま重複を除去する。
    #[must_use]
    pub fn index_all(inputs: Vec<RecordInput>) -> Vec<RecipeRecord> {
        inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                let mut tags: Vec<String> = Vec::with_capacity(input.tags.len());
                for tag in input.tags {
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
                RecipeRecord {
                    index,
                    title: input.title,
                    tags,
                    record_id: input.record_id,
                    url: input.url.filter(|url| !url.trim().is_empty()),
                }
            })
            .collect()
    }

    /// プロンプトやログに使う表示用タイトル。空なら `Untitled`。
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }
}
