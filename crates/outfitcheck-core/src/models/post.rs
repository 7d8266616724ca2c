use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A feed post, as seen by the requesting user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub outfit_id: Option<i64>,
    pub caption: Option<String>,
    pub posted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked_by_current_user: bool,
    pub image_url: Option<String>,
}

/// Text fields of a new post; the photo travels alongside as a file part
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub user_id: i64,
    pub outfit_id: i64,
    pub caption: String,
    pub hashtags: Vec<String>,
}

impl NewPost {
    /// Hashtags in the backend's comma-separated form
    pub fn hashtag_field(&self) -> String {
        self.hashtags
            .iter()
            .map(|tag| tag.trim().trim_start_matches('#'))
            .filter(|tag| !tag.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}
