use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every editable field of the store-listing mock-up.
///
/// Field names serialize in camelCase so blobs written by earlier builds of
/// the editor still parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockupConfig {
    pub app_name: String,
    pub dev_name: String,
    pub description: String,
    pub rating: String,
    pub downloads: String,
    pub reviews: String,
    pub size: String,
    pub rated_for: String,
    pub version: String,
    pub logo_url: String,
    pub banner_url: String,
    pub screenshots: Vec<String>,
    pub tags: Vec<String>,
}

impl Default for MockupConfig {
    fn default() -> Self {
        Self {
            app_name: "Play Mockup".to_string(),
            dev_name: "Telegram@MayGoogle".to_string(),
            description: "It simulates the Google Play app store experience and supports native swiping and image editing.".to_string(),
            rating: "4.7".to_string(),
            downloads: "500M+".to_string(),
            reviews: "12M".to_string(),
            size: "45 MB".to_string(),
            rated_for: "3+".to_string(),
            version: "1.0.0".to_string(),
            logo_url: "https://picsum.photos/id/237/200/200".to_string(),
            banner_url: "/assets/Feature.png".to_string(),
            screenshots: Vec::new(),
            tags: vec!["Developer".into(), "Tools".into(), "Design".into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedScheme {
    pub id: String,
    pub name: String,
    pub config: MockupConfig,
    /// Milliseconds since the Unix epoch.
    pub saved_at: i64,
}

impl SavedScheme {
    /// Snapshot `config` under a fresh id, stamped with the current time.
    #[must_use]
    pub fn capture(name: &str, config: &MockupConfig) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            config: config.clone(),
            saved_at: Utc::now().timestamp_millis(),
        }
    }
}
