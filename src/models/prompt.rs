//! Prompt and like records as they travel over the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Remote-assigned prompt identifier.
pub type PromptId = i64;

/// A community-submitted prompt.
///
/// The three counters are denormalised mirrors of related tables and may
/// drift from the true relation counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub username: Option<String>,
    /// Set for prompts published by the gallery owner ("official").
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_owner: bool,
    #[serde(default, deserialize_with = "deserialize_counter")]
    pub likes: u64,
    #[serde(default, deserialize_with = "deserialize_counter")]
    pub copy_count: u64,
    #[serde(default, deserialize_with = "deserialize_counter")]
    pub report_count: u64,
    pub created_at: DateTime<Utc>,
}

impl Prompt {
    /// Case-insensitive substring match against title or text.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.text.to_lowercase().contains(&needle)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Counters are nullable and unconstrained in the remote table; anything
/// missing, null or negative reads as zero.
fn deserialize_counter<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<i64> = Option::deserialize(deserializer)?;
    Ok(value.map(|v| v.max(0) as u64).unwrap_or(0))
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<bool> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or(false))
}

/// Row inserted by the submission flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPrompt {
    pub title: String,
    pub text: String,
    pub image_url: Option<String>,
    pub user_id: Uuid,
    pub username: String,
    pub is_owner: bool,
}

/// A single denormalised counter write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterUpdate {
    Likes(u64),
    Copies(u64),
    Reports(u64),
}

impl CounterUpdate {
    pub fn column(&self) -> &'static str {
        match self {
            CounterUpdate::Likes(_) => "likes",
            CounterUpdate::Copies(_) => "copy_count",
            CounterUpdate::Reports(_) => "report_count",
        }
    }

    pub fn value(&self) -> u64 {
        match self {
            CounterUpdate::Likes(v) | CounterUpdate::Copies(v) | CounterUpdate::Reports(v) => *v,
        }
    }

    /// JSON patch body, e.g. `{"likes": 3}`.
    pub fn to_patch(&self) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(self.column().to_string(), self.value().into());
        serde_json::Value::Object(body)
    }

    /// Apply the write to a local copy of the prompt.
    pub fn apply(&self, prompt: &mut Prompt) {
        match *self {
            CounterUpdate::Likes(v) => prompt.likes = v,
            CounterUpdate::Copies(v) => prompt.copy_count = v,
            CounterUpdate::Reports(v) => prompt.report_count = v,
        }
    }
}

/// One user's endorsement of one prompt. Unique per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
    pub prompt_id: PromptId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json(likes: &str) -> String {
        format!(
            r#"{{"id":5,"title":"Cat","text":"A cat","likes":{},"created_at":"2024-05-01T10:00:00Z"}}"#,
            likes
        )
    }

    #[test]
    fn test_null_counter_reads_as_zero() {
        let prompt: Prompt = serde_json::from_str(&sample_json("null")).unwrap();
        assert_eq!(prompt.likes, 0);
        assert_eq!(prompt.copy_count, 0);
        assert_eq!(prompt.report_count, 0);
        assert!(!prompt.is_owner);
    }

    #[test]
    fn test_negative_counter_floors_at_zero() {
        let prompt: Prompt = serde_json::from_str(&sample_json("-2")).unwrap();
        assert_eq!(prompt.likes, 0);
    }

    #[test]
    fn test_matches_title_or_text_case_insensitive() {
        let prompt: Prompt = serde_json::from_str(&sample_json("1")).unwrap();
        assert!(prompt.matches("CAT"));
        assert!(prompt.matches("a c"));
        assert!(!prompt.matches("dog"));
    }

    #[test]
    fn test_counter_patch_body() {
        assert_eq!(
            CounterUpdate::Copies(4).to_patch(),
            serde_json::json!({ "copy_count": 4 })
        );
        assert_eq!(
            CounterUpdate::Reports(9).to_patch(),
            serde_json::json!({ "report_count": 9 })
        );
    }
}
