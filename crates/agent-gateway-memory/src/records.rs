//! Stored record shapes and namespace constants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agent_gateway_core::ChatMessage;

/// Namespace holding one conversation record per user.
pub const CONVERSATIONS_NAMESPACE: [&str; 2] = ["memories", "conversations"];
/// Namespace holding the preference singleton.
pub const PREFERENCES_NAMESPACE: [&str; 2] = ["memories", "preferences"];
/// Key of the preference singleton within its namespace.
pub const SETTINGS_KEY: &str = "settings";

/// Ordered path segments acting as a partition key into the durable store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreNamespace(Vec<String>);

impl StoreNamespace {
    #[must_use]
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Composite store key for `key` within this namespace.
    #[must_use]
    pub fn key_for(&self, key: &str) -> String {
        if self.0.is_empty() {
            return key.to_string();
        }
        let mut composite = self.0.join("/");
        composite.push('/');
        composite.push_str(key);
        composite
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl<const N: usize> From<[&str; N]> for StoreNamespace {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

/// One conversation thread of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    pub thread_id: String,
    /// Day the thread was first persisted, `YYYY-MM-DD`.
    pub date: String,
    pub messages: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

/// All conversation threads of one user, stored under a single key.
///
/// Threads are unique by `thread_id`; persistence replaces in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConversationRecord {
    pub user_id: String,
    #[serde(default)]
    pub threads: Vec<ConversationThread>,
}

impl UserConversationRecord {
    #[must_use]
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            threads: Vec::new(),
        }
    }
}

/// Per-namespace preference singleton, seeded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub theme: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PreferenceRecord {
    /// Defaults written when no record exists yet.
    #[must_use]
    pub fn defaults() -> Self {
        let now = Utc::now();
        Self {
            theme: "default".to_string(),
            language: "zh-CN".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_builds_composite_keys() {
        let namespace = StoreNamespace::from(CONVERSATIONS_NAMESPACE);
        assert_eq!(namespace.key_for("u1"), "memories/conversations/u1");
    }

    #[test]
    fn empty_namespace_degenerates_to_plain_key() {
        let namespace = StoreNamespace::new(Vec::<String>::new());
        assert_eq!(namespace.key_for("k"), "k");
    }
}
