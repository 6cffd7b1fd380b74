//! Conversation identity resolution.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback user when the caller does not identify themselves.
pub const DEFAULT_USER_ID: &str = "default";

/// The `(user_id, thread_id)` pair correlating an invocation with stored
/// conversation memory.
///
/// `thread_id` doubles as the durable key for reconnecting to an existing
/// conversation: the identity itself lives for one invocation, but the
/// thread id persists across invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub thread_id: String,
}

impl Identity {
    /// Resolve the identity for an invocation.
    ///
    /// A supplied session id is used verbatim as the thread id so clients
    /// can reconnect to an existing conversation; otherwise a fresh unique
    /// token is generated. Always succeeds.
    #[must_use]
    pub fn resolve(session_id: Option<&str>, user_id: Option<&str>) -> Self {
        let thread_id = match session_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        let user_id = match user_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => DEFAULT_USER_ID.to_string(),
        };
        Self { user_id, thread_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_used_verbatim() {
        let identity = Identity::resolve(Some("abc"), Some("u1"));
        assert_eq!(identity.thread_id, "abc");
        assert_eq!(identity.user_id, "u1");
    }

    #[test]
    fn missing_session_id_generates_distinct_threads() {
        let a = Identity::resolve(None, None);
        let b = Identity::resolve(None, None);
        assert_ne!(a.thread_id, b.thread_id);
        assert_eq!(a.user_id, DEFAULT_USER_ID);
    }

    #[test]
    fn empty_session_id_is_treated_as_absent() {
        let identity = Identity::resolve(Some(""), Some(""));
        assert!(!identity.thread_id.is_empty());
        assert_eq!(identity.user_id, DEFAULT_USER_ID);
    }
}
