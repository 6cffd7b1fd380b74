//! Embedded namespaced key-value store for conversation memory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde_json::Value;

use agent_gateway_core::{ChatMessage, StoreError};

use crate::records::{
    CONVERSATIONS_NAMESPACE, ConversationThread, PREFERENCES_NAMESPACE, PreferenceRecord,
    SETTINGS_KEY, StoreNamespace, UserConversationRecord,
};

const MEMORIES: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("memories");

/// Durable namespaced key-value storage for threads and preferences.
///
/// Every operation runs in its own transaction and commits before
/// returning, so no transaction is ever left open across calls sharing the
/// database. Read-modify-write thread operations additionally hold a
/// per-`(user_id, thread_id)` lock: two concurrent turns on one thread
/// serialize instead of silently dropping each other's write.
pub struct DurableMemoryStore {
    db: Arc<Database>,
    thread_locks: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl DurableMemoryStore {
    /// Open (or create) the store at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(internal)?;
        let write_txn = db.begin_write().map_err(internal)?;
        write_txn.open_table(MEMORIES).map_err(internal)?;
        write_txn.commit().map_err(internal)?;
        Ok(Self {
            db: Arc::new(db),
            thread_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Read the record at `(namespace, key)`.
    ///
    /// # Errors
    /// Returns an error if the store or the stored encoding fails.
    pub fn get(&self, namespace: &StoreNamespace, key: &str) -> Result<Option<Value>, StoreError> {
        let read_txn = self.db.begin_read().map_err(internal)?;
        let table = read_txn.open_table(MEMORIES).map_err(internal)?;
        let Some(raw) = table
            .get(namespace.key_for(key).as_str())
            .map_err(internal)?
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(raw.value())?))
    }

    /// Write the record at `(namespace, key)`, replacing any existing value.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn put(
        &self,
        namespace: &StoreNamespace,
        key: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write().map_err(internal)?;
        {
            let mut table = write_txn.open_table(MEMORIES).map_err(internal)?;
            table
                .insert(namespace.key_for(key).as_str(), encoded.as_slice())
                .map_err(internal)?;
        }
        write_txn.commit().map_err(internal)?;
        Ok(())
    }

    /// Remove the record at `(namespace, key)`; returns whether it existed.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn remove(&self, namespace: &StoreNamespace, key: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write().map_err(internal)?;
        let existed = {
            let mut table = write_txn.open_table(MEMORIES).map_err(internal)?;
            table
                .remove(namespace.key_for(key).as_str())
                .map_err(internal)?
                .is_some()
        };
        write_txn.commit().map_err(internal)?;
        Ok(existed)
    }

    /// Seed the preference singleton if absent.
    ///
    /// Idempotent: an existing record is never overwritten, so
    /// `created_at` survives restarts.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn initialize_preferences(&self) -> Result<(), StoreError> {
        let namespace = StoreNamespace::from(PREFERENCES_NAMESPACE);
        if self.get(&namespace, SETTINGS_KEY)?.is_some() {
            return Ok(());
        }
        let defaults = serde_json::to_value(PreferenceRecord::defaults())?;
        self.put(&namespace, SETTINGS_KEY, &defaults)?;
        tracing::info!("initialized default user preferences");
        Ok(())
    }

    /// All conversation threads of `user_id`, empty if none recorded.
    ///
    /// # Errors
    /// Returns an error if the store or the stored encoding fails.
    pub fn list_threads(&self, user_id: &str) -> Result<Vec<ConversationThread>, StoreError> {
        Ok(self.load_user_record(user_id)?.threads)
    }

    /// The thread `thread_id` of `user_id`, if any.
    ///
    /// # Errors
    /// Returns an error if the store or the stored encoding fails.
    pub fn get_thread(
        &self,
        user_id: &str,
        thread_id: &str,
    ) -> Result<Option<ConversationThread>, StoreError> {
        Ok(self
            .list_threads(user_id)?
            .into_iter()
            .find(|thread| thread.thread_id == thread_id))
    }

    /// Replace the thread `thread_id` with `messages`, appending a new
    /// thread if none matches.
    ///
    /// Whole-record read-modify-write: the owning user record is rewritten
    /// in full, never appended to, so the thread id stays unique.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn upsert_thread(
        &self,
        user_id: &str,
        thread_id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<(), StoreError> {
        let lock = self.thread_lock(user_id, thread_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut record = self.load_user_record(user_id)?;
        let now = Utc::now();
        match record
            .threads
            .iter_mut()
            .find(|thread| thread.thread_id == thread_id)
        {
            Some(thread) => {
                thread.messages = messages;
                thread.updated_at = now;
            }
            None => record.threads.push(ConversationThread {
                thread_id: thread_id.to_string(),
                date: now.format("%Y-%m-%d").to_string(),
                messages,
                updated_at: now,
            }),
        }
        self.store_user_record(&record)
    }

    /// Delete the thread `thread_id` of `user_id`.
    ///
    /// Writes back and returns true only if a thread was removed; an
    /// absent thread leaves storage untouched.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn delete_thread(&self, user_id: &str, thread_id: &str) -> Result<bool, StoreError> {
        let lock = self.thread_lock(user_id, thread_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut record = self.load_user_record(user_id)?;
        let before = record.threads.len();
        record.threads.retain(|thread| thread.thread_id != thread_id);
        if record.threads.len() == before {
            return Ok(false);
        }
        self.store_user_record(&record)?;
        Ok(true)
    }

    fn load_user_record(&self, user_id: &str) -> Result<UserConversationRecord, StoreError> {
        let namespace = StoreNamespace::from(CONVERSATIONS_NAMESPACE);
        match self.get(&namespace, user_id)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(UserConversationRecord::empty(user_id)),
        }
    }

    fn store_user_record(&self, record: &UserConversationRecord) -> Result<(), StoreError> {
        let namespace = StoreNamespace::from(CONVERSATIONS_NAMESPACE);
        self.put(&namespace, &record.user_id, &serde_json::to_value(record)?)
    }

    fn thread_lock(&self, user_id: &str, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .thread_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            locks
                .entry((user_id.to_string(), thread_id.to_string()))
                .or_default(),
        )
    }
}

fn internal(err: impl std::fmt::Display) -> StoreError {
    StoreError::Internal(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_gateway_core::ChatMessage;
    use tempfile::TempDir;

    fn open_store() -> (DurableMemoryStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = DurableMemoryStore::open(dir.path().join("memories.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn repeated_upsert_keeps_one_thread_with_latest_messages() {
        let (store, _dir) = open_store();

        store
            .upsert_thread("u1", "t1", vec![ChatMessage::human("first")])
            .unwrap();
        store
            .upsert_thread(
                "u1",
                "t1",
                vec![ChatMessage::human("first"), ChatMessage::ai("reply")],
            )
            .unwrap();

        let threads = store.list_threads("u1").unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].thread_id, "t1");
        assert_eq!(threads[0].messages.len(), 2);
    }

    #[test]
    fn upsert_preserves_other_threads() {
        let (store, _dir) = open_store();

        store
            .upsert_thread("u1", "t1", vec![ChatMessage::human("a")])
            .unwrap();
        store
            .upsert_thread("u1", "t2", vec![ChatMessage::human("b")])
            .unwrap();
        store
            .upsert_thread("u1", "t1", vec![ChatMessage::human("a2")])
            .unwrap();

        let threads = store.list_threads("u1").unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(store.get_thread("u1", "t2").unwrap().unwrap().messages[0].content, "b");
    }

    #[test]
    fn delete_removes_then_reports_absence() {
        let (store, _dir) = open_store();

        store
            .upsert_thread("u1", "t1", vec![ChatMessage::human("a")])
            .unwrap();
        store
            .upsert_thread("u1", "t2", vec![ChatMessage::human("b")])
            .unwrap();

        assert!(store.delete_thread("u1", "t1").unwrap());
        let remaining = store.list_threads("u1").unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].thread_id, "t2");

        // second delete finds nothing and must not rewrite the record
        assert!(!store.delete_thread("u1", "t1").unwrap());
        assert_eq!(store.list_threads("u1").unwrap(), remaining);
    }

    #[test]
    fn listing_an_unknown_user_is_empty() {
        let (store, _dir) = open_store();
        assert!(store.list_threads("nobody").unwrap().is_empty());
        assert!(store.get_thread("nobody", "t").unwrap().is_none());
    }

    #[test]
    fn preference_initialization_is_idempotent() {
        let (store, _dir) = open_store();
        let namespace = StoreNamespace::from(PREFERENCES_NAMESPACE);

        store.initialize_preferences().unwrap();
        let first = store.get(&namespace, SETTINGS_KEY).unwrap().unwrap();

        store.initialize_preferences().unwrap();
        let second = store.get(&namespace, SETTINGS_KEY).unwrap().unwrap();

        assert_eq!(first["created_at"], second["created_at"]);
        assert_eq!(first["theme"], "default");
    }

    #[test]
    fn records_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memories.redb");
        {
            let store = DurableMemoryStore::open(&path).unwrap();
            store
                .upsert_thread("u1", "t1", vec![ChatMessage::human("hello")])
                .unwrap();
        }
        let store = DurableMemoryStore::open(&path).unwrap();
        assert_eq!(store.list_threads("u1").unwrap().len(), 1);
    }

    #[test]
    fn namespaces_partition_keys() {
        let (store, _dir) = open_store();
        let a = StoreNamespace::new(["memories", "alpha"]);
        let b = StoreNamespace::new(["memories", "beta"]);

        store.put(&a, "k", &serde_json::json!(1)).unwrap();
        assert_eq!(store.get(&a, "k").unwrap(), Some(serde_json::json!(1)));
        assert_eq!(store.get(&b, "k").unwrap(), None);

        assert!(store.remove(&a, "k").unwrap());
        assert!(!store.remove(&a, "k").unwrap());
    }
}
