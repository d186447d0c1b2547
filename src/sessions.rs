//! Session Store: labeling sessions persisted through a [`KeyValueStore`].
//!
//! Each session is one JSON record under `labeling_session:<id>`; a separate
//! `labeling_sessions` key holds the metadata list used for listings. The
//! two writes are sequential with no transaction spanning them. Updates
//! re-insert a missing index entry, which heals an index left behind by an
//! interrupted create.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{DatabaseError, KeyValueStore, SqliteKvStore};
use crate::models::{
    DataItem, LabelResult, LabelingIntent, LabelingSession, SessionStatus, SessionSummary,
};

pub const SESSION_KEY_PREFIX: &str = "labeling_session:";
pub const SESSION_INDEX_KEY: &str = "labeling_sessions";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Corrupt session data: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub fn session_key(id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{id}")
}

pub fn new_session_id() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}

pub struct SessionStore<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    pub fn create(
        &self,
        name: &str,
        data: Vec<DataItem>,
        intent: LabelingIntent,
    ) -> Result<LabelingSession, StoreError> {
        let now = Utc::now();
        let name = match name.trim() {
            "" => format!("Session {}", now.format("%Y-%m-%d %H:%M")),
            trimmed => trimmed.to_string(),
        };
        let session = LabelingSession {
            id: new_session_id(),
            name,
            created_at: now,
            updated_at: now,
            data,
            intent,
            results: Vec::new(),
            status: SessionStatus::InProgress,
        };

        self.write_record(&session)?;
        let mut index = self.read_index()?;
        index.push(session.summary());
        self.write_index(&index)?;

        tracing::info!(session_id = %session.id, items = session.data.len(), "Session created");
        Ok(session)
    }

    pub fn get(&self, id: &str) -> Result<Option<LabelingSession>, StoreError> {
        match self.kv.get(&session_key(id))? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Metadata for every session, in creation order.
    pub fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        self.read_index()
    }

    pub fn update_results(
        &self,
        id: &str,
        results: Vec<LabelResult>,
    ) -> Result<Option<LabelingSession>, StoreError> {
        self.modify(id, |session| session.results = results)
    }

    /// Mark completed, optionally replacing results in the same write.
    pub fn complete(
        &self,
        id: &str,
        results: Option<Vec<LabelResult>>,
    ) -> Result<Option<LabelingSession>, StoreError> {
        self.modify(id, |session| {
            if let Some(results) = results {
                session.results = results;
            }
            session.status = SessionStatus::Completed;
        })
    }

    /// Remove the record and its index entry. False when neither existed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let removed_record = self.kv.remove(&session_key(id))?;

        let mut index = self.read_index()?;
        let before = index.len();
        index.retain(|s| s.id != id);
        let removed_entry = index.len() != before;
        if removed_entry {
            self.write_index(&index)?;
        }

        if removed_record || removed_entry {
            tracing::info!(session_id = id, "Session deleted");
        }
        Ok(removed_record || removed_entry)
    }

    /// Read-modify-write one session and refresh its index entry.
    pub fn modify(
        &self,
        id: &str,
        change: impl FnOnce(&mut LabelingSession),
    ) -> Result<Option<LabelingSession>, StoreError> {
        let Some(mut session) = self.get(id)? else {
            return Ok(None);
        };

        change(&mut session);
        session.updated_at = Utc::now();
        self.write_record(&session)?;

        let mut index = self.read_index()?;
        match index.iter_mut().find(|s| s.id == session.id) {
            Some(entry) => {
                entry.name = session.name.clone();
                entry.updated_at = session.updated_at;
                entry.status = session.status;
            }
            None => {
                tracing::warn!(session_id = %session.id, "Session missing from index, re-adding");
                index.push(session.summary());
            }
        }
        self.write_index(&index)?;

        Ok(Some(session))
    }

    fn write_record(&self, session: &LabelingSession) -> Result<(), StoreError> {
        let json = serde_json::to_string(session)?;
        self.kv.set(&session_key(&session.id), &json)?;
        Ok(())
    }

    fn read_index(&self) -> Result<Vec<SessionSummary>, StoreError> {
        match self.kv.get(SESSION_INDEX_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_index(&self, index: &[SessionSummary]) -> Result<(), StoreError> {
        let json = serde_json::to_string(index)?;
        self.kv.set(SESSION_INDEX_KEY, &json)?;
        Ok(())
    }
}

impl SessionStore<SqliteKvStore> {
    /// Close the underlying database connection.
    pub fn close(self) -> Result<(), StoreError> {
        self.kv.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore<SqliteKvStore> {
        SessionStore::new(SqliteKvStore::open_in_memory().unwrap())
    }

    fn intent() -> LabelingIntent {
        LabelingIntent {
            dataset_description: "Tickets".into(),
            label_categories: vec!["Urgency: High | Low".into()],
            guidelines: String::new(),
        }
    }

    #[test]
    fn create_writes_record_and_index() {
        let store = store();
        let session = store
            .create("Batch 1", DataItem::from_texts(["a", "b"]), intent())
            .unwrap();

        assert!(session.id.starts_with("session_"));
        assert_eq!(session.status, SessionStatus::InProgress);

        let loaded = store.get(&session.id).unwrap().unwrap();
        assert_eq!(loaded, session);

        let list = store.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, session.id);
        assert_eq!(list[0].name, "Batch 1");
    }

    #[test]
    fn blank_name_gets_default() {
        let session = store().create("  ", Vec::new(), intent()).unwrap();
        assert!(session.name.starts_with("Session "));
    }

    #[test]
    fn misses_are_not_errors() {
        let store = store();
        assert!(store.get("session_missing").unwrap().is_none());
        assert!(store.update_results("session_missing", Vec::new()).unwrap().is_none());
        assert!(store.complete("session_missing", None).unwrap().is_none());
        assert!(!store.delete("session_missing").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn update_results_touches_index() {
        let store = store();
        let session = store.create("s", DataItem::from_texts(["a"]), intent()).unwrap();
        let results = vec![LabelResult::new("item-0", "Urgency: High", 90, "r", None)];

        let updated = store.update_results(&session.id, results.clone()).unwrap().unwrap();
        assert_eq!(updated.results, results);
        assert!(updated.updated_at >= session.updated_at);

        let summary = &store.list().unwrap()[0];
        assert_eq!(summary.updated_at, updated.updated_at);
        assert_eq!(summary.status, SessionStatus::InProgress);
    }

    #[test]
    fn complete_sets_status_everywhere() {
        let store = store();
        let session = store.create("s", Vec::new(), intent()).unwrap();
        let done = store.complete(&session.id, None).unwrap().unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        assert_eq!(store.list().unwrap()[0].status, SessionStatus::Completed);
    }

    #[test]
    fn delete_removes_record_and_index_entry() {
        let store = store();
        let keep = store.create("keep", Vec::new(), intent()).unwrap();
        let gone = store.create("gone", Vec::new(), intent()).unwrap();

        assert!(store.delete(&gone.id).unwrap());
        assert!(store.get(&gone.id).unwrap().is_none());
        let ids: Vec<_> = store.list().unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[test]
    fn update_heals_missing_index_entry() {
        let store = store();
        let session = store.create("s", Vec::new(), intent()).unwrap();
        store.kv.set(SESSION_INDEX_KEY, "[]").unwrap();

        store.update_results(&session.id, Vec::new()).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn corrupt_record_is_an_error() {
        let store = store();
        store.kv.set(&session_key("bad"), "{not json").unwrap();
        assert!(matches!(store.get("bad"), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn sessions_survive_close_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.db");

        let store = SessionStore::new(SqliteKvStore::open(&path).unwrap());
        let session = store.create("persisted", Vec::new(), intent()).unwrap();
        store.close().unwrap();

        let reopened = SessionStore::new(SqliteKvStore::open(&path).unwrap());
        assert_eq!(reopened.get(&session.id).unwrap().unwrap().name, "persisted");
    }
}
