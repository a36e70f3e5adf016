//! Credential persistence

use crate::types::Session;
use std::sync::Mutex;
use tracing::warn;

/// Callback invoked when another execution context (e.g. a second browser
/// tab) changes or clears the persisted session.
pub type ExternalChangeCallback = Box<dyn Fn(Option<Session>) + Send + Sync>;

/// Durable client-side storage for the session record.
///
/// Implementations map onto a single named entry in a key-value store.
/// `load` never fails: missing or corrupt data reads as an absent session,
/// and corrupt data is cleared on the spot.
pub trait CredentialStore: Send + Sync {
    /// Read the persisted session, if any.
    fn load(&self) -> Option<Session>;

    /// Overwrite the persisted record. Same-process readers never observe a
    /// partial write.
    fn save(&self, session: &Session);

    /// Remove the persisted record.
    fn clear(&self);

    /// Register a callback for changes made by *other* execution contexts.
    /// Same-context `save`/`clear` calls must not trigger it; those go
    /// through direct in-memory updates.
    fn on_external_change(&self, callback: ExternalChangeCallback);
}

/// In-memory store used by tests and non-browser callers.
///
/// Holds the record in serialized form so load exercises the same parse
/// path as a real storage backend.
#[derive(Default)]
pub struct MemoryCredentialStore {
    record: Mutex<Option<String>>,
    listeners: Mutex<Vec<ExternalChangeCallback>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a raw record, valid or not.
    pub fn with_raw_record(raw: impl Into<String>) -> Self {
        let store = Self::new();
        *store.record.lock().expect("record lock poisoned") = Some(raw.into());
        store
    }

    /// The raw persisted record, for assertions.
    pub fn raw_record(&self) -> Option<String> {
        self.record.lock().expect("record lock poisoned").clone()
    }

    /// Simulate another tab writing (or clearing) the record: updates the
    /// stored value and fires the external-change listeners.
    pub fn simulate_external_change(&self, raw: Option<&str>) {
        *self.record.lock().expect("record lock poisoned") = raw.map(str::to_string);
        let session = raw.and_then(|r| serde_json::from_str(r).ok());
        for listener in self.listeners.lock().expect("listener lock poisoned").iter() {
            listener(session.clone());
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<Session> {
        let mut record = self.record.lock().expect("record lock poisoned");
        let raw = record.as_ref()?;
        match serde_json::from_str(raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(%err, "clearing malformed stored session");
                *record = None;
                None
            }
        }
    }

    fn save(&self, session: &Session) {
        let raw = serde_json::to_string(session).expect("session serialization cannot fail");
        *self.record.lock().expect("record lock poisoned") = Some(raw);
    }

    fn clear(&self) {
        *self.record.lock().expect("record lock poisoned") = None;
    }

    fn on_external_change(&self, callback: ExternalChangeCallback) {
        self.listeners
            .lock()
            .expect("listener lock poisoned")
            .push(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn session() -> Session {
        Session {
            access_token: "header.payload.sig".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            user_id: "42".to_string(),
            email: "a@b.com".to_string(),
            role: Role::Instructor,
            name: "a".to_string(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryCredentialStore::new();
        let original = session();
        store.save(&original);
        assert_eq!(store.load(), Some(original));
    }

    #[test]
    fn load_without_record_is_absent() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn malformed_record_loads_as_absent_and_is_cleared() {
        for raw in ["not json", "{\"accessToken\":", "[1,2,3]", "{}"] {
            let store = MemoryCredentialStore::with_raw_record(raw);
            assert_eq!(store.load(), None, "raw record {raw:?} should read absent");
            assert_eq!(store.raw_record(), None, "raw record {raw:?} should be cleared");
        }
    }

    #[test]
    fn clear_removes_the_record() {
        let store = MemoryCredentialStore::new();
        store.save(&session());
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn external_change_notifies_listeners_with_parsed_session() {
        let store = MemoryCredentialStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_listener = seen.clone();
        store.on_external_change(Box::new(move |session| {
            seen_by_listener
                .lock()
                .expect("seen lock poisoned")
                .push(session);
        }));

        let raw = serde_json::to_string(&session()).unwrap();
        store.simulate_external_change(Some(&raw));
        store.simulate_external_change(None);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], Some(session()));
        assert_eq!(seen[1], None);
    }

    #[test]
    fn same_context_save_does_not_notify_listeners() {
        let store = MemoryCredentialStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_by_listener = calls.clone();
        store.on_external_change(Box::new(move |_| {
            calls_by_listener.fetch_add(1, Ordering::SeqCst);
        }));

        store.save(&session());
        store.clear();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
