//! Browser-side credential persistence
//!
//! [`LocalStorageCredentialStore`] keeps the session record in a single
//! `localStorage` entry so it survives reloads, and turns the browser's
//! `storage` events into external-change notifications. The browser only
//! fires `storage` in tabs other than the writer, which is exactly the
//! cross-tab contract of [`CredentialStore::on_external_change`].

use edusync_core::{CredentialStore, ExternalChangeCallback, Session};
use gloo::events::EventListener;
use gloo::storage::errors::StorageError;
use gloo::storage::{LocalStorage, Storage};
use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::StorageEvent;

/// localStorage key holding the serialized session.
pub const SESSION_STORAGE_KEY: &str = "user";

/// Credential store backed by `window.localStorage`.
#[derive(Debug, Clone, Default)]
pub struct LocalStorageCredentialStore;

impl LocalStorageCredentialStore {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialStore for LocalStorageCredentialStore {
    fn load(&self) -> Option<Session> {
        match LocalStorage::get::<Session>(SESSION_STORAGE_KEY) {
            Ok(session) => Some(session),
            Err(StorageError::KeyNotFound(_)) => None,
            Err(err) => {
                warn!(%err, "clearing malformed stored session");
                LocalStorage::delete(SESSION_STORAGE_KEY);
                None
            }
        }
    }

    fn save(&self, session: &Session) {
        if let Err(err) = LocalStorage::set(SESSION_STORAGE_KEY, session) {
            // Quota or serialization trouble is an environment failure; the
            // in-memory session stays usable for this tab either way.
            warn!(%err, "failed to persist session");
        }
    }

    fn clear(&self) {
        LocalStorage::delete(SESSION_STORAGE_KEY);
    }

    fn on_external_change(&self, callback: ExternalChangeCallback) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let listener = EventListener::new(&window, "storage", move |event| {
            let Some(event) = event.dyn_ref::<StorageEvent>() else {
                return;
            };
            if event.key().as_deref() != Some(SESSION_STORAGE_KEY) {
                return;
            }
            let session = event
                .new_value()
                .and_then(|raw| serde_json::from_str(&raw).ok());
            callback(session);
        });
        // The subscription lives for the lifetime of the page.
        listener.forget();
    }
}
