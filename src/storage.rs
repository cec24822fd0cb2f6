//! Persistent named-slot storage
//!
//! Each slot is a single JSON document stored as `<root>/<slot>.json`. The
//! chat history lives in the [`HISTORY_SLOT`] slot.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{ChatMessage, Role};

pub const HISTORY_SLOT: &str = "3d_print_chat_history";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to create storage directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to storage: {0}")]
    Write(#[source] std::io::Error),

    #[error("Failed to delete from storage: {0}")]
    Delete(#[source] std::io::Error),

    #[error("Failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug)]
pub struct SlotStore {
    root: PathBuf,
}

impl SlotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted in the platform's local data directory.
    pub fn default_location() -> Self {
        if let Some(data_dir) = dirs::data_local_dir() {
            return Self::new(data_dir.join("print-debugger").join("storage"));
        }

        Self::new(PathBuf::from("cache").join("storage"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.root.join(format!("{}.json", sanitize_slot(slot)))
    }

    pub fn get(&self, slot: &str) -> Option<String> {
        fs::read_to_string(self.slot_path(slot)).ok()
    }

    pub fn set(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|source| StorageError::CreateDir {
            path: self.root.clone(),
            source,
        })?;
        fs::write(self.slot_path(slot), value).map_err(StorageError::Write)
    }

    pub fn delete(&self, slot: &str) -> Result<(), StorageError> {
        let path = self.slot_path(slot);
        if path.exists() {
            fs::remove_file(path).map_err(StorageError::Delete)?;
        }
        Ok(())
    }

    /// Persisted chat messages, or `None` when the slot is missing or does
    /// not hold a valid message list.
    pub fn load_history(&self) -> Option<Vec<ChatMessage>> {
        let raw = self.get(HISTORY_SLOT)?;
        match serde_json::from_str::<Vec<ChatMessage>>(&raw) {
            Ok(messages) => Some(messages),
            Err(err) => {
                tracing::warn!(error = %err, "stored chat history is corrupt, ignoring it");
                None
            }
        }
    }

    /// Write the history slot. System entries are never persisted.
    pub fn save_history(&self, messages: &[ChatMessage]) -> Result<(), StorageError> {
        let persisted: Vec<&ChatMessage> = messages
            .iter()
            .filter(|msg| msg.role != Role::System)
            .collect();
        let json = serde_json::to_string(&persisted)?;
        self.set(HISTORY_SLOT, &json)
    }
}

fn sanitize_slot(slot: &str) -> String {
    slot.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(64)
        .collect()
}
