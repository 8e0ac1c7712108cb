//! Credential storage.
//!
//! A thin key-value layer over the four session fields. Stores perform no
//! validation and track no expiry; token lifetimes belong to the server.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::AuthResponse;

/// Default file name for the persisted session.
pub const SESSION_FILE: &str = "session.json";

// ============================================================================
// CredentialField
// ============================================================================

/// One of the four stored session fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CredentialField {
    AccessToken,
    RefreshToken,
    DeviceId,
    UserId,
}

impl CredentialField {
    /// Every field, in storage order.
    pub const ALL: [CredentialField; 4] = [
        CredentialField::AccessToken,
        CredentialField::RefreshToken,
        CredentialField::DeviceId,
        CredentialField::UserId,
    ];

    /// Storage key for this field.
    pub fn key(self) -> &'static str {
        match self {
            CredentialField::AccessToken => "access_token",
            CredentialField::RefreshToken => "refresh_token",
            CredentialField::DeviceId => "device_id",
            CredentialField::UserId => "user_id",
        }
    }
}

impl std::fmt::Display for CredentialField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// CredentialStore Trait
// ============================================================================

/// Key-value persistence for session credentials.
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Read a field.
    fn get(&self, field: CredentialField) -> Option<String>;

    /// Write a field.
    fn set(&self, field: CredentialField, value: &str) -> Result<()>;

    /// Remove a field.
    fn remove(&self, field: CredentialField) -> Result<()>;

    /// Remove every field.
    fn clear(&self) -> Result<()>;

    fn access_token(&self) -> Option<String> {
        self.get(CredentialField::AccessToken)
    }

    fn set_access_token(&self, token: &str) -> Result<()> {
        self.set(CredentialField::AccessToken, token)
    }

    fn refresh_token(&self) -> Option<String> {
        self.get(CredentialField::RefreshToken)
    }

    fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.set(CredentialField::RefreshToken, token)
    }

    fn device_id(&self) -> Option<String> {
        self.get(CredentialField::DeviceId)
    }

    fn user_id(&self) -> Option<String> {
        self.get(CredentialField::UserId)
    }

    /// Store all four fields from a sign-in response.
    fn save_auth(&self, auth: &AuthResponse) -> Result<()> {
        self.set(CredentialField::AccessToken, &auth.access_token)?;
        self.set(CredentialField::RefreshToken, &auth.refresh_token)?;
        self.set(CredentialField::DeviceId, &auth.device_id)?;
        self.set(CredentialField::UserId, &auth.user_id)
    }

    /// Return the stored device id, generating and persisting a UUID v4 on
    /// first use.
    fn get_or_create_device_id(&self) -> Result<String> {
        if let Some(id) = self.device_id() {
            return Ok(id);
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.set(CredentialField::DeviceId, &id)?;
        Ok(id)
    }
}

/// Shared credential store for use across async contexts.
pub type SharedCredentialStore = Arc<dyn CredentialStore>;

// ============================================================================
// MemoryCredentialStore
// ============================================================================

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    fields: RwLock<BTreeMap<CredentialField, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a sign-in response.
    pub fn with_auth(auth: &AuthResponse) -> Self {
        let store = Self::new();
        {
            let mut fields = store.fields.write();
            fields.insert(CredentialField::AccessToken, auth.access_token.clone());
            fields.insert(CredentialField::RefreshToken, auth.refresh_token.clone());
            fields.insert(CredentialField::DeviceId, auth.device_id.clone());
            fields.insert(CredentialField::UserId, auth.user_id.clone());
        }
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, field: CredentialField) -> Option<String> {
        self.fields.read().get(&field).cloned()
    }

    fn set(&self, field: CredentialField, value: &str) -> Result<()> {
        self.fields.write().insert(field, value.to_string());
        Ok(())
    }

    fn remove(&self, field: CredentialField) -> Result<()> {
        self.fields.write().remove(&field);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.fields.write().clear();
        Ok(())
    }
}

// ============================================================================
// FileCredentialStore
// ============================================================================

/// On-disk layout of the session file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// JSON-file credential store.
///
/// The file is read once on open; every mutation is written through. Clearing
/// the store deletes the file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    fields: RwLock<BTreeMap<String, String>>,
}

impl FileCredentialStore {
    /// Open (or lazily create) a store backed by `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let fields = if path.is_file() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Store(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let file: SessionFile = serde_json::from_str(&content).map_err(|e| {
                Error::Store(format!("Failed to parse {}: {}", path.display(), e))
            })?;
            file.fields
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            fields: RwLock::new(fields),
        })
    }

    /// Open the default session file inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Result<Self> {
        Self::open(data_dir.join(SESSION_FILE))
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the fields and keep it only once it is on
    /// disk. `change` returns whether anything needs writing.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<()> {
        let mut fields = self.fields.write();
        let mut next = fields.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next)?;
        *fields = next;
        Ok(())
    }

    fn persist(&self, fields: &BTreeMap<String, String>) -> Result<()> {
        if fields.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).map_err(|e| {
                    Error::Store(format!("Failed to delete {}: {}", self.path.display(), e))
                })?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Store(format!("Failed to create session directory: {}", e))
            })?;
        }

        let file = SessionFile {
            fields: fields.clone(),
            updated_at: Some(chrono::Utc::now()),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, json).map_err(|e| {
            Error::Store(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        tracing::trace!(path = %self.path.display(), "session file written");
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, field: CredentialField) -> Option<String> {
        self.fields.read().get(field.key()).cloned()
    }

    fn set(&self, field: CredentialField, value: &str) -> Result<()> {
        self.update(|fields| {
            fields.insert(field.key().to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, field: CredentialField) -> Result<()> {
        self.update(|fields| fields.remove(field.key()).is_some())
    }

    fn clear(&self) -> Result<()> {
        self.update(|fields| {
            fields.clear();
            true
        })
    }
}

/// Create a shared in-memory store.
pub fn memory_store() -> SharedCredentialStore {
    Arc::new(MemoryCredentialStore::new())
}
