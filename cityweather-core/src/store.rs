//! Persistence of user records.
//!
//! The saved-city logic only needs two things from a store: resolve a session
//! token to a user, and write a user back. Writes replace the whole record, so
//! concurrent writers for the same user are last-write-wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, path::PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{error::StoreError, model::User};

#[async_trait]
pub trait UserStore: Send + Sync + Debug {
    async fn load_by_session(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Insert or replace the user with the same id.
    async fn save(&self, user: &User) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct UserDocument {
    #[serde(default)]
    users: Vec<User>,
}

impl UserDocument {
    fn find_by_session(&self, token: &str) -> Option<User> {
        self.users.iter().find(|u| u.has_session(token)).cloned()
    }

    fn upsert(&mut self, user: &User) {
        match self.users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => self.users.push(user.clone()),
        }
    }
}

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    doc: RwLock<UserDocument>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            doc: RwLock::new(UserDocument { users }),
        }
    }

    pub async fn get(&self, id: &str) -> Option<User> {
        self.doc.read().await.users.iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn load_by_session(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self.doc.read().await.find_by_session(token))
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        self.doc.write().await.upsert(user);
        Ok(())
    }
}

/// Users kept in a single JSON document, rewritten on every save.
#[derive(Debug)]
pub struct JsonFileUserStore {
    path: PathBuf,
    doc: RwLock<UserDocument>,
}

impl JsonFileUserStore {
    /// Open the document at `path`; a missing file starts empty and is created on first save.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UserDocument::default(),
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), users = doc.users.len(), "Opened user data file");

        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    pub async fn get(&self, id: &str) -> Option<User> {
        self.doc.read().await.users.iter().find(|u| u.id == id).cloned()
    }
}

#[async_trait]
impl UserStore for JsonFileUserStore {
    async fn load_by_session(&self, token: &str) -> Result<Option<User>, StoreError> {
        Ok(self.doc.read().await.find_by_session(token))
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut doc = self.doc.write().await;
        doc.upsert(user);
        let bytes = serde_json::to_vec_pretty(&*doc)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write-then-rename keeps the previous document intact if the write fails midway.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(user = %user.id, path = %self.path.display(), "Saved user");
        Ok(())
    }
}
