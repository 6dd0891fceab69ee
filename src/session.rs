use std::sync::Arc;

use anyhow::{bail, Result};
use parking_lot::RwLock;
use tracing::info;

use crate::storage::KeyValue;

/// Key the session token is persisted under.
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("token is empty")]
    EmptyToken,
}

/// Tracks whether a user is signed in.
///
/// The persisted token is read once when the manager is created. Its presence
/// alone decides the initial state; freshness is never revalidated.
pub struct Manager {
    store: Arc<dyn KeyValue>,
    token: RwLock<Option<String>>,
}

impl Manager {
    pub fn new(store: Arc<dyn KeyValue>) -> Result<Self> {
        let token = store
            .get(TOKEN_KEY)?
            .filter(|value| !value.is_empty());
        if token.is_some() {
            info!("resuming persisted session");
        }
        Ok(Self {
            store,
            token: RwLock::new(token),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn login(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            bail!(SessionError::EmptyToken);
        }
        self.store.set(TOKEN_KEY, token)?;
        *self.token.write() = Some(token.to_string());
        info!("session started");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.store.delete(TOKEN_KEY)?;
        *self.token.write() = None;
        info!("session cleared");
        Ok(())
    }
}
