//! # Session Store
//!
//! Where the signed-in merchant's business id lives between runs.
//!
//! The file holds one JSON object:
//! ```text
//! {"id_negocio": "42"}
//! ```
//! `id_negocio_logeado` is accepted as an alias, and the id may be a string
//! or a number. Anything missing, blank or unreadable loads as an anonymous
//! session, so redemption fails closed instead of guessing a business.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use aliados_core::MerchantSession;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, GatewayResult};

const SESSION_KEYS: [&str; 2] = ["id_negocio", "id_negocio_logeado"];

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session. Never fails: problems yield an anonymous session.
    async fn load(&self) -> MerchantSession;

    async fn save(&self, session: &MerchantSession) -> GatewayResult<()>;

    /// Signs out.
    async fn clear(&self) -> GatewayResult<()>;
}

// =============================================================================
// File Store
// =============================================================================

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Pulls the stored business id out of a session document.
fn stored_business_id(doc: &Value) -> Option<String> {
    SESSION_KEYS.iter().find_map(|key| match doc.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> MerchantSession {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?self.path, "No session file, signed out");
                return MerchantSession::anonymous();
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Could not read session file");
                return MerchantSession::anonymous();
            }
        };

        let doc: Value = match serde_json::from_str(&contents) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Corrupt session file");
                return MerchantSession::anonymous();
            }
        };

        let session = MerchantSession::from_stored(stored_business_id(&doc).as_deref());
        if !session.is_authenticated() {
            warn!(path = ?self.path, "Session file has no usable business id");
        }
        session
    }

    async fn save(&self, session: &MerchantSession) -> GatewayResult<()> {
        let Some(business_id) = session.business_id else {
            return self.clear().await;
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| GatewayError::SessionStore(e.to_string()))?;
        }

        let doc = json!({ "id_negocio": business_id.to_string() });
        tokio::fs::write(&self.path, doc.to_string())
            .await
            .map_err(|e| GatewayError::SessionStore(e.to_string()))?;

        info!(business = %business_id, "Session saved");
        Ok(())
    }

    async fn clear(&self) -> GatewayResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GatewayError::SessionStore(e.to_string())),
        }
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-process session, for a business id supplied by the environment.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<MerchantSession>,
}

impl MemorySessionStore {
    pub fn new(session: MerchantSession) -> Self {
        MemorySessionStore {
            session: RwLock::new(session),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> MerchantSession {
        self.session.read().await.clone()
    }

    async fn save(&self, session: &MerchantSession) -> GatewayResult<()> {
        *self.session.write().await = session.clone();
        Ok(())
    }

    async fn clear(&self) -> GatewayResult<()> {
        *self.session.write().await = MerchantSession::anonymous();
        Ok(())
    }
}
