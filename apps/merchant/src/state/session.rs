//! # Session State
//!
//! The merchant's business id, read from the session store each time a
//! command needs it. Signing in or out elsewhere is picked up on the next
//! submit.

use std::sync::Arc;

use aliados_core::{BusinessId, MerchantSession};
use aliados_gateway::{GatewayResult, SessionStore};
use tracing::info;

#[derive(Clone)]
pub struct SessionState {
    store: Arc<dyn SessionStore>,
}

impl SessionState {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        SessionState { store }
    }

    pub async fn current(&self) -> MerchantSession {
        self.store.load().await
    }

    /// The business id, or `None` when signed out.
    pub async fn business_id(&self) -> Option<BusinessId> {
        self.current().await.business_id
    }

    pub async fn sign_in(&self, business_id: BusinessId) -> GatewayResult<()> {
        self.store
            .save(&MerchantSession::for_business(business_id))
            .await?;
        info!(business = %business_id, "Signed in");
        Ok(())
    }

    pub async fn sign_out(&self) -> GatewayResult<()> {
        self.store.clear().await?;
        info!("Signed out");
        Ok(())
    }
}
