//! # Gateway Interface
//!
//! The three remote operations the portal depends on. Flows hold an
//! `Arc<dyn Gateway>` so tests and alternative transports can stand in for
//! [`HttpGateway`](crate::http::HttpGateway).
//!
//! None of these operations is retried automatically.

use aliados_core::{
    BusinessId, CardRegistration, OfferSummary, RedemptionAttempt, RedemptionReceipt,
    RegistrationReceipt,
};
use async_trait::async_trait;

use crate::error::GatewayResult;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Offers of `business` that can be redeemed now.
    async fn list_active_offers(&self, business: BusinessId) -> GatewayResult<Vec<OfferSummary>>;

    /// Records one redemption. Duplicate detection is the gateway's job.
    async fn redeem_offer(&self, attempt: &RedemptionAttempt) -> GatewayResult<RedemptionReceipt>;

    /// Registers a card with the loyalty programme.
    async fn register_card(
        &self,
        registration: &CardRegistration,
    ) -> GatewayResult<RegistrationReceipt>;
}
