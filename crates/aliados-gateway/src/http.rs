//! # HTTP Gateway
//!
//! [`Gateway`] over the portal's serverless HTTP API.
//!
//! ## Wire Format
//! ```text
//! listActiveOffers   GET  {offers_url}?action=getActiveOffers&id_negocio=42
//!                    200  [{"id_oferta": 7, "titulo": "2x1 Coffee"}]
//!
//! redeemOffer        POST {redeem_url}?action=redeemOffer
//!                    {"id_oferta": 7, "id_negocio": 42, "cardNumber": "4111111111111111"}
//!                    2xx  {"message": "..."}        (body optional)
//!                    4xx  {"message": "..."}
//!
//! registerCard       POST {register_url}
//!                    {"cardNumber": "...", "method": "manual"|"qr", "at": "<ISO-8601>"}
//!                    2xx  {"ok": true|false, "message"?, "error"?}
//!                    4xx  {"error": "..."} or {"message": "..."}
//! ```
//!
//! Bodies are read leniently: an empty or non-JSON body never masks the
//! status code, which alone decides success.

use aliados_core::{
    BusinessId, CardRegistration, OfferSummary, RedemptionAttempt, RedemptionReceipt,
    RegistrationReceipt,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::Gateway;
use crate::config::GatewaySettings;
use crate::error::{GatewayError, GatewayResult};

/// Body fields read for an error message, in order of precedence.
const REDEEM_MESSAGE_FIELDS: &[&str] = &["message"];
const MESSAGE_FIELDS: &[&str] = &["error", "message"];

#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    offers_url: Url,
    redeem_url: Url,
    register_url: Url,
    timeout_secs: u64,
}

impl HttpGateway {
    pub fn new(settings: &GatewaySettings) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| GatewayError::ClientBuild(e.to_string()))?;

        Ok(HttpGateway {
            client,
            offers_url: Url::parse(&settings.offers_url)?,
            redeem_url: Url::parse(&settings.redeem_url)?,
            register_url: Url::parse(&settings.register_url)?,
            timeout_secs: settings.timeout_secs,
        })
    }

    /// `base` with `action=<action>` and `extra` appended to its query.
    fn action_url(base: &Url, action: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = base.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("action", action);
            for (key, value) in extra {
                query.append_pair(key, value);
            }
        }
        url
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
        message_fields: &[&str],
    ) -> GatewayResult<String> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout_secs))?;
        self.handle_response(response, message_fields).await
    }

    /// Returns the body of a 2xx response; anything else becomes
    /// [`GatewayError::Http`] carrying the first of `message_fields` found
    /// in the body.
    async fn handle_response(
        &self,
        response: reqwest::Response,
        message_fields: &[&str],
    ) -> GatewayResult<String> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout_secs))?;

        if !status.is_success() {
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message: body_message(&text, message_fields),
            });
        }

        Ok(text)
    }
}

/// First non-blank string among `fields` of a JSON body.
fn body_message(text: &str, fields: &[&str]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    fields.iter().find_map(|key| {
        value
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_active_offers(&self, business: BusinessId) -> GatewayResult<Vec<OfferSummary>> {
        let id = business.to_string();
        let url = Self::action_url(
            &self.offers_url,
            "getActiveOffers",
            &[("id_negocio", id.as_str())],
        );
        debug!(business = %business, "Listing active offers");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.timeout_secs))?;
        let text = self.handle_response(response, MESSAGE_FIELDS).await?;

        let offers: Vec<OfferSummary> = serde_json::from_str(&text)
            .map_err(|e| GatewayError::InvalidResponse(format!("offer list: {}", e)))?;
        debug!(business = %business, count = offers.len(), "Active offers loaded");
        Ok(offers)
    }

    async fn redeem_offer(&self, attempt: &RedemptionAttempt) -> GatewayResult<RedemptionReceipt> {
        let url = Self::action_url(&self.redeem_url, "redeemOffer", &[]);
        info!(
            attempt = %attempt.attempt_id,
            offer = %attempt.offer_id,
            business = %attempt.business_id,
            card = %attempt.card.masked(),
            "Submitting redemption"
        );

        let text = self.post_json(url, attempt, REDEEM_MESSAGE_FIELDS).await?;
        if text.trim().is_empty() {
            return Ok(RedemptionReceipt::default());
        }

        let receipt = serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(attempt = %attempt.attempt_id, error = %e, "Unparsable redemption receipt");
            RedemptionReceipt::default()
        });
        Ok(receipt)
    }

    async fn register_card(
        &self,
        registration: &CardRegistration,
    ) -> GatewayResult<RegistrationReceipt> {
        info!(
            card = %registration.card.masked(),
            method = %registration.method,
            "Registering card"
        );

        let text = self
            .post_json(self.register_url.clone(), registration, MESSAGE_FIELDS)
            .await?;
        if text.trim().is_empty() {
            return Ok(RegistrationReceipt::default());
        }

        let receipt: RegistrationReceipt = serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!(error = %e, "Unparsable registration receipt");
            RegistrationReceipt::default()
        });

        if !receipt.ok {
            return Err(GatewayError::Rejected(receipt.error.or(receipt.message)));
        }
        Ok(receipt)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
