use arena_core::payment::{CheckoutSession, CheckoutSessionRequest, PaymentProvider};
use arena_core::{CoreError, CoreResult};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

/// Hosted checkout sessions through the Stripe REST API.
pub struct StripeCheckoutClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
    success_url: String,
    cancel_url: String,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeCheckoutClient {
    pub fn new(secret_key: &str, api_base: &str, success_url: &str, cancel_url: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            secret_key: secret_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            success_url: success_url.to_string(),
            cancel_url: cancel_url.to_string(),
        })
    }

    fn form_params(&self, request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("line_items[0][price]".to_string(), request.price_reference.trim().to_string()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("allow_promotion_codes".to_string(), "true".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        for (key, value) in request.metadata.to_pairs() {
            params.push((format!("metadata[{}]", key), value));
        }
        params
    }
}

#[async_trait]
impl PaymentProvider for StripeCheckoutClient {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> CoreResult<CheckoutSession> {
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&self.form_params(request))
            .send()
            .await
            .map_err(|e| CoreError::PaymentError(format!("Stripe unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| "no error message".to_string());
            error!("Stripe rejected checkout session ({}): {}", status, message);
            return Err(CoreError::PaymentError(format!("Stripe returned {}: {}", status, message)));
        }

        let session: StripeSession = response
            .json()
            .await
            .map_err(|e| CoreError::PaymentError(format!("Unreadable Stripe response: {}", e)))?;
        debug!("Created checkout session {}", session.id);

        let url = session
            .url
            .ok_or_else(|| CoreError::PaymentError(format!("Session {} has no redirect url", session.id)))?;

        Ok(CheckoutSession { id: session.id, url })
    }
}
