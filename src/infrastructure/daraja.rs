//! HTTP client for the mobile-money rail: OAuth client-credential exchange
//! and STK push submission.

use crate::config::GatewayConfig;
use crate::domain::ports::{CredentialProvider, PushAcceptance, PushGateway, PushRequest};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use base64::prelude::*;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);
/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn build_http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(HTTP_TIMEOUT)
        .build()?)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// The rail reports this as a string of seconds.
    expires_in: String,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Fetches short-lived bearer tokens from the rail's token endpoint and
/// caches them in-process until shortly before expiry. Nothing persists
/// across restarts; a fetch failure is fatal for the current attempt.
pub struct DarajaCredentialProvider {
    http: reqwest::Client,
    config: GatewayConfig,
    cached: Mutex<Option<CachedToken>>,
}

impl DarajaCredentialProvider {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            config,
            cached: Mutex::new(None),
        })
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        let response = self
            .http
            .get(&self.config.token_url)
            .basic_auth(&self.config.consumer_key, Some(&self.config.consumer_secret))
            .send()
            .await
            .map_err(|e| PaymentError::GatewayAuth(format!("token endpoint unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(PaymentError::GatewayAuth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::GatewayAuth(format!("malformed token response: {e}")))?;
        let ttl = body
            .expires_in
            .parse::<i64>()
            .unwrap_or(EXPIRY_MARGIN_SECS);
        Ok(CachedToken {
            token: body.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(ttl - EXPIRY_MARGIN_SECS),
        })
    }
}

#[async_trait]
impl CredentialProvider for DarajaCredentialProvider {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(existing) = cached.as_ref() {
            if existing.expires_at > Utc::now() {
                return Ok(existing.token.clone());
            }
        }
        let fresh = self.fetch_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

/// Derives the rail's request password: base64 over shortcode, passkey and
/// the request timestamp concatenated.
fn derive_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    BASE64_STANDARD.encode(format!("{shortcode}{passkey}{timestamp}"))
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    #[serde(rename = "CheckoutRequestID", default)]
    checkout_request_id: String,
    #[serde(rename = "ResponseCode", default)]
    response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    response_description: String,
    #[serde(rename = "CustomerMessage", default)]
    customer_message: String,
}

#[derive(Debug, Deserialize)]
struct PushErrorResponse {
    #[serde(rename = "errorMessage", default)]
    error_message: String,
}

/// Submits push requests to the rail over HTTPS. The credential provider is
/// injected so tests can substitute a double and callers can share one cache.
pub struct DarajaGateway {
    http: reqwest::Client,
    config: GatewayConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl DarajaGateway {
    pub fn new(config: GatewayConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            config,
            credentials,
        })
    }
}

#[async_trait]
impl PushGateway for DarajaGateway {
    async fn submit(&self, request: &PushRequest) -> Result<PushAcceptance> {
        let token = self.credentials.access_token().await?;
        let timestamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        let password = derive_password(&self.config.shortcode, &self.config.passkey, &timestamp);

        let body = serde_json::json!({
            "BusinessShortCode": self.config.shortcode,
            "Password": password,
            "Timestamp": timestamp,
            "TransactionType": "CustomerPayBillOnline",
            "Amount": request.amount,
            "PartyA": request.payer.as_str(),
            "PartyB": self.config.shortcode,
            "PhoneNumber": request.payer.as_str(),
            "CallBackURL": self.config.callback_url,
            "AccountReference": request.account_reference,
            "TransactionDesc": request.description,
        });

        let response = self
            .http
            .post(&self.config.push_url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PaymentError::GatewayAuth(
                "push request rejected the bearer token".to_string(),
            ));
        }
        if !status.is_success() {
            let error: PushErrorResponse = response.json().await.unwrap_or(PushErrorResponse {
                error_message: format!("rail returned {status}"),
            });
            return Err(PaymentError::GatewayRejected(error.error_message));
        }

        let accepted: PushResponse = response.json().await?;
        if accepted.response_code != "0" {
            return Err(PaymentError::GatewayRejected(accepted.response_description));
        }
        if accepted.checkout_request_id.is_empty() {
            return Err(PaymentError::GatewayRejected(
                "rail accepted without a correlation token".to_string(),
            ));
        }
        Ok(PushAcceptance {
            correlation_token: accepted.checkout_request_id,
            customer_message: accepted.customer_message,
        })
    }
}
