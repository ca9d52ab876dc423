use crate::error::{PaymentError, Result};

/// Connection settings for the mobile-money rail.
///
/// Loaded from the environment so that credentials never live in code or
/// command lines. `token_url` and `push_url` default to the rail's sandbox
/// endpoints when unset.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// OAuth client-credential pair for the token endpoint.
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Business shortcode receiving the funds.
    pub shortcode: String,
    /// Passkey used to derive the push-request password.
    pub passkey: String,
    /// Public URL the rail delivers its result callback to.
    pub callback_url: String,
    pub token_url: String,
    pub push_url: String,
}

const DEFAULT_TOKEN_URL: &str =
    "https://sandbox.safaricom.co.ke/oauth/v1/generate?grant_type=client_credentials";
const DEFAULT_PUSH_URL: &str =
    "https://sandbox.safaricom.co.ke/mpesa/stkpush/v1/processrequest";

fn required(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PaymentError::Config(format!("missing environment variable {name}")))
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            consumer_key: required("PESARAIL_CONSUMER_KEY")?,
            consumer_secret: required("PESARAIL_CONSUMER_SECRET")?,
            shortcode: required("PESARAIL_SHORTCODE")?,
            passkey: required("PESARAIL_PASSKEY")?,
            callback_url: required("PESARAIL_CALLBACK_URL")?,
            token_url: std::env::var("PESARAIL_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string()),
            push_url: std::env::var("PESARAIL_PUSH_URL")
                .unwrap_or_else(|_| DEFAULT_PUSH_URL.to_string()),
        })
    }
}
