use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaymentError>;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("gateway authentication failed: {0}")]
    GatewayAuth(String),
    #[error("gateway rejected the request: {0}")]
    GatewayRejected(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store error: {0}")]
    Store(String),
    #[error("correlation token already registered: {0}")]
    DuplicateCorrelationToken(String),
    #[error("configuration error: {0}")]
    Config(String),
}
