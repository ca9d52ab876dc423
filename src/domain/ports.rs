use crate::domain::payment::{InvoiceId, PaymentId, PaymentRecord, PaymentStatus};
use crate::domain::phone::PhoneNumber;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Outcome of a conditional status transition.
///
/// `NotApplied` is not an error: it is how duplicate or late callbacks are
/// detected and ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(PaymentRecord),
    NotApplied,
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a new record. Fails if the record carries a correlation token
    /// another record already holds.
    async fn insert(&self, record: PaymentRecord) -> Result<()>;
    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>>;
    async fn all(&self) -> Result<Vec<PaymentRecord>>;

    /// Atomically moves the record holding `token` from `Processing` to the
    /// given terminal status, appending `note_line` to its annotation. The
    /// match-and-transition is a single compare-and-swap on status: a token
    /// that is unknown, or whose record is already terminal, yields
    /// `NotApplied` and changes nothing.
    async fn transition(
        &self,
        token: &str,
        to: PaymentStatus,
        note_line: &str,
    ) -> Result<TransitionOutcome>;

    /// Records still `Processing` that were created before `cutoff`.
    async fn stale_processing(&self, cutoff: DateTime<Utc>) -> Result<Vec<PaymentRecord>>;
}

/// The invoice collaborator, reduced to the one mutation this flow performs.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Marks the invoice paid. Returns `false` when it was already paid, so
    /// repeated settlement is a no-op in effect.
    async fn mark_paid(&self, invoice: InvoiceId) -> Result<bool>;
    async fn is_paid(&self, invoice: InvoiceId) -> Result<bool>;
}

/// Produces a valid bearer credential for calling the rail.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Parameters of one push request, assembled by the initiator.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub amount: Decimal,
    pub payer: PhoneNumber,
    pub account_reference: String,
    pub description: String,
}

/// The rail's synchronous acceptance of a push request.
#[derive(Debug, Clone, PartialEq)]
pub struct PushAcceptance {
    pub correlation_token: String,
    pub customer_message: String,
}

/// Submits push requests to the rail. Rejection surfaces as
/// `PaymentError::GatewayRejected` carrying the rail's message.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn submit(&self, request: &PushRequest) -> Result<PushAcceptance>;
}

pub type PaymentStoreRef = std::sync::Arc<dyn PaymentStore>;
pub type InvoiceStoreRef = std::sync::Arc<dyn InvoiceStore>;
pub type PushGatewayRef = std::sync::Arc<dyn PushGateway>;
