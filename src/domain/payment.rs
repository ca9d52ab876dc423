use crate::domain::phone::PhoneNumber;
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A strictly positive monetary amount in the ledger's single currency.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::Validation(
                "amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    MobileMoney,
    BankTransfer,
    Card,
    Cash,
    Check,
}

/// Lifecycle state of a ledger record. Transitions only move forward:
/// `Processing` may become `Completed` or `Failed`; terminal states never
/// change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Processing,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(self, Self::Processing) && next.is_terminal()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PaymentId(pub Uuid);

impl PaymentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub Uuid);

/// The local source of truth for one payment's lifecycle.
///
/// Gateway-path records are created in `Processing` with the rail's
/// correlation token and only the callback path moves them to a terminal
/// state. Manually recorded payments carry no token and are finalized at
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub invoice_id: Option<InvoiceId>,
    pub amount: Amount,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// Opaque identifier assigned by the rail at push time; exactly one
    /// record may hold a given token.
    pub correlation_token: Option<String>,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    /// Creates a provisional record for an accepted push request.
    pub fn pending_push(
        tenant_id: TenantId,
        invoice_id: Option<InvoiceId>,
        amount: Amount,
        phone: &PhoneNumber,
        correlation_token: String,
    ) -> Result<Self> {
        if correlation_token.trim().is_empty() {
            return Err(PaymentError::Validation(
                "gateway payment requires a correlation token".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: PaymentId::generate(),
            tenant_id,
            invoice_id,
            amount,
            method: PaymentMethod::MobileMoney,
            status: PaymentStatus::Processing,
            correlation_token: Some(correlation_token),
            note: format!("Push payment requested from {phone}"),
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates a record for a payment observed outside the gateway, in the
    /// status the operator chose. No asynchronous phase follows.
    pub fn manual(
        tenant_id: TenantId,
        invoice_id: Option<InvoiceId>,
        amount: Amount,
        method: PaymentMethod,
        status: PaymentStatus,
        note: String,
    ) -> Result<Self> {
        if method == PaymentMethod::MobileMoney {
            return Err(PaymentError::Validation(
                "mobile-money payments must go through the gateway".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: PaymentId::generate(),
            tenant_id,
            invoice_id,
            amount,
            method,
            status,
            correlation_token: None,
            note,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn append_note(&mut self, line: &str) {
        if !self.note.is_empty() {
            self.note.push('\n');
        }
        self.note.push_str(line);
    }
}
