use crate::application::settlement::SettlementPropagator;
use crate::domain::payment::{
    Amount, InvoiceId, PaymentId, PaymentMethod, PaymentRecord, PaymentStatus, TenantId,
};
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{PaymentStore, PaymentStoreRef, PushGateway, PushGatewayRef, PushRequest};
use crate::error::Result;
use serde::Serialize;
use tracing::info;

const DEFAULT_ACCOUNT_REFERENCE: &str = "RENT";
const CUSTOMER_MESSAGE: &str =
    "Payment request sent. Check your phone and enter your PIN to authorize.";

/// What the caller gets back from a successful initiation. Settlement is not
/// part of this: it arrives later through the callback path.
#[derive(Debug, Clone, Serialize)]
pub struct InitiationReceipt {
    pub payment_id: PaymentId,
    pub correlation_token: String,
    pub message: String,
}

/// Entry point of the push-payment flow.
///
/// Owns the ledger store and the gateway port; validation happens before any
/// network call, and a ledger record exists only once the rail has accepted
/// the request.
pub struct PushPaymentInitiator {
    store: PaymentStoreRef,
    gateway: PushGatewayRef,
    settlement: SettlementPropagator,
}

impl PushPaymentInitiator {
    pub fn new(
        store: PaymentStoreRef,
        gateway: PushGatewayRef,
        settlement: SettlementPropagator,
    ) -> Self {
        Self {
            store,
            gateway,
            settlement,
        }
    }

    /// Asks the rail to prompt the payer's phone for `amount`.
    ///
    /// Fire-and-forget: on acceptance a `Processing` record is created under
    /// the rail's correlation token and the caller is told to check the
    /// phone. Rejection and authentication failures surface as errors and
    /// leave no record behind.
    pub async fn initiate(
        &self,
        tenant: TenantId,
        amount: Amount,
        phone: &str,
        invoice: Option<InvoiceId>,
        account_reference: Option<String>,
    ) -> Result<InitiationReceipt> {
        let payer = PhoneNumber::normalize(phone)?;

        let request = PushRequest {
            amount: amount.value(),
            payer: payer.clone(),
            account_reference: account_reference
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ACCOUNT_REFERENCE.to_string()),
            description: "Rent payment".to_string(),
        };
        let acceptance = self.gateway.submit(&request).await?;

        let record = PaymentRecord::pending_push(
            tenant,
            invoice,
            amount,
            &payer,
            acceptance.correlation_token.clone(),
        )?;
        let payment_id = record.id;
        self.store.insert(record).await?;

        info!(
            payment = %payment_id,
            token = %acceptance.correlation_token,
            "push accepted, awaiting rail callback"
        );
        Ok(InitiationReceipt {
            payment_id,
            correlation_token: acceptance.correlation_token,
            message: CUSTOMER_MESSAGE.to_string(),
        })
    }

    /// Records a payment that happened outside the gateway (cash, bank
    /// transfer, card, check) in the status the operator chose. A completed
    /// manual payment settles its linked invoice immediately.
    pub async fn record_manual(
        &self,
        tenant: TenantId,
        amount: Amount,
        method: PaymentMethod,
        status: PaymentStatus,
        note: String,
        invoice: Option<InvoiceId>,
    ) -> Result<PaymentRecord> {
        let record = PaymentRecord::manual(tenant, invoice, amount, method, status, note)?;
        self.store.insert(record.clone()).await?;

        if record.status == PaymentStatus::Completed {
            self.settlement.settle(&record).await;
        }
        Ok(record)
    }
}
