#![allow(dead_code)]

use async_trait::async_trait;
use pesarail::application::callback::CallbackProcessor;
use pesarail::application::initiator::PushPaymentInitiator;
use pesarail::application::settlement::SettlementPropagator;
use pesarail::domain::ports::{PushAcceptance, PushGateway, PushRequest};
use pesarail::error::{PaymentError, Result};
use pesarail::infrastructure::in_memory::{InMemoryInvoiceStore, InMemoryPaymentStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Programmable stand-in for the rail: either accepts every push with a fixed
/// correlation token or rejects with a fixed message, counting submissions
/// either way.
pub struct StubGateway {
    outcome: StubOutcome,
    calls: AtomicUsize,
}

pub enum StubOutcome {
    Accept { token: String },
    Reject { message: String },
}

impl StubGateway {
    pub fn accepting(token: &str) -> Self {
        Self {
            outcome: StubOutcome::Accept {
                token: token.to_string(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            outcome: StubOutcome::Reject {
                message: message.to_string(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushGateway for StubGateway {
    async fn submit(&self, _request: &PushRequest) -> Result<PushAcceptance> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            StubOutcome::Accept { token } => Ok(PushAcceptance {
                correlation_token: token.clone(),
                customer_message: "Success. Request accepted for processing".to_string(),
            }),
            StubOutcome::Reject { message } => Err(PaymentError::GatewayRejected(message.clone())),
        }
    }
}

/// A fully wired flow over in-memory stores and a stub gateway.
pub struct TestFlow {
    pub store: Arc<InMemoryPaymentStore>,
    pub invoices: Arc<InMemoryInvoiceStore>,
    pub gateway: Arc<StubGateway>,
    pub initiator: PushPaymentInitiator,
    pub callbacks: CallbackProcessor,
}

pub fn flow(gateway: StubGateway) -> TestFlow {
    let store = Arc::new(InMemoryPaymentStore::new());
    let invoices = Arc::new(InMemoryInvoiceStore::new());
    let gateway = Arc::new(gateway);
    let settlement = SettlementPropagator::new(invoices.clone());
    let initiator =
        PushPaymentInitiator::new(store.clone(), gateway.clone(), settlement.clone());
    let callbacks = CallbackProcessor::new(store.clone(), settlement);
    TestFlow {
        store,
        invoices,
        gateway,
        initiator,
        callbacks,
    }
}

/// A success callback body in the rail's wire shape.
pub fn success_callback(token: &str, receipt: &str) -> String {
    format!(
        r#"{{
            "Body": {{
                "stkCallback": {{
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "{token}",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {{
                        "Item": [
                            {{"Name": "Amount", "Value": 1500.00}},
                            {{"Name": "MpesaReceiptNumber", "Value": "{receipt}"}},
                            {{"Name": "TransactionDate", "Value": 20240115103045}},
                            {{"Name": "PhoneNumber", "Value": 254712345678}}
                        ]
                    }}
                }}
            }}
        }}"#
    )
}

/// A failure callback body (payer cancelled).
pub fn failure_callback(token: &str) -> String {
    format!(
        r#"{{
            "Body": {{
                "stkCallback": {{
                    "MerchantRequestID": "29115-34620561-2",
                    "CheckoutRequestID": "{token}",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }}
            }}
        }}"#
    )
}
