use crate::application::settlement::SettlementPropagator;
use crate::domain::payment::PaymentStatus;
use crate::domain::ports::{PaymentStore, PaymentStoreRef, TransitionOutcome};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// The rail's asynchronous result notification, as delivered to the callback
/// endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: CallbackBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    /// 0 means the payer authorized; anything else is a failure.
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    /// Present only on success.
    #[serde(rename = "CallbackMetadata", default)]
    pub metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<MetadataItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

impl CallbackMetadata {
    /// Looks up an item by name, rendering numbers and strings alike.
    /// Missing keys are tolerated; the rail does not guarantee every field.
    fn lookup(&self, name: &str) -> Option<String> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .and_then(|item| item.value.as_ref())
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}

/// Fixed acknowledgment shape returned to the rail for every delivery.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: &'static str,
}

impl CallbackAck {
    pub fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted",
        }
    }
}

/// Applies the rail's result to the matching ledger record.
///
/// The rail retries any delivery it does not see acknowledged, so this
/// processor never fails outward: internal errors are logged and swallowed,
/// and unknown or already-terminal correlation tokens are acknowledged
/// without action.
pub struct CallbackProcessor {
    store: PaymentStoreRef,
    settlement: SettlementPropagator,
}

impl CallbackProcessor {
    pub fn new(store: PaymentStoreRef, settlement: SettlementPropagator) -> Self {
        Self { store, settlement }
    }

    pub async fn process(&self, envelope: CallbackEnvelope) -> CallbackAck {
        if let Err(e) = self.apply(envelope.body.stk_callback).await {
            warn!(error = %e, "callback processing failed; acknowledging anyway");
        }
        CallbackAck::accepted()
    }

    async fn apply(&self, callback: StkCallback) -> Result<()> {
        let token = callback.checkout_request_id;

        if callback.result_code == 0 {
            let note = success_note(callback.metadata.as_ref());
            match self
                .store
                .transition(&token, PaymentStatus::Completed, &note)
                .await?
            {
                TransitionOutcome::Applied(record) => {
                    info!(payment = %record.id, token = %token, "payment completed");
                    self.settlement.settle(&record).await;
                }
                TransitionOutcome::NotApplied => {
                    debug!(token = %token, "unmatched or duplicate success callback dropped");
                }
            }
        } else {
            let note = format!(
                "Payment failed ({}): {}",
                callback.result_code, callback.result_desc
            );
            match self
                .store
                .transition(&token, PaymentStatus::Failed, &note)
                .await?
            {
                TransitionOutcome::Applied(record) => {
                    info!(payment = %record.id, token = %token, "payment failed");
                }
                TransitionOutcome::NotApplied => {
                    debug!(token = %token, "unmatched or duplicate failure callback dropped");
                }
            }
        }
        Ok(())
    }
}

fn success_note(metadata: Option<&CallbackMetadata>) -> String {
    let lookup = |name: &str| {
        metadata
            .and_then(|m| m.lookup(name))
            .unwrap_or_else(|| "unknown".to_string())
    };
    format!(
        "Confirmed: receipt {}, phone {}, at {}",
        lookup("MpesaReceiptNumber"),
        lookup("PhoneNumber"),
        lookup("TransactionDate"),
    )
}
