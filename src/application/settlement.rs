use crate::domain::payment::PaymentRecord;
use crate::domain::ports::{InvoiceStore, InvoiceStoreRef};
use tracing::{info, warn};

/// Marks the invoice linked to a completed payment as paid.
///
/// Best-effort by design: the payment is the authoritative record of money
/// movement, so a failed invoice update is logged and left for manual
/// reconciliation rather than rolled back. Repeated invocation is a no-op.
#[derive(Clone)]
pub struct SettlementPropagator {
    invoices: InvoiceStoreRef,
}

impl SettlementPropagator {
    pub fn new(invoices: InvoiceStoreRef) -> Self {
        Self { invoices }
    }

    pub async fn settle(&self, payment: &PaymentRecord) {
        let Some(invoice) = payment.invoice_id else {
            return;
        };
        match self.invoices.mark_paid(invoice).await {
            Ok(true) => {
                info!(payment = %payment.id, invoice = ?invoice, "invoice marked paid");
            }
            Ok(false) => {
                // Already paid; nothing to do.
            }
            Err(e) => {
                warn!(
                    payment = %payment.id,
                    invoice = ?invoice,
                    error = %e,
                    "failed to mark invoice paid; payment remains completed"
                );
            }
        }
    }
}
