use crate::domain::payment::{InvoiceId, PaymentId, PaymentRecord, PaymentStatus};
use crate::domain::ports::{InvoiceStore, PaymentStore, TransitionOutcome};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerInner {
    records: HashMap<PaymentId, PaymentRecord>,
    /// Correlation token -> record id. Exact-match lookups only; enforces the
    /// one-token-one-record invariant at insert time.
    token_index: HashMap<String, PaymentId>,
}

/// A thread-safe in-memory payment ledger.
///
/// All mutation happens under a single write lock, which makes the
/// find-and-transition in [`PaymentStore::transition`] atomic with respect to
/// status: concurrent duplicate callbacks serialize on the lock and the loser
/// observes a terminal record.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    inner: Arc<RwLock<LedgerInner>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, record: PaymentRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(token) = &record.correlation_token {
            if inner.token_index.contains_key(token) {
                return Err(PaymentError::DuplicateCorrelationToken(token.clone()));
            }
            inner.token_index.insert(token.clone(), record.id);
        }
        inner.records.insert(record.id, record);
        Ok(())
    }

    async fn get(&self, id: PaymentId) -> Result<Option<PaymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&id).cloned())
    }

    async fn all(&self) -> Result<Vec<PaymentRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<_> = inner.records.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }

    async fn transition(
        &self,
        token: &str,
        to: PaymentStatus,
        note_line: &str,
    ) -> Result<TransitionOutcome> {
        let mut inner = self.inner.write().await;
        let id = match inner.token_index.get(token) {
            Some(id) => *id,
            None => return Ok(TransitionOutcome::NotApplied),
        };
        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| PaymentError::Store(format!("token index points at missing record {id}")))?;

        if !record.status.can_transition_to(to) {
            return Ok(TransitionOutcome::NotApplied);
        }
        record.status = to;
        record.append_note(note_line);
        record.updated_at = Utc::now();
        Ok(TransitionOutcome::Applied(record.clone()))
    }

    async fn stale_processing(&self, cutoff: DateTime<Utc>) -> Result<Vec<PaymentRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .values()
            .filter(|r| r.status == PaymentStatus::Processing && r.created_at < cutoff)
            .cloned()
            .collect())
    }
}

/// In-memory stand-in for the invoice collaborator: tracks only the paid
/// flag, the single field this flow touches.
#[derive(Default, Clone)]
pub struct InMemoryInvoiceStore {
    paid: Arc<RwLock<HashSet<InvoiceId>>>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn mark_paid(&self, invoice: InvoiceId) -> Result<bool> {
        let mut paid = self.paid.write().await;
        Ok(paid.insert(invoice))
    }

    async fn is_paid(&self, invoice: InvoiceId) -> Result<bool> {
        let paid = self.paid.read().await;
        Ok(paid.contains(&invoice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{Amount, TenantId};
    use crate::domain::phone::PhoneNumber;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn pending(token: &str) -> PaymentRecord {
        PaymentRecord::pending_push(
            TenantId(Uuid::new_v4()),
            None,
            Amount::new(dec!(100)).unwrap(),
            &PhoneNumber::normalize("0712345678").unwrap(),
            token.to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryPaymentStore::new();
        let record = pending("ws_1");
        store.insert(record.clone()).await.unwrap();

        let retrieved = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(retrieved, record);
    }

    #[tokio::test]
    async fn test_duplicate_token_rejected() {
        let store = InMemoryPaymentStore::new();
        store.insert(pending("ws_1")).await.unwrap();

        let result = store.insert(pending("ws_1")).await;
        assert!(matches!(
            result,
            Err(PaymentError::DuplicateCorrelationToken(_))
        ));
    }

    #[tokio::test]
    async fn test_transition_applies_once() {
        let store = InMemoryPaymentStore::new();
        let record = pending("ws_1");
        store.insert(record.clone()).await.unwrap();

        let first = store
            .transition("ws_1", PaymentStatus::Completed, "receipt QGR7XXXX")
            .await
            .unwrap();
        match first {
            TransitionOutcome::Applied(updated) => {
                assert_eq!(updated.status, PaymentStatus::Completed);
                assert!(updated.note.contains("receipt QGR7XXXX"));
            }
            TransitionOutcome::NotApplied => panic!("first transition should apply"),
        }

        // Second delivery finds a terminal record and does nothing.
        let second = store
            .transition("ws_1", PaymentStatus::Completed, "receipt QGR7XXXX")
            .await
            .unwrap();
        assert_eq!(second, TransitionOutcome::NotApplied);
    }

    #[tokio::test]
    async fn test_transition_unknown_token_not_applied() {
        let store = InMemoryPaymentStore::new();
        let outcome = store
            .transition("missing", PaymentStatus::Failed, "")
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::NotApplied);
    }

    #[tokio::test]
    async fn test_terminal_never_downgraded() {
        let store = InMemoryPaymentStore::new();
        let record = pending("ws_1");
        store.insert(record.clone()).await.unwrap();
        store
            .transition("ws_1", PaymentStatus::Completed, "ok")
            .await
            .unwrap();

        let outcome = store
            .transition("ws_1", PaymentStatus::Failed, "late failure")
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::NotApplied);

        let current = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(current.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_stale_processing_filters_by_cutoff() {
        let store = InMemoryPaymentStore::new();
        let record = pending("ws_1");
        store.insert(record.clone()).await.unwrap();

        let future_cutoff = Utc::now() + chrono::Duration::hours(1);
        let stale = store.stale_processing(future_cutoff).await.unwrap();
        assert_eq!(stale.len(), 1);

        let past_cutoff = Utc::now() - chrono::Duration::hours(1);
        let fresh = store.stale_processing(past_cutoff).await.unwrap();
        assert!(fresh.is_empty());
    }

    #[tokio::test]
    async fn test_invoice_mark_paid_idempotent() {
        let store = InMemoryInvoiceStore::new();
        let invoice = InvoiceId(Uuid::new_v4());

        assert!(store.mark_paid(invoice).await.unwrap());
        assert!(!store.mark_paid(invoice).await.unwrap());
        assert!(store.is_paid(invoice).await.unwrap());
    }
}
