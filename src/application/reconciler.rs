use crate::domain::payment::PaymentStatus;
use crate::domain::ports::{PaymentStore, PaymentStoreRef, TransitionOutcome};
use crate::error::Result;
use chrono::Utc;
use tracing::{info, warn};

const TIMEOUT_NOTE: &str = "Payment failed: timed out awaiting confirmation from the rail";

/// Expires `Processing` records the rail never called back about.
///
/// A record older than `max_age` is moved to `Failed` through the same
/// compare-and-swap the callback path uses, so a callback racing the sweep
/// can never produce a second terminal write.
pub struct StaleRecordReconciler {
    store: PaymentStoreRef,
    max_age: chrono::Duration,
}

impl StaleRecordReconciler {
    pub fn new(store: PaymentStoreRef, max_age: chrono::Duration) -> Self {
        Self { store, max_age }
    }

    /// Runs one sweep, returning how many records were expired.
    pub async fn sweep(&self) -> Result<usize> {
        let cutoff = Utc::now() - self.max_age;
        let stale = self.store.stale_processing(cutoff).await?;
        let mut expired = 0;

        for record in stale {
            let Some(token) = record.correlation_token.as_deref() else {
                // Manual records never sit in Processing awaiting a callback.
                continue;
            };
            match self
                .store
                .transition(token, PaymentStatus::Failed, TIMEOUT_NOTE)
                .await
            {
                Ok(TransitionOutcome::Applied(updated)) => {
                    warn!(payment = %updated.id, token = %token, "expired stale processing record");
                    expired += 1;
                }
                Ok(TransitionOutcome::NotApplied) => {
                    // A callback won the race; nothing to expire.
                }
                Err(e) => {
                    warn!(payment = %record.id, error = %e, "failed to expire stale record");
                }
            }
        }

        if expired > 0 {
            info!(expired, "reconciliation sweep finished");
        }
        Ok(expired)
    }

    /// Loops forever, sweeping on the given interval. Spawned as a background
    /// task at startup.
    pub async fn run(&self, every: std::time::Duration) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep().await {
                warn!(error = %e, "reconciliation sweep failed");
            }
        }
    }
}
