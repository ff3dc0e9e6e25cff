//! Client-side reconciliation: re-read, compute delta, dispatch, refresh.
//!
//! Every mutating view funnels through [`Reconciler`]. Per item, the steps
//! run strictly in order:
//!
//! 1. Validate locally (a reason is mandatory). Failures never reach the
//!    backend.
//! 2. Re-read the baseline `qty_on_hand` from the gateway. The rendered
//!    snapshot is never trusted for delta computation.
//! 3. `delta = desired - baseline`; zero is a no-op with no remote call.
//! 4. Dispatch exactly one procedure: add for a positive delta, deduct with
//!    `|delta|` for a negative one.
//! 5. Re-read the quantity for display.
//!
//! Steps 2-4 for one item hold that item's lock, so a baseline read and its
//! write can't interleave with another pending write to the same item from
//! this client. Other clients can still race us between the re-read and the
//! write; the backend's non-negative check is the only guard there.
//!
//! Nothing is dispatched until a future is polled, so dropping an in-flight
//! reconciliation before its write leaves no remote trace.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Deserialize;
use tokio::sync::OwnedMutexGuard;

use clinicstock_core::{DomainError, ItemId};
use clinicstock_gateway::{Gateway, ProcedureCall, fetch_one};
use clinicstock_inventory::{Adjustment, AdjustmentIntent, Quantity, ReasonCode};

use crate::error::ClientError;
use crate::filters::quantity_query;

#[derive(Debug, Deserialize)]
struct QuantityRow {
    qty_on_hand: i64,
}

/// Outcome of one successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub item_id: ItemId,
    /// Quantity re-read immediately before computing the delta.
    pub baseline: Quantity,
    pub adjustment: Adjustment,
    /// Fresh post-write quantity; `None` if that read failed.
    pub refreshed: Option<Quantity>,
}

impl Reconciled {
    /// True when a procedure was actually called.
    pub fn dispatched(&self) -> bool {
        !self.adjustment.is_no_change()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub item_id: ItemId,
    pub error: ClientError,
}

/// Per-item results of a batch reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub completed: Vec<Reconciled>,
    pub failed: Vec<FailedItem>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.failed.is_empty()
    }

    /// Number of procedures dispatched successfully.
    pub fn dispatched(&self) -> usize {
        self.completed.iter().filter(|r| r.dispatched()).count()
    }
}

type ItemLocks = Mutex<HashMap<ItemId, Arc<tokio::sync::Mutex<()>>>>;

/// Holds one item's lock; forgets the lock once nobody else wants it.
struct ItemGuard<'a> {
    locks: &'a ItemLocks,
    item_id: ItemId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ItemGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.item_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.item_id);
        }
    }
}

/// Shared reconciliation handle.
///
/// Construct one per gateway and share it between views; the per-item locks
/// only serialize writes that go through the same `Reconciler`.
pub struct Reconciler<G> {
    gateway: Arc<G>,
    locks: ItemLocks,
}

impl<G> Reconciler<G>
where
    G: Gateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    async fn lock_item(&self, item_id: ItemId) -> ItemGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(item_id).or_default().clone()
        };
        ItemGuard {
            locks: &self.locks,
            item_id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Authoritative quantity of an item.
    pub async fn read_quantity(&self, item_id: ItemId) -> Result<Quantity, ClientError> {
        tracing::debug!(%item_id, "reading quantity");
        let row: Option<QuantityRow> =
            fetch_one(self.gateway.as_ref(), &quantity_query(item_id)).await?;
        row.map(|r| Quantity::clamped(r.qty_on_hand))
            .ok_or(ClientError::NotFound(item_id))
    }

    async fn refresh(&self, item_id: ItemId) -> Option<Quantity> {
        match self.read_quantity(item_id).await {
            Ok(q) => Some(q),
            Err(e) => {
                tracing::warn!(%item_id, error = %e, "refresh after adjustment failed");
                None
            }
        }
    }

    async fn dispatch(&self, call: &ProcedureCall) -> Result<(), ClientError> {
        tracing::info!(
            item_id = %call.item_id(),
            procedure = call.procedure().name(),
            magnitude = call.magnitude().get(),
            reason = call.reason().code(),
            "dispatching adjustment"
        );
        self.gateway.call(call).await?;
        Ok(())
    }

    /// Bring an item to `desired`, relative to a fresh baseline.
    pub async fn reconcile(
        &self,
        item_id: ItemId,
        desired: Quantity,
        reason: Option<ReasonCode>,
    ) -> Result<Reconciled, ClientError> {
        self.reconcile_intent(item_id, AdjustmentIntent::SetTo(desired), reason)
            .await
    }

    /// Resolve `intent` against a fresh baseline and dispatch the result.
    pub async fn reconcile_intent(
        &self,
        item_id: ItemId,
        intent: AdjustmentIntent,
        reason: Option<ReasonCode>,
    ) -> Result<Reconciled, ClientError> {
        let reason = ReasonCode::require(reason)?;

        let _guard = self.lock_item(item_id).await;

        let baseline = self.read_quantity(item_id).await?;
        let adjustment = intent.resolve(baseline);

        let refreshed = match ProcedureCall::for_adjustment(item_id, adjustment, reason) {
            None => {
                tracing::debug!(%item_id, %baseline, "count matches system quantity");
                Some(baseline)
            }
            Some(call) => {
                self.dispatch(&call).await?;
                self.refresh(item_id).await
            }
        };

        Ok(Reconciled {
            item_id,
            baseline,
            adjustment,
            refreshed,
        })
    }

    /// Quick adjust: apply a signed change without a target quantity.
    ///
    /// Returns the re-read quantity, or `None` when the post-write read failed
    /// (callers may then show an optimistic value for display only).
    pub async fn adjust(
        &self,
        item_id: ItemId,
        adjustment: Adjustment,
        reason: Option<ReasonCode>,
    ) -> Result<Option<Quantity>, ClientError> {
        let reason = ReasonCode::require(reason)?;
        let call = match ProcedureCall::for_adjustment(item_id, adjustment, reason) {
            Some(call) => call,
            None => {
                return Err(DomainError::validation("enter a quantity greater than zero").into());
            }
        };

        let _guard = self.lock_item(item_id).await;
        self.dispatch(&call).await?;
        Ok(self.refresh(item_id).await)
    }

    /// Reconcile each entry independently.
    ///
    /// One item's failure never stops or rolls back the others; the caller
    /// gets both lists and keeps the failed intents for a retry.
    pub async fn reconcile_batch<I>(
        &self,
        entries: Vec<(ItemId, I)>,
        reason: Option<ReasonCode>,
    ) -> BatchReport
    where
        I: Into<AdjustmentIntent>,
    {
        let mut report = BatchReport::default();

        for (item_id, intent) in entries {
            match self.reconcile_intent(item_id, intent.into(), reason).await {
                Ok(done) => report.completed.push(done),
                Err(error) => {
                    tracing::warn!(%item_id, error = %error, "reconciliation failed");
                    report.failed.push(FailedItem { item_id, error });
                }
            }
        }

        tracing::info!(
            completed = report.completed.len(),
            dispatched = report.dispatched(),
            failed = report.failed.len(),
            "batch reconciliation finished"
        );
        report
    }
}
