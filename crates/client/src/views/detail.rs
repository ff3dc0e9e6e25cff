use std::sync::Arc;

use clinicstock_core::{DomainError, ItemId};
use clinicstock_gateway::{Gateway, fetch_one, fetch_rows};
use clinicstock_inventory::{Adjustment, InventoryItem, Magnitude, ReasonCode, TransactionRecord};

use crate::error::ClientError;
use crate::filters::{detail_query, history_query};
use crate::reconcile::Reconciler;

/// Transactions shown under an item.
pub const HISTORY_LIMIT: u64 = 50;

/// One item with its recent history and an add/deduct form.
pub struct ItemDetail<G> {
    reconciler: Arc<Reconciler<G>>,
    item: Option<InventoryItem>,
    history: Vec<TransactionRecord>,
    amount: i64,
    reason: Option<ReasonCode>,
}

impl<G> ItemDetail<G>
where
    G: Gateway,
{
    pub fn new(reconciler: Arc<Reconciler<G>>) -> Self {
        Self {
            reconciler,
            item: None,
            history: Vec::new(),
            amount: 1,
            reason: None,
        }
    }

    pub async fn load(&mut self, item_id: ItemId) -> Result<(), ClientError> {
        let gateway = self.reconciler.gateway().as_ref();

        let item: InventoryItem = fetch_one(gateway, &detail_query(item_id))
            .await?
            .ok_or(ClientError::NotFound(item_id))?;
        let history =
            fetch_rows::<TransactionRecord, _>(gateway, &history_query(Some(item_id), 0, HISTORY_LIMIT))
                .await?;

        self.item = Some(item);
        self.history = history.rows;
        Ok(())
    }

    pub fn item(&self) -> Option<&InventoryItem> {
        self.item.as_ref()
    }

    /// Newest first.
    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    pub fn is_low_stock(&self) -> bool {
        self.item.as_ref().is_some_and(InventoryItem::is_low_stock)
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Set the amount from raw text; blank means 1.
    ///
    /// Zero or negative values are accepted here and rejected on submit.
    pub fn set_amount(&mut self, raw: &str) -> Result<(), ClientError> {
        let trimmed = raw.trim();
        self.amount = if trimmed.is_empty() {
            1
        } else {
            trimmed
                .parse()
                .map_err(|_| DomainError::validation(format!("not a whole number: {trimmed}")))?
        };
        Ok(())
    }

    pub fn select_reason(&mut self, reason: ReasonCode) {
        self.reason = Some(reason);
    }

    pub fn reason(&self) -> Option<ReasonCode> {
        self.reason
    }

    pub async fn add(&mut self) -> Result<(), ClientError> {
        let magnitude = self.validated_amount()?;
        self.submit(Adjustment::Increase(magnitude)).await
    }

    pub async fn deduct(&mut self) -> Result<(), ClientError> {
        let magnitude = self.validated_amount()?;
        self.submit(Adjustment::Decrease(magnitude)).await
    }

    fn validated_amount(&self) -> Result<Magnitude, ClientError> {
        if self.item.is_none() {
            return Err(ClientError::NotLoaded);
        }
        ReasonCode::require(self.reason)?;
        Ok(Magnitude::new(self.amount)?)
    }

    async fn submit(&mut self, adjustment: Adjustment) -> Result<(), ClientError> {
        let item_id = self.item.as_ref().ok_or(ClientError::NotLoaded)?.id;

        let refreshed = self
            .reconciler
            .adjust(item_id, adjustment, self.reason)
            .await?;

        // The write already landed; a failed reload only leaves the page stale.
        if let Err(e) = self.load(item_id).await {
            tracing::warn!(%item_id, error = %e, "reload after adjustment failed");
            if let (Some(item), Some(quantity)) = (self.item.as_mut(), refreshed) {
                item.set_displayed_quantity(quantity);
            }
        }
        Ok(())
    }
}
