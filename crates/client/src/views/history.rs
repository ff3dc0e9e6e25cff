use std::sync::Arc;

use clinicstock_core::ItemId;
use clinicstock_gateway::{Gateway, fetch_rows};
use clinicstock_inventory::TransactionRecord;

use crate::error::ClientError;
use crate::filters::history_query;

pub const PAGE_LIMIT: u64 = 200;

/// Read-only audit trail, newest first.
pub struct TransactionHistory<G> {
    gateway: Arc<G>,
    item_id: Option<ItemId>,
    limit: u64,
    records: Vec<TransactionRecord>,
    exhausted: bool,
}

impl<G> TransactionHistory<G>
where
    G: Gateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            item_id: None,
            limit: PAGE_LIMIT,
            records: Vec::new(),
            exhausted: false,
        }
    }

    /// Only show transactions of one item.
    pub fn for_item(mut self, item_id: ItemId) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.records.clear();
        self.exhausted = false;
        self.load_more().await
    }

    /// Append the next page; a short page marks the end.
    pub async fn load_more(&mut self) -> Result<(), ClientError> {
        if self.exhausted {
            return Ok(());
        }
        let query = history_query(self.item_id, self.records.len() as u64, self.limit);
        let page = fetch_rows::<TransactionRecord, _>(self.gateway.as_ref(), &query).await?;

        self.exhausted = (page.rows.len() as u64) < self.limit;
        self.records.extend(page.rows);
        Ok(())
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicstock_gateway::{InMemoryGateway, collections};
    use serde_json::json;

    fn record(item_id: ItemId, minute: u32, change: i64) -> serde_json::Value {
        json!({
            "created_at": format!("2024-05-01T10:{minute:02}:00Z"),
            "qty_change": change,
            "reason": "dispense",
            "item_id": item_id.to_string(),
        })
    }

    #[tokio::test]
    async fn newest_first_with_paging() {
        let gw = Arc::new(InMemoryGateway::new());
        let id = ItemId::new();
        for minute in 0..5 {
            gw.insert_row(collections::INVENTORY_TRANSACTIONS, record(id, minute, -1));
        }

        let mut history = TransactionHistory::new(gw).with_limit(3);
        history.load().await.unwrap();
        assert_eq!(history.records().len(), 3);
        assert!(history.has_more());
        assert_eq!(history.records()[0].created_at.to_rfc3339(), "2024-05-01T10:04:00+00:00");

        history.load_more().await.unwrap();
        assert_eq!(history.records().len(), 5);
        assert!(!history.has_more());
    }

    #[tokio::test]
    async fn item_filter() {
        let gw = Arc::new(InMemoryGateway::new());
        let mine = ItemId::new();
        gw.insert_row(collections::INVENTORY_TRANSACTIONS, record(mine, 1, 4));
        gw.insert_row(collections::INVENTORY_TRANSACTIONS, record(ItemId::new(), 2, -2));

        let mut history = TransactionHistory::new(gw).for_item(mine);
        history.load().await.unwrap();

        assert_eq!(history.records().len(), 1);
        assert_eq!(history.records()[0].display_change(), "+4");
        assert_eq!(history.records()[0].reason_label(), "Dispense");
    }
}
