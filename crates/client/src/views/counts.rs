use std::sync::Arc;

use serde::Deserialize;

use clinicstock_core::{CategoryId, ItemId, LocationId};
use clinicstock_gateway::{Gateway, fetch_rows};
use clinicstock_inventory::{CountInput, CountSheet, ReasonCode};

use crate::error::ClientError;
use crate::filters::count_query;
use crate::reconcile::{BatchReport, Reconciler};

/// Row of the count sheet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountRow {
    pub id: ItemId,
    pub item_name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub qty_on_hand: i64,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub storage_location_id: Option<LocationId>,
}

/// Cycle count: enter physical counts, then reconcile them in one batch.
pub struct CycleCount<G> {
    reconciler: Arc<Reconciler<G>>,
    category: Option<CategoryId>,
    location: Option<LocationId>,
    items: Vec<CountRow>,
    sheet: CountSheet,
}

impl<G> CycleCount<G>
where
    G: Gateway,
{
    pub fn new(reconciler: Arc<Reconciler<G>>) -> Self {
        Self {
            reconciler,
            category: None,
            location: None,
            items: Vec::new(),
            sheet: CountSheet::new(),
        }
    }

    /// Load every item matching the category/location, ordered by name.
    ///
    /// Entered counts survive a reload.
    pub async fn load(
        &mut self,
        category: Option<CategoryId>,
        location: Option<LocationId>,
    ) -> Result<(), ClientError> {
        self.category = category;
        self.location = location;
        self.reload().await
    }

    async fn reload(&mut self) -> Result<(), ClientError> {
        let query = count_query(self.category, self.location);
        let page = fetch_rows::<CountRow, _>(self.reconciler.gateway().as_ref(), &query).await?;
        self.items = page.rows;
        Ok(())
    }

    pub fn items(&self) -> &[CountRow] {
        &self.items
    }

    pub fn sheet(&self) -> &CountSheet {
        &self.sheet
    }

    /// Record raw text for one item. Blank removes the entry.
    pub fn enter(&mut self, item_id: ItemId, raw: &str) -> Result<CountInput, ClientError> {
        Ok(self.sheet.enter_text(item_id, raw)?)
    }

    /// `counted - system` for an entered item, against the loaded snapshot.
    pub fn variance(&self, item_id: ItemId) -> Option<i64> {
        let row = self.items.iter().find(|r| r.id == item_id)?;
        self.sheet.variance(&item_id, row.qty_on_hand)
    }

    pub fn entered_count(&self) -> usize {
        self.sheet.entered_count()
    }

    /// Rows whose name contains `search`, optionally only those with a count.
    pub fn visible_items(&self, search: &str, edited_only: bool) -> Vec<&CountRow> {
        let term = search.trim().to_lowercase();
        self.items
            .iter()
            .filter(|r| term.is_empty() || r.item_name.to_lowercase().contains(&term))
            .filter(|r| !edited_only || self.sheet.is_edited(&r.id))
            .collect()
    }

    /// Reconcile every entered count as a count adjustment.
    ///
    /// Completed items are cleared from the sheet; failed ones keep their
    /// entry for a retry. The item list is reloaded when anything completed.
    pub async fn submit(&mut self) -> Result<BatchReport, ClientError> {
        if self.sheet.is_empty() {
            return Ok(BatchReport::default());
        }

        let report = self
            .reconciler
            .reconcile_batch(self.sheet.intents(), Some(ReasonCode::CountAdjustment))
            .await;

        for done in &report.completed {
            self.sheet.clear_item(&done.item_id);
        }

        if !report.completed.is_empty() {
            if let Err(e) = self.reload().await {
                tracing::warn!(error = %e, "reload after count submission failed");
            }
        }
        Ok(report)
    }
}
