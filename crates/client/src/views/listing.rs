use std::collections::HashMap;
use std::sync::Arc;

use clinicstock_core::{Entity, ItemId};
use clinicstock_gateway::{Gateway, fetch_rows};
use clinicstock_inventory::{Adjustment, InventoryItem, ItemFilters, ItemSort, Quantity, ReasonCode};

use crate::error::ClientError;
use crate::filters::{item_page_query, item_query};
use crate::reconcile::Reconciler;

pub const PAGE_SIZE: u64 = 30;

/// The inventory catalog: search, filters, sort, paging and quick adjust.
///
/// Two paging modes:
///
/// - normal: each page is a server-side `range` with an exact total;
/// - low stock only: the whole candidate set is fetched once, filtered here
///   (the predicate compares two columns) and then paged locally.
pub struct ItemListing<G> {
    reconciler: Arc<Reconciler<G>>,
    filters: ItemFilters,
    sort: ItemSort,
    items: Vec<InventoryItem>,
    /// Filtered low-stock candidates; `None` in normal mode.
    candidates: Option<Vec<InventoryItem>>,
    next_page: u64,
    total: Option<u64>,
    reasons: HashMap<ItemId, ReasonCode>,
}

impl<G> ItemListing<G>
where
    G: Gateway,
{
    pub fn new(reconciler: Arc<Reconciler<G>>) -> Self {
        Self {
            reconciler,
            filters: ItemFilters::default(),
            sort: ItemSort::default(),
            items: Vec::new(),
            candidates: None,
            next_page: 0,
            total: None,
            reasons: HashMap::new(),
        }
    }

    pub fn filters(&self) -> &ItemFilters {
        &self.filters
    }

    pub fn sort(&self) -> ItemSort {
        self.sort
    }

    /// Reload from the first page.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let gateway = self.reconciler.gateway();

        if self.filters.low_stock_only {
            let page = fetch_rows::<InventoryItem, _>(
                gateway.as_ref(),
                &item_query(&self.filters, self.sort),
            )
            .await?;
            let candidates = self.filters.apply(page.rows);
            tracing::debug!(candidates = candidates.len(), "loaded low-stock candidates");

            self.total = Some(candidates.len() as u64);
            self.items = candidates.iter().take(PAGE_SIZE as usize).cloned().collect();
            self.candidates = Some(candidates);
        } else {
            let page = fetch_rows::<InventoryItem, _>(
                gateway.as_ref(),
                &item_page_query(&self.filters, self.sort, 0, PAGE_SIZE),
            )
            .await?;
            tracing::debug!(rows = page.rows.len(), total = ?page.total, "loaded first page");

            self.total = page.total;
            self.items = page.rows;
            self.candidates = None;
        }

        self.next_page = 1;
        Ok(())
    }

    /// Append the next page. Does nothing when everything is loaded.
    pub async fn load_more(&mut self) -> Result<(), ClientError> {
        if !self.has_more() {
            return Ok(());
        }

        if let Some(candidates) = &self.candidates {
            let start = self.items.len();
            let end = (start + PAGE_SIZE as usize).min(candidates.len());
            self.items.extend_from_slice(&candidates[start..end]);
        } else {
            let query = item_page_query(&self.filters, self.sort, self.next_page, PAGE_SIZE);
            let mut page =
                fetch_rows::<InventoryItem, _>(self.reconciler.gateway().as_ref(), &query).await?;
            if page.total.is_some() {
                self.total = page.total;
            }
            // Writes since the last page can shift offsets and repeat a row.
            page.rows
                .retain(|row| !self.items.iter().any(|shown| shown.same_entity(row)));
            self.items.extend(page.rows);
        }

        self.next_page += 1;
        Ok(())
    }

    pub async fn set_search(&mut self, search: impl Into<String>) -> Result<(), ClientError> {
        self.filters.search = Some(search.into());
        self.refresh().await
    }

    pub async fn set_filters(&mut self, filters: ItemFilters) -> Result<(), ClientError> {
        self.filters = filters;
        self.refresh().await
    }

    pub async fn set_sort(&mut self, sort: ItemSort) -> Result<(), ClientError> {
        self.sort = sort;
        self.refresh().await
    }

    /// Replace filters and sort together with a single reload.
    pub async fn set_query(&mut self, filters: ItemFilters, sort: ItemSort) -> Result<(), ClientError> {
        self.filters = filters;
        self.sort = sort;
        self.refresh().await
    }

    pub fn visible_items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn has_more(&self) -> bool {
        self.total
            .is_some_and(|total| (self.items.len() as u64) < total)
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn low_stock_in_view(&self) -> usize {
        self.items.iter().filter(|it| it.is_low_stock()).count()
    }

    /// Per-row reason; it stays selected after an adjustment.
    pub fn select_reason(&mut self, item_id: ItemId, reason: ReasonCode) {
        self.reasons.insert(item_id, reason);
    }

    pub fn selected_reason(&self, item_id: ItemId) -> Option<ReasonCode> {
        self.reasons.get(&item_id).copied()
    }

    /// Apply `delta` to one row with its selected reason.
    ///
    /// The row shows the authoritative re-read when available, otherwise
    /// `qty + delta` for display only. Returns the quantity now shown, or
    /// `None` if the item isn't on screen and no re-read came back.
    ///
    /// In low-stock mode the locally paged candidates are re-sorted so the
    /// loaded pages stay in the current order.
    pub async fn quick_adjust(
        &mut self,
        item_id: ItemId,
        delta: i64,
    ) -> Result<Option<Quantity>, ClientError> {
        let adjustment = Adjustment::from_delta(delta);
        let refreshed = self
            .reconciler
            .adjust(item_id, adjustment, self.selected_reason(item_id))
            .await?;

        let mut shown = refreshed;
        let rows = self
            .items
            .iter_mut()
            .chain(self.candidates.iter_mut().flatten())
            .filter(|it| it.id() == &item_id);
        for row in rows {
            let quantity = refreshed.unwrap_or_else(|| adjustment.apply_to(row.quantity()));
            row.set_displayed_quantity(quantity);
            shown = Some(quantity);
        }

        if let Some(candidates) = &mut self.candidates {
            self.sort.sort(candidates);
            let loaded = self.items.len();
            self.items = candidates.iter().take(loaded).cloned().collect();
        }
        Ok(shown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicstock_gateway::InMemoryGateway;
    use clinicstock_inventory::{SortDir, SortKey};

    fn seeded(count: usize) -> (Arc<InMemoryGateway>, ItemListing<InMemoryGateway>) {
        let gw = Arc::new(InMemoryGateway::new());
        for i in 0..count {
            // Every third item sits at or below its par.
            let item = InventoryItem::new(ItemId::new(), format!("Item {i:03}"), 10)
                .with_par(if i % 3 == 0 { 10 } else { 2 });
            gw.insert_item(&item);
        }
        let listing = ItemListing::new(Arc::new(Reconciler::new(gw.clone())));
        (gw, listing)
    }

    #[tokio::test]
    async fn pages_from_server_with_exact_total() {
        let (_, mut listing) = seeded(45);

        listing.refresh().await.unwrap();
        assert_eq!(listing.visible_items().len(), 30);
        assert_eq!(listing.total(), Some(45));
        assert!(listing.has_more());

        listing.load_more().await.unwrap();
        assert_eq!(listing.visible_items().len(), 45);
        assert!(!listing.has_more());
        assert_eq!(listing.visible_items()[44].name, "Item 044");
    }

    #[tokio::test]
    async fn low_stock_filters_before_paging() {
        let (_, mut listing) = seeded(100);

        listing
            .set_filters(ItemFilters {
                low_stock_only: true,
                ..Default::default()
            })
            .await
            .unwrap();

        // 34 low items exist across the whole catalog, not just the first page.
        assert_eq!(listing.total(), Some(34));
        assert_eq!(listing.visible_items().len(), 30);
        assert_eq!(listing.low_stock_in_view(), 30);

        listing.load_more().await.unwrap();
        assert_eq!(listing.visible_items().len(), 34);
        assert!(!listing.has_more());
    }

    #[tokio::test]
    async fn sort_is_pushed_to_the_backend() {
        let (gw, mut listing) = seeded(3);
        let id = listing_first_id(&mut listing).await;
        gw.set_quantity(id, 99);

        listing
            .set_sort(ItemSort::new(SortKey::Quantity, SortDir::Desc))
            .await
            .unwrap();
        assert_eq!(listing.visible_items()[0].id, id);
    }

    async fn listing_first_id(listing: &mut ItemListing<InMemoryGateway>) -> ItemId {
        listing.refresh().await.unwrap();
        listing.visible_items()[0].id
    }

    #[tokio::test]
    async fn quick_adjust_needs_selected_reason() {
        let (gw, mut listing) = seeded(1);
        let id = listing_first_id(&mut listing).await;

        let err = listing.quick_adjust(id, -1).await.unwrap_err();
        assert!(err.is_validation());
        assert!(gw.calls().is_empty());

        listing.select_reason(id, ReasonCode::Dispense);
        let shown = listing.quick_adjust(id, -1).await.unwrap();

        assert_eq!(shown, Some(Quantity::clamped(9)));
        assert_eq!(listing.visible_items()[0].qty_on_hand, 9);
        assert_eq!(listing.selected_reason(id), Some(ReasonCode::Dispense));
    }

    #[tokio::test]
    async fn quick_adjust_shows_authoritative_quantity() {
        let (gw, mut listing) = seeded(1);
        let id = listing_first_id(&mut listing).await;
        listing.select_reason(id, ReasonCode::Receive);

        // Another user restocked since our snapshot.
        gw.set_quantity(id, 50);
        listing.quick_adjust(id, 1).await.unwrap();

        assert_eq!(listing.visible_items()[0].qty_on_hand, 51);
    }

    #[tokio::test]
    async fn low_stock_rows_are_resorted_after_quick_adjust() {
        let gw = Arc::new(InMemoryGateway::new());
        let mut ids = Vec::new();
        for qty in [1, 2, 3] {
            let id = ItemId::new();
            gw.insert_item(&InventoryItem::new(id, format!("Item {qty}"), qty).with_par(5));
            ids.push(id);
        }
        let mut listing = ItemListing::new(Arc::new(Reconciler::new(gw.clone())));
        listing
            .set_query(
                ItemFilters {
                    low_stock_only: true,
                    ..Default::default()
                },
                ItemSort::new(SortKey::Quantity, SortDir::Asc),
            )
            .await
            .unwrap();

        listing.select_reason(ids[0], ReasonCode::Receive);
        listing.quick_adjust(ids[0], 3).await.unwrap();

        let order: Vec<ItemId> = listing.visible_items().iter().map(|it| it.id).collect();
        assert_eq!(order, [ids[1], ids[2], ids[0]]);
        assert_eq!(listing.visible_items()[2].qty_on_hand, 4);
    }

    #[tokio::test]
    async fn next_page_skips_rows_already_shown() {
        let (gw, mut listing) = seeded(31);
        listing
            .set_sort(ItemSort::new(SortKey::Quantity, SortDir::Desc))
            .await
            .unwrap();

        // A row from the first page drops to the bottom before the next load,
        // pushing an already shown row onto page two.
        let moved = listing.visible_items()[0].id;
        listing.select_reason(moved, ReasonCode::Dispense);
        listing.quick_adjust(moved, -10).await.unwrap();
        assert_eq!(gw.quantity(moved), Some(0));

        listing.load_more().await.unwrap();

        let mut ids: Vec<ItemId> = listing.visible_items().iter().map(|it| it.id).collect();
        let loaded = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), loaded);
    }

    #[tokio::test]
    async fn quick_adjust_falls_back_to_optimistic_display() {
        let (gw, mut listing) = seeded(1);
        let id = listing_first_id(&mut listing).await;
        listing.select_reason(id, ReasonCode::Receive);

        // The write lands but the follow-up read fails.
        gw.fail_reads_for(id);
        let shown = listing.quick_adjust(id, 2).await.unwrap();

        assert_eq!(shown, Some(Quantity::clamped(12)));
        assert_eq!(gw.quantity(id), Some(12));
    }
}
