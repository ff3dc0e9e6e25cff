//! Query builders shared by the views.
//!
//! Search and key filters are pushed to the backend. The low-stock predicate
//! compares two columns, so it never becomes a query parameter; callers apply
//! it client-side over the full candidate set.

use clinicstock_core::{CategoryId, ItemId, LocationId};
use clinicstock_gateway::{RowQuery, collections};
use clinicstock_inventory::{ItemFilters, ItemSort, SortDir};

pub const LIST_COLUMNS: &str = "id,item_name,sku,qty_on_hand,par_level_min,storage_location_id,category_id,vendor_id,categories(name),storage_locations(name)";
pub const COUNT_COLUMNS: &str = "id,item_name,sku,qty_on_hand,category_id,storage_location_id";
pub const DETAIL_COLUMNS: &str = "*,categories(name),storage_locations(name)";
pub const HISTORY_COLUMNS: &str = "created_at,qty_change,reason,item_id";

/// Catalog read with search, key filters and sort; no paging.
pub fn item_query(filters: &ItemFilters, sort: ItemSort) -> RowQuery {
    let mut query = RowQuery::from(collections::INVENTORY_ITEMS).select(LIST_COLUMNS);

    if let Some(term) = filters.search_term() {
        query = query.ilike_any(&["item_name", "sku"], term);
    }
    if let Some(id) = filters.category_id {
        query = query.eq("category_id", id);
    }
    if let Some(id) = filters.vendor_id {
        query = query.eq("vendor_id", id);
    }
    if let Some(id) = filters.location_id {
        query = query.eq("storage_location_id", id);
    }

    query.order(sort.key.column(), sort.dir)
}

/// One server-side page of the catalog, with an exact total.
pub fn item_page_query(filters: &ItemFilters, sort: ItemSort, page: u64, page_size: u64) -> RowQuery {
    item_query(filters, sort)
        .range(page * page_size, page_size)
        .exact_count()
}

/// Every item matching the count sheet's category/location filters.
pub fn count_query(category: Option<CategoryId>, location: Option<LocationId>) -> RowQuery {
    let mut query = RowQuery::from(collections::INVENTORY_ITEMS)
        .select(COUNT_COLUMNS)
        .order("item_name", SortDir::Asc);
    if let Some(id) = category {
        query = query.eq("category_id", id);
    }
    if let Some(id) = location {
        query = query.eq("storage_location_id", id);
    }
    query
}

/// Authoritative quantity of one item.
pub fn quantity_query(item_id: ItemId) -> RowQuery {
    RowQuery::from(collections::INVENTORY_ITEMS)
        .select("qty_on_hand")
        .eq("id", item_id)
}

pub fn detail_query(item_id: ItemId) -> RowQuery {
    RowQuery::from(collections::INVENTORY_ITEMS)
        .select(DETAIL_COLUMNS)
        .eq("id", item_id)
}

/// Newest-first audit trail, optionally for a single item.
pub fn history_query(item_id: Option<ItemId>, offset: u64, limit: u64) -> RowQuery {
    let mut query = RowQuery::from(collections::INVENTORY_TRANSACTIONS)
        .select(HISTORY_COLUMNS)
        .order("created_at", SortDir::Desc)
        .range(offset, limit);
    if let Some(id) = item_id {
        query = query.eq("item_id", id);
    }
    query
}

/// Lookup table ordered by its label column.
pub fn lookup_query(collection: &str, label_column: &str) -> RowQuery {
    RowQuery::from(collection)
        .select(format!("id,{label_column}"))
        .order(label_column, SortDir::Asc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicstock_gateway::Filter;
    use clinicstock_inventory::SortKey;

    #[test]
    fn listing_query_pushes_search_and_keys_but_not_low_stock() {
        let category = CategoryId::new();
        let filters = ItemFilters {
            search: Some(" gauze ".into()),
            category_id: Some(category),
            low_stock_only: true,
            ..Default::default()
        };

        let query = item_query(&filters, ItemSort::new(SortKey::Par, SortDir::Desc));

        assert_eq!(
            query.filters(),
            &[
                Filter::ILikeAny {
                    columns: vec!["item_name".into(), "sku".into()],
                    pattern: "*gauze*".into(),
                },
                Filter::Eq {
                    column: "category_id".into(),
                    value: category.to_string(),
                },
            ]
        );
        let order = query.ordering().unwrap();
        assert_eq!(order.column, "par_level_min");
        assert_eq!(order.dir, SortDir::Desc);
        assert_eq!(query.limit_value(), None);
    }

    #[test]
    fn page_query_offsets_by_page() {
        let query = item_page_query(&ItemFilters::default(), ItemSort::default(), 2, 30);
        assert_eq!(query.offset_value(), Some(60));
        assert_eq!(query.limit_value(), Some(30));
        assert!(query.wants_count());
    }

    #[test]
    fn blank_search_adds_no_filter() {
        let filters = ItemFilters {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert!(item_query(&filters, ItemSort::default()).filters().is_empty());
    }

    #[test]
    fn history_for_item() {
        let id = ItemId::new();
        let query = history_query(Some(id), 0, 50);
        assert_eq!(query.collection(), "inventory_transactions");
        assert!(query.filters().contains(&Filter::Eq {
            column: "item_id".into(),
            value: id.to_string(),
        }));
    }
}
