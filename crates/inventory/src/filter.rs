//! Client-side filtering and sorting of item snapshots.
//!
//! The same predicates are pushed to the backend as query parameters where
//! possible (see the client crate). The low-stock predicate compares two
//! columns, so it is always evaluated here, over a complete candidate set.

use core::cmp::Ordering;
use core::str::FromStr;

use clinicstock_core::{CategoryId, DomainError, LocationId, VendorId};

use crate::item::InventoryItem;

/// Filters applied to the item catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilters {
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub vendor_id: Option<VendorId>,
    pub location_id: Option<LocationId>,
    pub low_stock_only: bool,
}

impl ItemFilters {
    /// Trimmed, non-empty search term.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn matches(&self, item: &InventoryItem) -> bool {
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            let in_name = item.name.to_lowercase().contains(&term);
            let in_sku = item
                .sku
                .as_deref()
                .is_some_and(|sku| sku.to_lowercase().contains(&term));
            if !in_name && !in_sku {
                return false;
            }
        }
        if self.category_id.is_some() && item.category_id != self.category_id {
            return false;
        }
        if self.vendor_id.is_some() && item.vendor_id != self.vendor_id {
            return false;
        }
        if self.location_id.is_some() && item.storage_location_id != self.location_id {
            return false;
        }
        if self.low_stock_only && !item.is_low_stock() {
            return false;
        }
        true
    }

    pub fn apply(&self, items: Vec<InventoryItem>) -> Vec<InventoryItem> {
        items.into_iter().filter(|it| self.matches(it)).collect()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    Quantity,
    Par,
}

impl SortKey {
    /// Backend column the key sorts on.
    pub fn column(&self) -> &'static str {
        match self {
            SortKey::Name => "item_name",
            SortKey::Quantity => "qty_on_hand",
            SortKey::Par => "par_level_min",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn is_ascending(&self) -> bool {
        matches!(self, SortDir::Asc)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ItemSort {
    pub key: SortKey,
    pub dir: SortDir,
}

impl ItemSort {
    pub fn new(key: SortKey, dir: SortDir) -> Self {
        Self { key, dir }
    }

    /// Order two items the way the backend would.
    ///
    /// Missing par values follow Postgres defaults: last when ascending,
    /// first when descending.
    pub fn compare(&self, a: &InventoryItem, b: &InventoryItem) -> Ordering {
        let directed = |o: Ordering| if self.dir.is_ascending() { o } else { o.reverse() };
        match self.key {
            SortKey::Name => directed(
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.name.cmp(&b.name)),
            ),
            SortKey::Quantity => directed(a.qty_on_hand.cmp(&b.qty_on_hand)),
            SortKey::Par => match (a.par_level_min, b.par_level_min) {
                (Some(x), Some(y)) => directed(x.cmp(&y)),
                (None, None) => Ordering::Equal,
                (None, Some(_)) => directed(Ordering::Greater),
                (Some(_), None) => directed(Ordering::Less),
            },
        }
    }

    pub fn sort(&self, items: &mut [InventoryItem]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

impl FromStr for ItemSort {
    type Err = DomainError;

    /// Accepts `key:dir`, e.g. `qty_on_hand:desc` or `name:asc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, dir) = s.trim().split_once(':').unwrap_or((s.trim(), "asc"));
        let key = match key {
            "item_name" | "name" => SortKey::Name,
            "qty_on_hand" | "qty" | "quantity" => SortKey::Quantity,
            "par_level_min" | "par" => SortKey::Par,
            other => return Err(DomainError::validation(format!("unknown sort key: {other}"))),
        };
        let dir = match dir {
            "asc" => SortDir::Asc,
            "desc" => SortDir::Desc,
            other => {
                return Err(DomainError::validation(format!(
                    "unknown sort direction: {other}"
                )));
            }
        };
        Ok(Self { key, dir })
    }
}
