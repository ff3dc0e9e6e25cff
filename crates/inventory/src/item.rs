use serde::{Deserialize, Serialize};

use clinicstock_core::{CategoryId, Entity, ItemId, LocationId, VendorId};

use crate::quantity::Quantity;

/// Embedded relation as returned by `select=...,categories(name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

/// Read model of one row of `inventory_items`.
///
/// This is a snapshot: it may be stale the instant after it was fetched, so it
/// is only ever used for display. Deltas are always computed against a fresh
/// read of `qty_on_hand`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    #[serde(rename = "item_name")]
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    pub qty_on_hand: i64,
    #[serde(default)]
    pub par_level_min: Option<i64>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    #[serde(default)]
    pub storage_location_id: Option<LocationId>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_controlled: Option<bool>,
    #[serde(default, rename = "categories", skip_serializing_if = "Option::is_none")]
    pub category: Option<NamedRef>,
    #[serde(default, rename = "storage_locations", skip_serializing_if = "Option::is_none")]
    pub location: Option<NamedRef>,
}

impl InventoryItem {
    /// Minimal item, mostly useful for fixtures.
    pub fn new(id: ItemId, name: impl Into<String>, qty_on_hand: i64) -> Self {
        Self {
            id,
            name: name.into(),
            sku: None,
            qty_on_hand,
            par_level_min: None,
            category_id: None,
            vendor_id: None,
            storage_location_id: None,
            notes: None,
            is_controlled: None,
            category: None,
            location: None,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_par(mut self, par: i64) -> Self {
        self.par_level_min = Some(par);
        self
    }

    /// Quantity on hand as displayed (never negative).
    pub fn quantity(&self) -> Quantity {
        Quantity::clamped(self.qty_on_hand)
    }

    /// Low stock: `qty_on_hand <= par_level_min`, only when a par is set.
    pub fn is_low_stock(&self) -> bool {
        self.par_level_min
            .is_some_and(|par| self.qty_on_hand <= par)
    }

    pub fn is_controlled(&self) -> bool {
        self.is_controlled.unwrap_or(false)
    }

    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.name.as_str())
    }

    pub fn location_name(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.name.as_str())
    }

    /// Overwrite the displayed quantity (after a re-read or an optimistic bump).
    pub fn set_displayed_quantity(&mut self, quantity: Quantity) {
        self.qty_on_hand = quantity.get();
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
