use core::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

use clinicstock_core::ItemId;
use clinicstock_inventory::{InventoryItem, TransactionRecord};

use crate::error::GatewayError;
use crate::procedure::ProcedureCall;
use crate::query::{Filter, RowQuery, collections};
use crate::r#trait::{Gateway, RowSet};

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Vec<JsonValue>>,
    calls: Vec<ProcedureCall>,
    failing_reads: HashSet<ItemId>,
    failing_calls: HashSet<ItemId>,
    reads: usize,
}

/// In-memory backend with the same procedure semantics as the real one.
///
/// Intended for tests/dev. Queries are evaluated naively over JSON rows;
/// projections are ignored (full rows are returned).
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: RwLock<State>,
}

fn poisoned() -> GatewayError {
    GatewayError::Network("lock poisoned".to_string())
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert any serializable row into a collection.
    pub fn insert_row(&self, collection: &str, row: impl Serialize) {
        let row = serde_json::to_value(row).unwrap_or(JsonValue::Null);
        if let Ok(mut state) = self.state.write() {
            state
                .tables
                .entry(collection.to_string())
                .or_default()
                .push(row);
        }
    }

    pub fn insert_item(&self, item: &InventoryItem) {
        self.insert_row(collections::INVENTORY_ITEMS, item);
    }

    /// Overwrite an item's quantity behind the client's back, as another
    /// user would.
    pub fn set_quantity(&self, item_id: ItemId, qty: i64) {
        if let Ok(mut state) = self.state.write() {
            if let Some(row) = find_item_mut(&mut state, item_id) {
                row["qty_on_hand"] = json!(qty);
            }
        }
    }

    pub fn quantity(&self, item_id: ItemId) -> Option<i64> {
        let mut state = self.state.write().ok()?;
        find_item_mut(&mut state, item_id).and_then(|row| row["qty_on_hand"].as_i64())
    }

    /// Make every single-item read of `item_id` fail.
    pub fn fail_reads_for(&self, item_id: ItemId) {
        if let Ok(mut state) = self.state.write() {
            state.failing_reads.insert(item_id);
        }
    }

    /// Make every procedure call on `item_id` fail.
    pub fn fail_calls_for(&self, item_id: ItemId) {
        if let Ok(mut state) = self.state.write() {
            state.failing_calls.insert(item_id);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.write() {
            state.failing_reads.clear();
            state.failing_calls.clear();
        }
    }

    /// Every procedure call attempted so far, including failed ones.
    pub fn calls(&self) -> Vec<ProcedureCall> {
        self.state
            .read()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    pub fn read_count(&self) -> usize {
        self.state.read().map(|s| s.reads).unwrap_or_default()
    }

    pub fn transactions_for(&self, item_id: ItemId) -> Vec<TransactionRecord> {
        let Ok(state) = self.state.read() else {
            return Vec::new();
        };
        state
            .tables
            .get(collections::INVENTORY_TRANSACTIONS)
            .into_iter()
            .flatten()
            .filter_map(|row| serde_json::from_value::<TransactionRecord>(row.clone()).ok())
            .filter(|rec| rec.item_id == Some(item_id))
            .collect()
    }
}

fn find_item_mut(state: &mut State, item_id: ItemId) -> Option<&mut JsonValue> {
    let wanted = item_id.to_string();
    state
        .tables
        .get_mut(collections::INVENTORY_ITEMS)?
        .iter_mut()
        .find(|row| row["id"].as_str() == Some(wanted.as_str()))
}

/// Targeted item id of a query, if it filters `inventory_items` by `id`.
fn targeted_item(query: &RowQuery) -> Option<ItemId> {
    if query.collection() != collections::INVENTORY_ITEMS {
        return None;
    }
    query.filters().iter().find_map(|f| match f {
        Filter::Eq { column, value } if column == "id" => value.parse().ok(),
        _ => None,
    })
}

fn as_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Case-insensitive LIKE with `*` / `%` wildcards.
fn like_match(text: &str, pattern: &str) -> bool {
    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    let parts: Vec<&str> = pattern.split(['*', '%']).collect();
    if parts.len() == 1 {
        return text == pattern;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };
    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle) {
            Some(pos) => rest = &rest[pos + middle.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

fn row_matches(row: &JsonValue, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { column, value } => row.get(column).is_some_and(|v| as_text(v) == *value),
        Filter::ILikeAny { columns, pattern } => columns.iter().any(|c| {
            row.get(c)
                .and_then(JsonValue::as_str)
                .is_some_and(|s| like_match(s, pattern))
        }),
    }
}

/// Postgres ordering: nulls last ascending, first descending.
fn compare_column(a: &JsonValue, b: &JsonValue, column: &str, ascending: bool) -> Ordering {
    let a = a.get(column).filter(|v| !v.is_null());
    let b = b.get(column).filter(|v| !v.is_null());
    let ordering = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => as_text(x).to_lowercase().cmp(&as_text(y).to_lowercase()),
        },
    };
    if ascending { ordering } else { ordering.reverse() }
}

#[async_trait]
impl Gateway for InMemoryGateway {
    async fn select(&self, query: &RowQuery) -> Result<RowSet, GatewayError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.reads += 1;

        if let Some(item_id) = targeted_item(query) {
            if state.failing_reads.contains(&item_id) {
                return Err(GatewayError::Network(format!(
                    "simulated read failure for {item_id}"
                )));
            }
        }

        let mut rows: Vec<JsonValue> = state
            .tables
            .get(query.collection())
            .into_iter()
            .flatten()
            .filter(|row| query.filters().iter().all(|f| row_matches(row, f)))
            .cloned()
            .collect();

        if let Some(order) = query.ordering() {
            let ascending = order.dir.is_ascending();
            rows.sort_by(|a, b| compare_column(a, b, &order.column, ascending));
        }

        let total = query.wants_count().then_some(rows.len() as u64);

        let offset = query.offset_value().unwrap_or(0) as usize;
        let limit = query.limit_value().map_or(usize::MAX, |l| l as usize);
        let rows = rows.into_iter().skip(offset).take(limit).collect();

        Ok(RowSet { rows, total })
    }

    async fn call(&self, call: &ProcedureCall) -> Result<(), GatewayError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.calls.push(call.clone());

        let item_id = call.item_id();
        if state.failing_calls.contains(&item_id) {
            return Err(GatewayError::backend(
                500,
                format!("simulated failure for {item_id}"),
            ));
        }

        let row = find_item_mut(&mut state, item_id)
            .ok_or_else(|| GatewayError::backend(400, "Item not found"))?;
        let current = row["qty_on_hand"].as_i64().unwrap_or(0);
        let next = current
            .checked_add(call.signed_delta())
            .ok_or_else(|| GatewayError::backend(400, "Quantity out of range"))?;
        if next < 0 {
            return Err(GatewayError::backend(400, "Insufficient quantity on hand"));
        }
        row["qty_on_hand"] = json!(next);

        let record = TransactionRecord {
            created_at: Utc::now(),
            qty_change: call.signed_delta(),
            reason: Some(call.reason().code().to_string()),
            item_id: Some(item_id),
        };
        let record = serde_json::to_value(record).map_err(|e| GatewayError::Decode(e.to_string()))?;
        state
            .tables
            .entry(collections::INVENTORY_TRANSACTIONS.to_string())
            .or_default()
            .push(record);

        Ok(())
    }
}
