//! Row read queries and their PostgREST encoding.

use clinicstock_inventory::SortDir;

/// Collection names exposed by the backend.
pub mod collections {
    pub const INVENTORY_ITEMS: &str = "inventory_items";
    pub const INVENTORY_TRANSACTIONS: &str = "inventory_transactions";
    pub const CATEGORIES: &str = "categories";
    pub const VENDORS: &str = "vendors";
    pub const STORAGE_LOCATIONS: &str = "storage_locations";
}

/// Row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`.
    Eq { column: String, value: String },
    /// Case-insensitive pattern match against any of the columns.
    ///
    /// `*` is the wildcard, as in PostgREST URLs.
    ILikeAny { columns: Vec<String>, pattern: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub dir: SortDir,
}

/// Filtered, sorted, paginated read over one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    collection: String,
    columns: String,
    filters: Vec<Filter>,
    order: Option<Order>,
    offset: Option<u64>,
    limit: Option<u64>,
    exact_count: bool,
}

impl RowQuery {
    pub fn from(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: None,
            offset: None,
            limit: None,
            exact_count: false,
        }
    }

    /// Column projection, in PostgREST `select` syntax.
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.to_string(),
        });
        self
    }

    /// Substring match of `term` against any of `columns`, ignoring case.
    pub fn ilike_any(mut self, columns: &[&str], term: &str) -> Self {
        self.filters.push(Filter::ILikeAny {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            pattern: format!("*{term}*"),
        });
        self
    }

    pub fn order(mut self, column: impl Into<String>, dir: SortDir) -> Self {
        self.order = Some(Order {
            column: column.into(),
            dir,
        });
        self
    }

    pub fn range(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Ask the backend for the total number of matching rows.
    pub fn exact_count(mut self) -> Self {
        self.exact_count = true;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn columns(&self) -> &str {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn wants_count(&self) -> bool {
        self.exact_count
    }

    /// Query-string parameters for `GET /rest/v1/{collection}`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];

        for filter in &self.filters {
            match filter {
                Filter::Eq { column, value } => {
                    pairs.push((column.clone(), format!("eq.{value}")));
                }
                Filter::ILikeAny { columns, pattern } => {
                    let value = quote_if_reserved(pattern);
                    let alternatives: Vec<String> = columns
                        .iter()
                        .map(|c| format!("{c}.ilike.{value}"))
                        .collect();
                    pairs.push(("or".to_string(), format!("({})", alternatives.join(","))));
                }
            }
        }

        if let Some(order) = &self.order {
            pairs.push((
                "order".to_string(),
                format!("{}.{}", order.column, order.dir.as_str()),
            ));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }
}

/// Values inside `or=(...)` must be double-quoted when they contain
/// PostgREST's reserved characters.
fn quote_if_reserved(value: &str) -> String {
    const RESERVED: &[char] = &[',', '.', ':', '(', ')', '"', '\\'];
    if !value.contains(RESERVED) {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
