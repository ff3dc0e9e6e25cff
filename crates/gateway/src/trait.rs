use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::GatewayError;
use crate::procedure::ProcedureCall;
use crate::query::RowQuery;

/// Raw rows returned by a read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub rows: Vec<JsonValue>,
    /// Total matching rows, only when the query asked for an exact count.
    pub total: Option<u64>,
}

/// Typed rows returned by [`fetch_rows`].
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: Option<u64>,
}

/// Access to the hosted backend.
///
/// ## Contract
///
/// - Reads never mutate.
/// - [`Gateway::call`] invokes one of the two quantity procedures. On success
///   the backend has atomically adjusted the quantity and appended one
///   transaction record.
/// - Nothing is retried here; callers decide what to do with a failure.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn select(&self, query: &RowQuery) -> Result<RowSet, GatewayError>;

    /// Single-row read; `None` when nothing matched.
    async fn select_one(&self, query: &RowQuery) -> Result<Option<JsonValue>, GatewayError> {
        let rows = self.select(&query.clone().limit(1)).await?;
        Ok(rows.rows.into_iter().next())
    }

    async fn call(&self, call: &ProcedureCall) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G> Gateway for Arc<G>
where
    G: Gateway + ?Sized,
{
    async fn select(&self, query: &RowQuery) -> Result<RowSet, GatewayError> {
        (**self).select(query).await
    }

    async fn select_one(&self, query: &RowQuery) -> Result<Option<JsonValue>, GatewayError> {
        (**self).select_one(query).await
    }

    async fn call(&self, call: &ProcedureCall) -> Result<(), GatewayError> {
        (**self).call(call).await
    }
}

fn decode<T: DeserializeOwned>(row: JsonValue) -> Result<T, GatewayError> {
    serde_json::from_value(row).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Read and deserialize every matching row.
pub async fn fetch_rows<T, G>(gateway: &G, query: &RowQuery) -> Result<Page<T>, GatewayError>
where
    T: DeserializeOwned,
    G: Gateway + ?Sized,
{
    let set = gateway.select(query).await?;
    let rows = set
        .rows
        .into_iter()
        .map(decode)
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Page {
        rows,
        total: set.total,
    })
}

/// Read and deserialize a single row.
pub async fn fetch_one<T, G>(gateway: &G, query: &RowQuery) -> Result<Option<T>, GatewayError>
where
    T: DeserializeOwned,
    G: Gateway + ?Sized,
{
    gateway.select_one(query).await?.map(decode).transpose()
}
