//! PostgREST-over-HTTP gateway.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::procedure::ProcedureCall;
use crate::query::RowQuery;
use crate::r#trait::{Gateway, RowSet};
use crate::session::Session;

/// Gateway backed by the hosted REST API (`/rest/v1`).
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: Option<Session>,
}

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// PostgREST codes for a missing, malformed or expired JWT.
const JWT_ERROR_CODES: [&str; 2] = ["PGRST301", "PGRST302"];

impl RestGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            session: config.session(),
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .session
            .as_ref()
            .map(Session::access_token)
            .unwrap_or(self.anon_key.as_str());
        req.header("apikey", &self.anon_key).bearer_auth(bearer)
    }

    fn table_url(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn rpc_url(&self, name: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, name)
    }
}

#[async_trait]
impl Gateway for RestGateway {
    async fn select(&self, query: &RowQuery) -> Result<RowSet, GatewayError> {
        tracing::debug!(collection = query.collection(), "select");

        let mut req = self
            .client
            .get(self.table_url(query.collection()))
            .query(&query.to_query_pairs());
        if query.wants_count() {
            req = req.header("Prefer", "count=exact");
        }

        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let total = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range);

        let rows: Vec<JsonValue> = resp
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        Ok(RowSet {
            rows,
            total: if query.wants_count() { total } else { None },
        })
    }

    async fn call(&self, call: &ProcedureCall) -> Result<(), GatewayError> {
        tracing::debug!(
            procedure = call.procedure().name(),
            item_id = %call.item_id(),
            "rpc"
        );

        let req = self
            .client
            .post(self.rpc_url(call.procedure().name()))
            .json(&call.args());

        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }
}

async fn error_from_response(resp: Response) -> GatewayError {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return GatewayError::Unauthorized;
    }

    let body = resp.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<BackendErrorBody>(&body).ok();

    // A bad JWT means signed out; any other 403 keeps the database's message.
    if parsed
        .as_ref()
        .and_then(|b| b.code.as_deref())
        .is_some_and(|code| JWT_ERROR_CODES.contains(&code))
    {
        return GatewayError::Unauthorized;
    }

    let message = parsed
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        });

    GatewayError::backend(status.as_u16(), message)
}

/// Total from `Content-Range: 0-29/123` (`*/0` when empty, `0-29/*` when
/// the count was not requested).
fn parse_content_range(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicstock_core::ItemId;
    use clinicstock_inventory::{Adjustment, ReasonCode, SortDir};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> RestGateway {
        let config = GatewayConfig::new(server.uri(), "anon-key").with_access_token("user-jwt");
        RestGateway::new(&config).unwrap()
    }

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range("0-29/123"), Some(123));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-29/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    #[tokio::test]
    async fn select_sends_filters_auth_and_reads_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/inventory_items"))
            .and(query_param("select", "id,item_name,qty_on_hand"))
            .and(query_param("category_id", "eq.cat-1"))
            .and(query_param("order", "item_name.asc"))
            .and(query_param("offset", "0"))
            .and(query_param("limit", "30"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-jwt"))
            .and(header("prefer", "count=exact"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-range", "0-0/41")
                    .set_body_json(json!([{ "id": "x", "item_name": "Gauze", "qty_on_hand": 3 }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let query = RowQuery::from("inventory_items")
            .select("id,item_name,qty_on_hand")
            .eq("category_id", "cat-1")
            .order("item_name", SortDir::Asc)
            .range(0, 30)
            .exact_count();

        let set = gateway(&server).select(&query).await.unwrap();
        assert_eq!(set.rows.len(), 1);
        assert_eq!(set.total, Some(41));
    }

    #[tokio::test]
    async fn select_one_limits_to_a_single_row() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/inventory_items"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let row = gateway(&server)
            .select_one(&RowQuery::from("inventory_items").eq("id", "nope"))
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn call_posts_procedure_arguments() {
        let server = MockServer::start().await;
        let item = ItemId::new();

        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/deduct_inventory"))
            .and(body_json(json!({
                "p_item_id": item.to_string(),
                "p_qty": 3,
                "p_reason": "count_adjustment"
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let call = ProcedureCall::for_adjustment(
            item,
            Adjustment::from_delta(-3),
            ReasonCode::CountAdjustment,
        )
        .unwrap();
        gateway(&server).call(&call).await.unwrap();
    }

    #[tokio::test]
    async fn backend_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/deduct_inventory"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": "P0001",
                "message": "Insufficient quantity on hand",
                "details": null,
                "hint": null
            })))
            .mount(&server)
            .await;

        let call = ProcedureCall::for_adjustment(
            ItemId::new(),
            Adjustment::from_delta(-50),
            ReasonCode::Dispense,
        )
        .unwrap();
        let err = gateway(&server).call(&call).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::backend(400, "Insufficient quantity on hand")
        );
        assert_eq!(err.user_message(), "Insufficient quantity on hand");
    }

    #[tokio::test]
    async fn forbidden_keeps_permission_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/deduct_inventory"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "42501",
                "message": "Only pharmacists may deduct controlled items"
            })))
            .mount(&server)
            .await;

        let call = ProcedureCall::for_adjustment(
            ItemId::new(),
            Adjustment::from_delta(-1),
            ReasonCode::Dispense,
        )
        .unwrap();
        let err = gateway(&server).call(&call).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::backend(403, "Only pharmacists may deduct controlled items")
        );
        assert!(err.user_message().contains("pharmacists"));
    }

    #[tokio::test]
    async fn expired_jwt_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "PGRST301",
                "message": "JWT expired"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .select(&RowQuery::from("inventory_items"))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Unauthorized);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_guard_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .select(&RowQuery::from("inventory_transactions"))
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Unauthorized);
    }

    #[tokio::test]
    async fn anon_key_is_bearer_without_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let config = GatewayConfig::new(server.uri(), "anon-key");
        let gw = RestGateway::new(&config).unwrap();
        assert!(gw.session().is_none());
        gw.select(&RowQuery::from("categories")).await.unwrap();
    }
}
