//! In-process fake of the carrier API
//!
//! Serves the token, inventory, price request, ordering and egress echo
//! endpoints on an ephemeral port and counts every request, so tests can run
//! the real HTTP clients end to end.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Behaviour knobs for the fake carrier
#[derive(Debug, Clone)]
pub struct FakeCarrierConfig {
    pub bandwidth: String,
    pub expires_in: Value,
    pub egress_ip: String,
    /// Answer 503 to this many inventory requests before succeeding
    pub inventory_failures: u32,
    /// Answer 401 to this many inventory requests before succeeding
    pub inventory_unauthorized: u32,
    /// Answer 409 to order submissions and serve the existing order on lookup
    pub order_conflict: bool,
    pub order_state: String,
}

impl Default for FakeCarrierConfig {
    fn default() -> Self {
        Self {
            bandwidth: "1 Mbps".to_string(),
            expires_in: json!(3600),
            egress_ip: "203.0.113.10".to_string(),
            inventory_failures: 0,
            inventory_unauthorized: 0,
            order_conflict: false,
            order_state: "completed".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeCarrierState {
    pub token_requests: u32,
    pub inventory_requests: u32,
    pub price_requests: u32,
    pub order_posts: u32,
    pub order_lookups: u32,
    pub status_polls: u32,
    pub last_price_request: Option<Value>,
    pub last_order: Option<Value>,
    pub inventory_query: Option<HashMap<String, String>>,
    pub customer_numbers: Vec<String>,
    pub bearer_tokens: Vec<String>,
}

#[derive(Clone)]
struct AppState {
    config: FakeCarrierConfig,
    state: Arc<Mutex<FakeCarrierState>>,
}

pub struct FakeCarrier {
    pub base_url: String,
    state: Arc<Mutex<FakeCarrierState>>,
    handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeCarrier {
    pub async fn start(config: FakeCarrierConfig) -> Self {
        let state = Arc::new(Mutex::new(FakeCarrierState::default()));
        let app = Router::new()
            .route("/oauth/v2/token", post(token))
            .route("/ProductInventory/v1/inventory", get(inventory))
            .route("/Product/v1/priceRequest", post(price_request))
            .route(
                "/Customer/v3/Ordering/orderRequest",
                post(submit_order).get(lookup_order),
            )
            .route("/Customer/v3/Ordering/orderRequest/:id", get(order_status))
            .route("/ip", get(egress_ip))
            .with_state(AppState {
                config,
                state: Arc::clone(&state),
            });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("Fake carrier failed to start");
        });

        Self {
            base_url: format!("http://{address}"),
            state,
            handle,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn state(&self) -> parking_lot::MutexGuard<'_, FakeCarrierState> {
        self.state.lock()
    }

    pub fn egress_url(&self) -> String {
        format!("{}/ip", self.base_url)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

fn record_headers(state: &mut FakeCarrierState, headers: &HeaderMap) -> bool {
    if let Some(customer) = headers.get("x-customer-number").and_then(|v| v.to_str().ok()) {
        state.customer_numbers.push(customer.to_string());
    }
    match headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        Some(token) => {
            state.bearer_tokens.push(token.to_string());
            true
        }
        None => false,
    }
}

async fn token(
    State(app): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut state = app.state.lock();
    state.token_requests += 1;

    let basic = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !basic || form.get("grant_type").map(String::as_str) != Some("client_credentials") {
        return (StatusCode::BAD_REQUEST, "invalid_client").into_response();
    }

    Json(json!({
        "access_token": format!("fake-token-{}", state.token_requests),
        "token_type": "Bearer",
        "expires_in": app.config.expires_in,
    }))
    .into_response()
}

async fn inventory(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = app.state.lock();
    state.inventory_requests += 1;
    if !record_headers(&mut state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.inventory_requests <= app.config.inventory_unauthorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.inventory_requests
        <= app.config.inventory_unauthorized + app.config.inventory_failures
    {
        return (StatusCode::SERVICE_UNAVAILABLE, "try again").into_response();
    }

    let service_id = query.get("serviceId").cloned().unwrap_or_default();
    state.inventory_query = Some(query);

    Json(json!({
        "serviceInventory": [{
            "id": service_id,
            "status": "active",
            "billingAccount": {"id": "BA-100", "name": "Example Corp"},
            "location": {"masterSiteid": "MS-9"},
            "productCharacteristic": [
                {"name": "Bandwidth", "value": app.config.bandwidth}
            ]
        }]
    }))
    .into_response()
}

async fn price_request(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = app.state.lock();
    state.price_requests += 1;
    if !record_headers(&mut state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    state.last_price_request = Some(body);
    (StatusCode::CREATED, Json(json!({"id": format!("Q-{}", state.price_requests)}))).into_response()
}

async fn submit_order(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = app.state.lock();
    state.order_posts += 1;
    if !record_headers(&mut state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let external_id = body["externalId"].as_str().unwrap_or_default().to_string();
    state.last_order = Some(body);

    if app.config.order_conflict {
        return (
            StatusCode::CONFLICT,
            format!("Order with externalId {external_id} already exists"),
        )
            .into_response();
    }
    (
        StatusCode::CREATED,
        Json(json!({"id": "ORD-NEW", "externalId": external_id, "state": "acknowledged"})),
    )
        .into_response()
}

async fn lookup_order(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut state = app.state.lock();
    state.order_lookups += 1;
    if !record_headers(&mut state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let external_id = query.get("externalId").cloned().unwrap_or_default();
    Json(json!([{"id": "ORD-EXISTING", "externalId": external_id}])).into_response()
}

async fn order_status(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = app.state.lock();
    state.status_polls += 1;
    if !record_headers(&mut state, &headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"id": id, "state": app.config.order_state})).into_response()
}

async fn egress_ip(State(app): State<AppState>) -> String {
    format!("{}\n", app.config.egress_ip)
}
