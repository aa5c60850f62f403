//! Order routes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use orderdesk_common::{
    NewOrder, Order, OrderCurrency, OrderError, OrderId, OrderStatus, OrderStatusUpdate,
};

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

/// Order as returned to clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub currency: OrderCurrency,
    pub status: OrderStatus,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub converted_amount: Option<Decimal>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_name: order.customer_name,
            total_amount: order.total_amount,
            currency: order.currency,
            status: order.status,
            converted_amount: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    status: Option<String>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<NewOrder>,
) -> ApiResult<Json<OrderResponse>> {
    let order = state.orders.create(request).await?;
    info!(order_id = %order.id, currency = %order.currency, "Order created");
    Ok(Json(order.into()))
}

async fn update_order_status(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
    AppJson(update): AppJson<OrderStatusUpdate>,
) -> ApiResult<Json<OrderResponse>> {
    let order = state
        .orders
        .update_status(OrderId::new(id), update.status)
        .await?;
    info!(order_id = %order.id, status = %order.status, "Order status updated");
    Ok(Json(order.into()))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<OrderResponse>> {
    let id = OrderId::new(id);
    let order = state
        .orders
        .get(id)
        .await?
        .ok_or(OrderError::NotFound(id))?;

    let converted = state
        .fx
        .converted_amount(order.total_amount, &order.currency.currency())
        .await?;

    debug!(order_id = %id, converted = %converted, "Order amount converted");
    let mut response = OrderResponse::from(order);
    response.converted_amount = Some(converted);
    Ok(Json(response))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListParams>,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<OrderStatus>()?),
    };

    let orders = state.orders.list(status).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "rate_cache": state.fx.stats(),
    }))
}

async fn enforce_timeout(State(limit): State<Duration>, request: Request, next: Next) -> Response {
    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => ApiError::Timeout.into_response(),
    }
}

/// Order routes, without middleware.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/", get(list_orders).post(create_order))
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}/", get(get_order).put(update_order_status))
        .route("/orders/{id}", get(get_order).put(update_order_status))
        .route("/health", get(health))
}

/// Full application router with tracing and timeout middleware.
pub fn app_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    router()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(
            config.request_timeout,
            enforce_timeout,
        ))
        .with_state(state)
}
