use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{patch, post},
    Json, Router,
};
use serde_json::json;
use tracing::instrument;

use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::AppJson,
    services::{
        order_status::TransitionOrdersRequest,
        receptions::{AppendOrdersRequest, CreateReceptionRequest},
    },
    AppState,
};

/// POST /customers/:customer_id/receptions
///
/// Creates a reception for the customer together with its initial orders.
#[instrument(skip(state, payload))]
async fn create_reception(
    State(state): State<AppState>,
    Path(customer_id): Path<i32>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateReceptionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state
        .services
        .receptions
        .create_reception_with_orders(customer_id, payload, &user)
        .await?;

    Ok(Json(json!({
        "message": "سفارش‌ها با موفقیت ثبت شدند.",
        "reception_id": result.reception_id,
        "order_count": result.order_count,
    })))
}

/// POST /receptions/:reception_id/orders
///
/// Appends orders to an existing reception.
#[instrument(skip(state, payload))]
async fn append_orders(
    State(state): State<AppState>,
    Path(reception_id): Path<i32>,
    user: AuthUser,
    AppJson(payload): AppJson<AppendOrdersRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let order_count = state
        .services
        .receptions
        .append_orders_to_reception(reception_id, payload.orders, &user)
        .await?;

    Ok(Json(json!({
        "message": "قطعات جدید با موفقیت اضافه شدند.",
        "order_count": order_count,
    })))
}

/// PATCH /orders/status
///
/// Bulk-moves orders into a new workflow status.
#[instrument(skip(state, payload))]
async fn transition_orders(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<TransitionOrdersRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let result = state
        .services
        .transitions
        .transition_orders(payload, &user)
        .await?;

    Ok(Json(json!({
        "message": format!("{} سفارش با موفقیت بروزرسانی شد.", result.updated_count),
        "updated_count": result.updated_count,
    })))
}

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/customers/:customer_id/receptions", post(create_reception))
        .route("/receptions/:reception_id/orders", post(append_orders))
        .route("/orders/status", patch(transition_orders))
}
