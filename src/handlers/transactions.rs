use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{TransactionKind, TransactionStatus};
use crate::error::AppError;
use crate::services::lifecycle::{CreateTransactionInput, UpdateTransactionInput};
use crate::AppState;

#[derive(Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Wire payload for creating a transaction. Amounts stay strings here:
/// they are locale-formatted and parsed exactly by the domain layer.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub vehicle_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub commissionist_id: Option<String>,
    pub total_amount: Option<String>,
    pub commission_override: Option<String>,
    pub commission: Option<String>,
    pub payment_method: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub vehicle_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub commissionist_id: Option<String>,
    pub total_amount: Option<String>,
    pub commission_override: Option<String>,
    pub commission: Option<String>,
    pub payment_method: Option<String>,
    pub delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

fn actor_email(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Actor-Email")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub async fn create_transaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = CreateTransactionInput {
        kind: payload.kind,
        status: payload.status,
        vehicle_id: payload.vehicle_id,
        customer_id: payload.customer_id,
        commissionist_id: payload.commissionist_id,
        total_amount: payload.total_amount,
        commission_override: payload.commission_override,
        commission: payload.commission,
        payment_method: payload.payment_method,
        delivery_date: payload.delivery_date,
        notes: payload.notes,
        actor_email: actor_email(&headers),
    };

    let tx = state.lifecycle.create(input).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tx = state.lifecycle.get(id).await?;
    Ok(Json(tx))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    // Negative values would reach Postgres as LIMIT/OFFSET and fail.
    let limit = pagination.limit.unwrap_or(20).clamp(1, 100);
    let offset = pagination.offset.unwrap_or(0).max(0);

    let transactions = state.lifecycle.list(limit, offset).await?;
    Ok(Json(transactions))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = UpdateTransactionInput {
        kind: payload.kind,
        status: payload.status,
        vehicle_id: payload.vehicle_id,
        customer_id: payload.customer_id,
        commissionist_id: payload.commissionist_id,
        total_amount: payload.total_amount,
        commission_override: payload.commission_override,
        commission: payload.commission,
        payment_method: payload.payment_method,
        delivery_date: payload.delivery_date,
        notes: payload.notes,
        actor_email: actor_email(&headers),
    };

    let tx = state.lifecycle.update(id, input).await?;
    Ok(Json(tx))
}

/// DELETE on a transaction means cancel; rows are never removed.
pub async fn cancel_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let tx = state.lifecycle.cancel(id, actor_email(&headers)).await?;
    Ok(Json(tx))
}
