//! History HTTP handlers

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult};
use crate::interfaces::http::modules::slots::ParkingAppState;

use super::dto::*;

fn to_dtos(records: Vec<crate::domain::HistoryRecord>) -> Vec<HistoryRecordDto> {
    records.into_iter().map(HistoryRecordDto::from).collect()
}

#[utoipa::path(
    get,
    path = "/api/v1/history",
    tag = "History",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Most recent sessions first", body = ApiResponse<Vec<HistoryRecordDto>>)
    )
)]
pub async fn list_history(
    State(state): State<ParkingAppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<HistoryRecordDto>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let records = state.parking.history(limit).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(to_dtos(records))))
}

#[utoipa::path(
    get,
    path = "/api/v1/history/pending",
    tag = "History",
    responses(
        (status = 200, description = "Unpaid sessions, most recent first", body = ApiResponse<Vec<HistoryRecordDto>>)
    )
)]
pub async fn list_pending(State(state): State<ParkingAppState>) -> ApiResult<Vec<HistoryRecordDto>> {
    let records = state.parking.pending_payments().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(to_dtos(records))))
}

#[utoipa::path(
    get,
    path = "/api/v1/history/revenue",
    tag = "History",
    responses(
        (status = 200, description = "Revenue over PAID sessions", body = ApiResponse<RevenueDto>)
    )
)]
pub async fn revenue(State(state): State<ParkingAppState>) -> ApiResult<RevenueDto> {
    let stats = state.parking.revenue_stats().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(stats.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/history/{history_id}/mark-paid",
    tag = "History",
    params(("history_id" = i32, Path, description = "History record ID")),
    responses(
        (status = 200, description = "Payment confirmed", body = ApiResponse<HistoryRecordDto>),
        (status = 404, description = "Record not found"),
        (status = 409, description = "Already paid")
    )
)]
pub async fn mark_paid(
    State(state): State<ParkingAppState>,
    Path(history_id): Path<i32>,
) -> ApiResult<HistoryRecordDto> {
    let record = state
        .parking
        .mark_paid(history_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(record.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/history",
    tag = "History",
    responses(
        (status = 200, description = "History cleared", body = ApiResponse<ClearHistoryResponse>)
    )
)]
pub async fn clear_history(State(state): State<ParkingAppState>) -> ApiResult<ClearHistoryResponse> {
    let removed = state.parking.clear_history().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ClearHistoryResponse { removed })))
}
