//! Sensor feed handler

use axum::extract::State;
use axum::Json;

use crate::application::SensorReading;
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::slots::ParkingAppState;

use super::dto::*;

#[utoipa::path(
    post,
    path = "/api/v1/sensors/readings",
    tag = "Sensors",
    request_body = SensorReadingsRequest,
    responses(
        (status = 200, description = "Readings applied", body = ApiResponse<SensorIngestResponse>),
        (status = 422, description = "Empty batch")
    )
)]
pub async fn ingest_readings(
    State(state): State<ParkingAppState>,
    ValidatedJson(request): ValidatedJson<SensorReadingsRequest>,
) -> ApiResult<SensorIngestResponse> {
    let readings: Vec<SensorReading> = request.readings.into_iter().map(Into::into).collect();
    let occupied = state
        .parking
        .ingest_sensor_readings(&readings)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(SensorIngestResponse { occupied })))
}
