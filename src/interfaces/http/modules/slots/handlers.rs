//! Slot HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::application::{ParkingService, ReserveCommand};
use crate::domain::ContactInfo;
use crate::interfaces::http::common::{domain_error, ApiResponse, ApiResult, ValidatedJson};

use super::dto::*;

/// Shared state for every parking route
#[derive(Clone)]
pub struct ParkingAppState {
    pub parking: Arc<ParkingService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/slots",
    tag = "Slots",
    responses(
        (status = 200, description = "All slots, lapsed reservations released", body = ApiResponse<Vec<SlotDto>>)
    )
)]
pub async fn list_slots(State(state): State<ParkingAppState>) -> ApiResult<Vec<SlotDto>> {
    let slots = state.parking.list_slots().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(
        slots.iter().map(SlotDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/{slot_id}",
    tag = "Slots",
    params(("slot_id" = i32, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Slot", body = ApiResponse<SlotDto>),
        (status = 404, description = "Unknown slot")
    )
)]
pub async fn get_slot(
    State(state): State<ParkingAppState>,
    Path(slot_id): Path<i32>,
) -> ApiResult<SlotDto> {
    let slot = state.parking.get_slot(slot_id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(SlotDto::from(&slot))))
}

#[utoipa::path(
    post,
    path = "/api/v1/slots/reserve",
    tag = "Slots",
    request_body = ReserveSlotRequest,
    responses(
        (status = 200, description = "Slot reserved", body = ApiResponse<ReserveSlotResponse>),
        (status = 400, description = "Arrival in the past or bad duration"),
        (status = 404, description = "Unknown slot"),
        (status = 409, description = "Slot not available"),
        (status = 422, description = "Invalid contact details")
    )
)]
pub async fn reserve_slot(
    State(state): State<ParkingAppState>,
    ValidatedJson(request): ValidatedJson<ReserveSlotRequest>,
) -> ApiResult<ReserveSlotResponse> {
    let cmd = ReserveCommand {
        slot_id: request.slot_id,
        contact: ContactInfo::new(request.vehicle_number, request.user_email, request.user_phone),
        arrival_time: request.arrival_time,
        duration_hours: request.duration_hours,
    };
    let reservation = state.parking.reserve(cmd).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(reservation.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/slots/cancel",
    tag = "Slots",
    request_body = CancelReservationRequest,
    responses(
        (status = 200, description = "Reservation cancelled", body = ApiResponse<CancelReservationResponse>),
        (status = 403, description = "Email does not match the reservation"),
        (status = 409, description = "Slot not reserved")
    )
)]
pub async fn cancel_reservation(
    State(state): State<ParkingAppState>,
    ValidatedJson(request): ValidatedJson<CancelReservationRequest>,
) -> ApiResult<CancelReservationResponse> {
    let outcome = state
        .parking
        .cancel_reservation(request.slot_id, &request.confirm_email)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/slots/{slot_id}/occupy",
    tag = "Slots",
    params(("slot_id" = i32, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Occupancy started", body = ApiResponse<SlotDto>),
        (status = 404, description = "Unknown slot"),
        (status = 409, description = "Slot already occupied")
    )
)]
pub async fn begin_occupancy(
    State(state): State<ParkingAppState>,
    Path(slot_id): Path<i32>,
) -> ApiResult<SlotDto> {
    let slot = state
        .parking
        .begin_occupancy(slot_id)
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(SlotDto::from(&slot))))
}

#[utoipa::path(
    post,
    path = "/api/v1/slots/{slot_id}/pay-bill",
    tag = "Slots",
    params(("slot_id" = i32, Path, description = "Slot ID")),
    request_body = PayBillRequest,
    responses(
        (status = 200, description = "Bill generated, slot freed", body = ApiResponse<BillDto>),
        (status = 404, description = "Unknown slot"),
        (status = 409, description = "Slot not occupied")
    )
)]
pub async fn pay_bill(
    State(state): State<ParkingAppState>,
    Path(slot_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<PayBillRequest>,
) -> ApiResult<BillDto> {
    let settlement = state
        .parking
        .pay_bill(slot_id, request.into())
        .await
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(BillDto::from(&settlement))))
}

#[utoipa::path(
    post,
    path = "/api/v1/slots/{slot_id}/reset",
    tag = "Slots",
    params(("slot_id" = i32, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Slot forced to AVAILABLE", body = ApiResponse<ResetSlotResponse>),
        (status = 404, description = "Unknown slot")
    )
)]
pub async fn reset_slot(
    State(state): State<ParkingAppState>,
    Path(slot_id): Path<i32>,
) -> ApiResult<ResetSlotResponse> {
    let previous = state.parking.reset_slot(slot_id).await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ResetSlotResponse::new(
        slot_id, previous,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/slots/reset",
    tag = "Slots",
    responses(
        (status = 200, description = "Every slot forced to AVAILABLE", body = ApiResponse<ResetAllResponse>)
    )
)]
pub async fn reset_all_slots(State(state): State<ParkingAppState>) -> ApiResult<ResetAllResponse> {
    let reset = state.parking.reset_all_slots().await.map_err(domain_error)?;
    Ok(Json(ApiResponse::success(ResetAllResponse { reset })))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/quote",
    tag = "Slots",
    params(QuoteQuery),
    responses(
        (status = 200, description = "Reservation charge", body = ApiResponse<QuoteResponse>),
        (status = 400, description = "Negative duration")
    )
)]
pub async fn quote_reservation(
    State(state): State<ParkingAppState>,
    Query(query): Query<QuoteQuery>,
) -> ApiResult<QuoteResponse> {
    let reservation_charge = state
        .parking
        .quote_reservation(query.duration_hours)
        .map_err(domain_error)?;
    Ok(Json(ApiResponse::success(QuoteResponse {
        duration_hours: query.duration_hours,
        reservation_charge,
    })))
}
