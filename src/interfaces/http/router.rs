//! API router and OpenAPI document

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::application::ParkingService;

use super::common::{ApiResponse, EmptyData};
use super::modules::health::{self, HealthState};
use super::modules::metrics::{self, http_metrics_middleware, MetricsState};
use super::modules::slots::{self, ParkingAppState};
use super::modules::{history, sensors};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::handlers::health_check,
        // Slots
        slots::handlers::list_slots,
        slots::handlers::get_slot,
        slots::handlers::reserve_slot,
        slots::handlers::cancel_reservation,
        slots::handlers::begin_occupancy,
        slots::handlers::pay_bill,
        slots::handlers::reset_slot,
        slots::handlers::reset_all_slots,
        slots::handlers::quote_reservation,
        // Sensors
        sensors::handlers::ingest_readings,
        // History
        history::handlers::list_history,
        history::handlers::list_pending,
        history::handlers::revenue,
        history::handlers::mark_paid,
        history::handlers::clear_history,
    ),
    components(
        schemas(
            ApiResponse<EmptyData>,
            EmptyData,
            health::HealthResponse,
            health::ComponentHealth,
            slots::SlotDto,
            slots::ReserveSlotRequest,
            slots::ReserveSlotResponse,
            slots::CancelReservationRequest,
            slots::CancelReservationResponse,
            slots::PayBillRequest,
            slots::BillDto,
            slots::ResetSlotResponse,
            slots::ResetAllResponse,
            slots::QuoteResponse,
            sensors::SensorReadingDto,
            sensors::SensorReadingsRequest,
            sensors::SensorIngestResponse,
            history::HistoryRecordDto,
            history::RevenueDto,
            history::ClearHistoryResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and storage probe"),
        (name = "Slots", description = "Reserve, occupy, bill and reset parking slots"),
        (name = "Sensors", description = "Occupancy sensor feed"),
        (name = "History", description = "Completed sessions, payments and revenue"),
    ),
    info(
        title = "Smart Parking API",
        version = "1.0.0",
        description = "Parking slot lifecycle, billing and session history"
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Parking routes under `/api/v1`
pub fn parking_routes(parking: Arc<ParkingService>) -> Router {
    Router::new()
        .route("/api/v1/slots", get(slots::list_slots))
        .route("/api/v1/slots/reserve", post(slots::reserve_slot))
        .route("/api/v1/slots/cancel", post(slots::cancel_reservation))
        .route("/api/v1/slots/reset", post(slots::reset_all_slots))
        .route("/api/v1/slots/{slot_id}", get(slots::get_slot))
        .route("/api/v1/slots/{slot_id}/occupy", post(slots::begin_occupancy))
        .route("/api/v1/slots/{slot_id}/pay-bill", post(slots::pay_bill))
        .route("/api/v1/slots/{slot_id}/reset", post(slots::reset_slot))
        .route("/api/v1/reservations/quote", get(slots::quote_reservation))
        .route("/api/v1/sensors/readings", post(sensors::ingest_readings))
        .route(
            "/api/v1/history",
            get(history::list_history).delete(history::clear_history),
        )
        .route("/api/v1/history/pending", get(history::list_pending))
        .route("/api/v1/history/revenue", get(history::revenue))
        .route("/api/v1/history/{history_id}/mark-paid", post(history::mark_paid))
        .with_state(ParkingAppState { parking })
}

/// Create the API router with all routes
pub fn create_api_router(
    parking: Arc<ParkingService>,
    prometheus_handle: PrometheusHandle,
) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(HealthState {
            parking: parking.clone(),
            started_at: Arc::new(Instant::now()),
        });

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::prometheus_metrics))
        .with_state(MetricsState {
            handle: prometheus_handle,
        });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(parking_routes(parking))
        .merge(health_routes)
        .merge(metrics_routes)
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::create_event_bus;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::time::FixedClock;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use std::str::FromStr;
    use tower::ServiceExt;

    const T0: i64 = 1_700_000_000;

    async fn app() -> (Router, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(T0));
        let parking = Arc::new(ParkingService::new(
            Arc::new(InMemoryRepositoryProvider::new()),
            create_event_bus(),
            clock.clone(),
        ));
        parking.provision(&[1, 2, 3, 4]).await.unwrap();
        let handle = PrometheusBuilder::new().build_recorder().handle();
        (create_api_router(parking, handle), clock)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn money(v: &Value) -> Decimal {
        Decimal::from_str(v.as_str().unwrap()).unwrap()
    }

    fn reserve_body(slot_id: i32, email: &str) -> Value {
        json!({
            "slot_id": slot_id,
            "vehicle_number": "KA01AB1234",
            "user_email": email,
            "user_phone": "+15550100",
            "duration_hours": 2
        })
    }

    fn contact_body() -> Value {
        json!({
            "vehicle_number": "KA01AB1234",
            "user_email": "driver@example.com",
            "user_phone": "+15550100"
        })
    }

    #[tokio::test]
    async fn health_reports_slot_count() {
        let (app, _) = app().await;
        let (status, body) = call(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["slots"], 4);
    }

    #[tokio::test]
    async fn reservation_flow_maps_errors_to_statuses() {
        let (app, _) = app().await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/slots/reserve",
            Some(reserve_body(4, "driver@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["slot"]["state"], "RESERVED");
        assert_eq!(money(&body["data"]["reservation_charge"]), Decimal::from(230));

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/slots/reserve",
            Some(reserve_body(4, "other@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/slots/cancel",
            Some(json!({"slot_id": 4, "confirm_email": "wrong@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/slots/cancel",
            Some(json!({"slot_id": 4, "confirm_email": "driver@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["outcome"], "FREED");
        assert!(body["data"]["bill"].is_null());
    }

    #[tokio::test]
    async fn reserve_rejects_bad_input() {
        let (app, _) = app().await;

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/slots/reserve",
            Some(reserve_body(1, "not-an-email")),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let mut past = reserve_body(1, "driver@example.com");
        past["arrival_time"] = json!(T0 - 60);
        let (status, _) = call(&app, "POST", "/api/v1/slots/reserve", Some(past)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/slots/reserve",
            Some(reserve_body(99, "driver@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn out_of_range_durations_and_limits_are_handled() {
        let (app, _) = app().await;

        let mut huge = reserve_body(1, "driver@example.com");
        huge["duration_hours"] = json!("100000000000000000000000000");
        let (status, _) = call(&app, "POST", "/api/v1/slots/reserve", Some(huge)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = call(
            &app,
            "GET",
            "/api/v1/reservations/quote?duration_hours=100000000000000000000000000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, "GET", "/api/v1/slots", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["state"], "AVAILABLE");

        let (status, body) = call(
            &app,
            "GET",
            "/api/v1/history?limit=18446744073709551615",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn billing_and_payment_flow() {
        let (app, clock) = app().await;

        let (status, _) = call(&app, "POST", "/api/v1/slots/2/occupy", None).await;
        assert_eq!(status, StatusCode::OK);
        clock.advance(95);

        let (status, body) =
            call(&app, "POST", "/api/v1/slots/2/pay-bill", Some(contact_body())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["duration_minutes"], 1);
        assert_eq!(money(&body["data"]["total_amount"]), Decimal::from(130));
        let history_id = body["data"]["history_id"].as_i64().unwrap();

        let (status, _) =
            call(&app, "POST", "/api/v1/slots/2/pay-bill", Some(contact_body())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(&app, "GET", "/api/v1/history/pending", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let uri = format!("/api/v1/history/{}/mark-paid", history_id);
        let (status, body) = call(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["payment_status"], "PAID");
        let (status, _) = call(&app, "POST", &uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(&app, "GET", "/api/v1/history/revenue", None).await;
        assert_eq!(money(&body["data"]["total_revenue"]), Decimal::from(130));
        assert_eq!(body["data"]["total_sessions"], 1);

        let (_, body) = call(&app, "DELETE", "/api/v1/history", None).await;
        assert_eq!(body["data"]["removed"], 1);
        let (_, body) = call(&app, "GET", "/api/v1/history?limit=50", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let (status, _) = call(&app, "POST", "/api/v1/history/999/mark-paid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn sensors_reset_and_quote() {
        let (app, _) = app().await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/sensors/readings",
            Some(json!({"readings": [
                {"slot_id": 1, "occupied": true},
                {"slot_id": 2, "occupied": false},
                {"slot_id": 77, "occupied": true}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["occupied"], 1);

        let (_, body) = call(&app, "GET", "/api/v1/slots/1", None).await;
        assert_eq!(body["data"]["state"], "OCCUPIED");
        assert_eq!(body["data"]["entry_time"], T0);

        let (_, body) = call(&app, "POST", "/api/v1/slots/reset", None).await;
        assert_eq!(body["data"]["reset"], 1);
        let (_, body) = call(&app, "GET", "/api/v1/slots", None).await;
        assert!(body["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["state"] == "AVAILABLE"));

        let (status, body) = call(
            &app,
            "GET",
            "/api/v1/reservations/quote?duration_hours=1.5",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(money(&body["data"]["reservation_charge"]), Decimal::from(180));
    }

    #[tokio::test]
    async fn docs_and_metrics_are_served() {
        let (app, _) = app().await;
        let (status, body) = call(&app, "GET", "/api-docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/slots/reserve"].is_object());

        let resp = app
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
