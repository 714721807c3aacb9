//! Route table, shared state and Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::common::{ApiResponse, PaginationParams};
use super::modules::{
    health::{self, HealthState},
    metrics::{self, MetricsState},
    payments::{self, PaymentAppState},
    request_id::assign_request_id,
    spaces::{self, SpaceAppState},
    tariffs::{self, TariffAppState},
    transactions::{self, TransactionAppState},
};
use crate::application::events::SharedEventBus;
use crate::application::services::{
    PaymentProcessor, SpaceService, TariffResolver, TransactionLifecycleManager,
    TransactionQueries,
};
use crate::interfaces::ws::{stream_notifications, NotificationState};

/// Everything the handlers need. Each module extracts its own slice via
/// `FromRef`, so handlers keep narrow `State<T>` types.
#[derive(Clone)]
pub struct ApiState {
    pub lifecycle: Arc<TransactionLifecycleManager>,
    pub payments: Arc<PaymentProcessor>,
    pub queries: Arc<TransactionQueries>,
    pub spaces: Arc<SpaceService>,
    pub tariffs: Arc<TariffResolver>,
    pub event_bus: SharedEventBus,
    pub db: DatabaseConnection,
    pub started_at: Arc<Instant>,
    pub prometheus: PrometheusHandle,
}

impl FromRef<ApiState> for TransactionAppState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            lifecycle: Arc::clone(&s.lifecycle),
            payments: Arc::clone(&s.payments),
            queries: Arc::clone(&s.queries),
        }
    }
}

impl FromRef<ApiState> for PaymentAppState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            payments: Arc::clone(&s.payments),
        }
    }
}

impl FromRef<ApiState> for SpaceAppState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            spaces: Arc::clone(&s.spaces),
        }
    }
}

impl FromRef<ApiState> for TariffAppState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            tariffs: Arc::clone(&s.tariffs),
        }
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            db: s.db.clone(),
            queries: Arc::clone(&s.queries),
            tariffs: Arc::clone(&s.tariffs),
            payments: Arc::clone(&s.payments),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ApiState> for MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            handle: s.prometheus.clone(),
        }
    }
}

impl FromRef<ApiState> for NotificationState {
    fn from_ref(s: &ApiState) -> Self {
        Self {
            event_bus: s.event_bus.clone(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        transactions::register_entry,
        transactions::register_exit,
        transactions::register_exit_by_plate,
        transactions::register_payment,
        transactions::cancel_transaction,
        transactions::list_transactions,
        transactions::get_transaction,
        transactions::list_active,
        transactions::list_overdue,
        transactions::get_active_by_plate,
        payments::refund_payment,
        spaces::list_spaces,
        spaces::get_space,
        spaces::set_space_status,
        tariffs::preview_tariff,
    ),
    components(
        schemas(
            ApiResponse<String>,
            PaginationParams,
            health::HealthResponse,
            health::DatabaseHealth,
            health::BillingSettings,
            transactions::EntryRequest,
            transactions::ExitRequest,
            transactions::ExitByPlateRequest,
            transactions::CancelRequest,
            transactions::PaymentRequest,
            transactions::TransactionDto,
            transactions::ReceiptDto,
            transactions::ActiveStayDto,
            transactions::SettledPaymentDto,
            payments::PaymentDto,
            payments::RefundDto,
            payments::RefundRequest,
            spaces::SpaceDto,
            spaces::SpaceStatusRequest,
            tariffs::TariffPreviewRequest,
            tariffs::TariffQuoteDto,
            tariffs::TariffLineDto,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and database reachability"),
        (name = "Transactions", description = "Vehicle entry, exit, cancellation, payment and stay queries"),
        (name = "Payments", description = "Refunds of settled payments"),
        (name = "Spaces", description = "Space status and operator toggles"),
        (name = "Tariffs", description = "Shift-based price previews"),
    ),
    info(
        title = "Smart Parking Transaction API",
        version = "1.0.0",
        description = "Parking stay lifecycle: admission, tariff resolution, exit validation and payment settlement",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

pub fn create_api_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::render_metrics))
        // Transactions; static segments win over `{id}`
        .route("/api/v1/transactions", get(transactions::list_transactions))
        .route("/api/v1/transactions/entry", post(transactions::register_entry))
        .route("/api/v1/transactions/exit", post(transactions::register_exit_by_plate))
        .route("/api/v1/transactions/active", get(transactions::list_active))
        .route("/api/v1/transactions/active/overdue", get(transactions::list_overdue))
        .route(
            "/api/v1/transactions/active/plate/{plate}",
            get(transactions::get_active_by_plate),
        )
        .route("/api/v1/transactions/{id}", get(transactions::get_transaction))
        .route("/api/v1/transactions/{id}/exit", post(transactions::register_exit))
        .route("/api/v1/transactions/{id}/payment", post(transactions::register_payment))
        .route("/api/v1/transactions/{id}/cancel", post(transactions::cancel_transaction))
        // Payments
        .route("/api/v1/payments/{id}/refund", post(payments::refund_payment))
        // Spaces
        .route("/api/v1/spaces", get(spaces::list_spaces))
        .route("/api/v1/spaces/{id}", get(spaces::get_space))
        .route("/api/v1/spaces/{id}/status", put(spaces::set_space_status))
        // Tariffs
        .route("/api/v1/tariffs/preview", post(tariffs::preview_tariff))
        // Live events
        .route("/api/v1/notifications/ws", get(stream_notifications))
        .with_state(state);

    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(api)
        .layer(middleware::from_fn(metrics::track_http_metrics))
        .layer(middleware::from_fn(assign_request_id))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
