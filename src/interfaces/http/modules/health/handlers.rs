//! Liveness and readiness

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::services::{PaymentProcessor, TariffResolver, TransactionQueries};

#[derive(Clone)]
pub struct HealthState {
    pub db: DatabaseConnection,
    pub queries: Arc<TransactionQueries>,
    pub tariffs: Arc<TariffResolver>,
    pub payments: Arc<PaymentProcessor>,
    pub started_at: Arc<Instant>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `degraded`
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: DatabaseHealth,
    /// Stays currently ACTIVE; absent when the store is unreachable
    pub vehicles_inside: Option<usize>,
    pub billing: BillingSettings,
}

/// Pricing rules in effect for this process
#[derive(Debug, Serialize, ToSchema)]
pub struct BillingSettings {
    /// `per_minute` or `per_started_hour`
    pub rounding: String,
    /// `minimum` or `exact`
    pub payment_policy: String,
    pub max_recommended_minutes: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseHealth {
    pub reachable: bool,
    pub latency_ms: Option<u64>,
}

async fn ping(db: &DatabaseConnection) -> DatabaseHealth {
    let started = Instant::now();
    let probe = Statement::from_string(db.get_database_backend(), "SELECT 1".to_string());
    match db.execute(probe).await {
        Ok(_) => DatabaseHealth {
            reachable: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!(error = %e, "Health probe could not reach the database");
            DatabaseHealth {
                reachable: false,
                latency_ms: None,
            }
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Database reachable", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = ping(&state.db).await;
    let vehicles_inside = if database.reachable {
        state.queries.count_active().await.ok()
    } else {
        None
    };

    let (code, status) = if database.reachable {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            database,
            vehicles_inside,
            billing: BillingSettings {
                rounding: state.tariffs.rounding().as_str().to_string(),
                payment_policy: state.payments.policy().as_str().to_string(),
                max_recommended_minutes: state.queries.max_recommended_minutes(),
            },
        }),
    )
}
