//! Shared fixtures for database-backed tests
//!
//! One parking (24h, UTC), zone 1 with spaces 10, 11 and 12, a DAY shift
//! 06:00–18:00 at 2.00 PEN/h and a NIGHT shift 18:00–06:00 at 1.00 PEN/h.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use metrics_exporter_prometheus::PrometheusBuilder;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::services::{
    LoggingReceiptSender, OverstayConfig, OverstayMonitor, PaymentProcessor, ReceiptDispatcher,
    ReceiptSender, SpaceService, TariffResolver, TransactionLifecycleManager, TransactionQueries,
};
use crate::domain::payment::PaymentPolicy;
use crate::domain::{LifecycleStore, RepositoryProvider};
use crate::domain::tariff::RoundingPolicy;
use crate::infrastructure::database::entities::{
    parking, rate, shift, shift_rate_assignment, space, zone,
};
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{SeaOrmLifecycleStore, SeaOrmRepositoryProvider};
use crate::interfaces::http::ApiState;
use crate::shared::RetryPolicy;

pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    on(1, h, m)
}

pub fn on(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, h, m, 0).unwrap()
}

fn hm(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

pub async fn fixture_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let now = at(0, 0);

    parking::ActiveModel {
        id: Set(1),
        name: Set("Central".into()),
        status: Set("ACTIVE".into()),
        opens_at: Set(None),
        closes_at: Set(None),
        utc_offset_minutes: Set(0),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    zone::ActiveModel {
        id: Set(1),
        parking_id: Set(1),
        name: Set("Zone A".into()),
        status: Set("ACTIVE".into()),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&db)
    .await
    .unwrap();

    for id in [10, 11, 12] {
        space::ActiveModel {
            id: Set(id),
            zone_id: Set(1),
            code: Set(format!("A-{}", id)),
            status: Set("AVAILABLE".into()),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    for (id, code, start, end, cents) in [(1, "DAY", 6, 18, 200), (2, "NIGHT", 18, 6, 100)] {
        shift::ActiveModel {
            id: Set(id),
            parking_id: Set(Some(1)),
            code: Set(code.into()),
            name: Set(code.to_lowercase()),
            start_time: Set(hm(start)),
            end_time: Set(hm(end)),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();

        rate::ActiveModel {
            id: Set(id),
            name: Set(format!("{} rate", code)),
            amount_cents: Set(cents),
            currency: Set("PEN".into()),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();

        shift_rate_assignment::ActiveModel {
            id: Set(id),
            parking_id: Set(1),
            shift_id: Set(id),
            rate_id: Set(id),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();
    }

    db
}

/// Fully wired services over the fixture database.
pub struct TestServices {
    pub db: DatabaseConnection,
    pub events: SharedEventBus,
    pub lifecycle: TransactionLifecycleManager,
    pub payments: PaymentProcessor,
    pub queries: TransactionQueries,
    pub spaces: SpaceService,
    pub tariffs: Arc<TariffResolver>,
    pub overstay: OverstayMonitor,
}

impl TestServices {
    pub async fn new(policy: PaymentPolicy) -> Self {
        Self::with_sender(policy, Arc::new(LoggingReceiptSender)).await
    }

    pub async fn with_sender(policy: PaymentPolicy, sender: Arc<dyn ReceiptSender>) -> Self {
        let db = fixture_db().await;
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let store: Arc<dyn LifecycleStore> = Arc::new(SeaOrmLifecycleStore::new(db.clone()));
        let events = create_event_bus();
        let tariffs = Arc::new(TariffResolver::new(
            repos.clone(),
            RoundingPolicy::PerMinute,
            "PEN",
        ));
        let receipts = Arc::new(ReceiptDispatcher::new(
            repos.clone(),
            sender,
            events.clone(),
            RetryPolicy {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                multiplier: 2,
                max_delay: Duration::from_millis(2),
            },
        ));

        Self {
            lifecycle: TransactionLifecycleManager::new(
                repos.clone(),
                store.clone(),
                tariffs.clone(),
                events.clone(),
                "PEN",
            ),
            payments: PaymentProcessor::new(repos.clone(), store, events.clone(), policy)
                .with_receipts(receipts),
            queries: TransactionQueries::new(repos.clone(), tariffs.clone(), 480),
            tariffs,
            spaces: SpaceService::new(repos.clone()),
            overstay: OverstayMonitor::new(
                repos,
                events.clone(),
                OverstayConfig {
                    check_interval_secs: 60,
                    max_recommended_minutes: 480,
                },
            ),
            events,
            db,
        }
    }

    /// HTTP state over these services, with a private metrics recorder.
    pub fn into_api_state(self) -> ApiState {
        ApiState {
            lifecycle: Arc::new(self.lifecycle),
            payments: Arc::new(self.payments),
            queries: Arc::new(self.queries),
            spaces: Arc::new(self.spaces),
            tariffs: self.tariffs,
            event_bus: self.events,
            db: self.db,
            started_at: Arc::new(Instant::now()),
            prometheus: PrometheusBuilder::new().build_recorder().handle(),
        }
    }
}
