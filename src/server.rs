//! Server runtime
//!
//! [`ServerHandle`] owns the whole process lifecycle: database, migrations,
//! service wiring, background overstay scan, REST API and graceful
//! shutdown. The CLI binary is a thin wrapper around it.

use std::sync::{Arc, OnceLock};
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::services::{
    LoggingReceiptSender, OverstayConfig, OverstayMonitor, PaymentProcessor, ReceiptDispatcher,
    SpaceService, TariffResolver, TransactionLifecycleManager, TransactionQueries,
};
use crate::config::AppConfig;
use crate::domain::{LifecycleStore, RepositoryProvider};
use crate::infrastructure::{
    init_database, run_migrations, seed_demo_data, DatabaseConfig, SeaOrmLifecycleStore,
    SeaOrmRepositoryProvider,
};
use crate::interfaces::http::{create_api_router, ApiState};
use crate::shared::{RetryPolicy, ShutdownCoordinator, ShutdownSignal};

pub type StartupError = Box<dyn std::error::Error + Send + Sync>;

pub struct ServerOptions {
    pub config: AppConfig,
    /// Apply pending migrations before serving
    pub auto_migrate: bool,
    /// Insert the demo parking when the database is empty
    pub seed_demo: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            seed_demo: false,
        }
    }
}

/// The global recorder can be installed once per process; later starts
/// reuse the first handle.
fn prometheus_handle() -> Result<PrometheusHandle, StartupError> {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    if let Some(handle) = HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("Prometheus recorder installed");
    Ok(HANDLE.get_or_init(|| handle).clone())
}

/// A running parking service.
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub repos: Arc<dyn RepositoryProvider>,
    pub config: AppConfig,
    pub api_port: u16,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    overstay_task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, StartupError> {
        let cfg = opts.config;
        cfg.validate()?;
        info!(
            policy = cfg.parking.payment_policy.as_str(),
            rounding = cfg.parking.rounding.as_str(),
            currency = %cfg.parking.default_currency,
            "Starting smart parking service"
        );

        let prometheus = prometheus_handle()?;

        // ── Database ───────────────────────────────────────────
        let db = init_database(&DatabaseConfig {
            url: cfg.database.url.clone(),
        })
        .await?;
        if opts.auto_migrate {
            run_migrations(&db).await?;
        }
        if opts.seed_demo || cfg.seed.demo_data {
            if seed_demo_data(&db, &cfg.parking.default_currency).await? {
                info!("Demo parking seeded");
            }
        }

        // ── Services ───────────────────────────────────────────
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let store: Arc<dyn LifecycleStore> = Arc::new(SeaOrmLifecycleStore::new(db.clone()));
        let event_bus = create_event_bus();

        let tariffs = Arc::new(TariffResolver::new(
            repos.clone(),
            cfg.parking.rounding,
            cfg.parking.default_currency.clone(),
        ));
        let lifecycle = Arc::new(TransactionLifecycleManager::new(
            repos.clone(),
            store.clone(),
            tariffs.clone(),
            event_bus.clone(),
            cfg.parking.default_currency.clone(),
        ));
        let mut payments = PaymentProcessor::new(
            repos.clone(),
            store,
            event_bus.clone(),
            cfg.parking.payment_policy,
        );
        if cfg.receipts.enabled {
            payments = payments.with_receipts(Arc::new(ReceiptDispatcher::new(
                repos.clone(),
                Arc::new(LoggingReceiptSender),
                event_bus.clone(),
                RetryPolicy::default().with_max_attempts(cfg.receipts.max_attempts),
            )));
        }
        let payments = Arc::new(payments);
        let queries = Arc::new(TransactionQueries::new(
            repos.clone(),
            tariffs.clone(),
            cfg.parking.max_recommended_minutes,
        ));
        let spaces = Arc::new(SpaceService::new(repos.clone()));

        let shutdown = ShutdownCoordinator::new(cfg.server.shutdown_timeout);

        // ── Background tasks ───────────────────────────────────
        let overstay_task = if cfg.overstay.enabled {
            let monitor = Arc::new(OverstayMonitor::new(
                repos.clone(),
                event_bus.clone(),
                OverstayConfig {
                    check_interval_secs: cfg.overstay.check_interval_secs,
                    max_recommended_minutes: cfg.parking.max_recommended_minutes,
                },
            ));
            Some(monitor.start(shutdown.signal()))
        } else {
            info!("Overstay monitor disabled");
            None
        };

        // ── REST API ───────────────────────────────────────────
        let router = create_api_router(ApiState {
            lifecycle,
            payments,
            queries,
            spaces,
            tariffs,
            event_bus: event_bus.clone(),
            db: db.clone(),
            started_at: Arc::new(Instant::now()),
            prometheus,
        });

        let addr = cfg.server.address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let api_port = listener.local_addr()?.port();
        info!("REST API listening on http://{}", addr);
        info!("Swagger UI at http://{}/docs/", addr);

        let api_shutdown = shutdown.signal();
        let api_task = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { api_shutdown.wait().await })
                .await;
            if let Err(e) = served {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            event_bus,
            repos,
            config: cfg,
            api_port,
            db,
            shutdown,
            api_task,
            overstay_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// SIGINT / SIGTERM trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Waits for the API and background tasks, bounded by the configured
    /// shutdown timeout, then closes the database.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            overstay_task,
            ..
        } = self;
        let timeout = shutdown.timeout();
        let drained = tokio::time::timeout(timeout, async move {
            if let Err(e) = api_task.await {
                error!("REST API task panicked: {}", e);
            }
            if let Some(task) = overstay_task {
                if let Err(e) = task.await {
                    error!("Overstay monitor panicked: {}", e);
                }
            }
        })
        .await;
        if drained.is_err() {
            warn!(timeout_secs = timeout.as_secs(), "Shutdown timed out, abandoning tasks");
        }

        if let Err(e) = db.close().await {
            warn!("Error closing database connection: {}", e);
        }
        info!("Smart parking service stopped");
    }

    pub async fn shutdown(self) {
        info!("Shutting down");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured
/// level.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.logging.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
