//! Overstay Monitor Service
//!
//! Periodically scans ACTIVE stays and announces the ones that exceed the
//! recommended maximum. Read-only: it never changes a transaction.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{info, warn};

use crate::application::events::{Event, OverstayDetectedEvent, SharedEventBus};
use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::ShutdownSignal;

#[derive(Debug, Clone)]
pub struct OverstayConfig {
    pub check_interval_secs: u64,
    pub max_recommended_minutes: i64,
}

impl Default for OverstayConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 60,
            max_recommended_minutes: 480,
        }
    }
}

pub struct OverstayMonitor {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
    config: OverstayConfig,
    /// transaction id → when it was flagged
    flagged: DashMap<i32, DateTime<Utc>>,
}

impl OverstayMonitor {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        events: SharedEventBus,
        config: OverstayConfig,
    ) -> Self {
        Self {
            repos,
            events,
            config,
            flagged: DashMap::new(),
        }
    }

    /// Start the background scan; stops when `shutdown` fires.
    pub fn start(self: Arc<Self>, shutdown: ShutdownSignal) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "⏱️ Overstay monitor started (interval: {}s, limit: {} min)",
                self.config.check_interval_secs, self.config.max_recommended_minutes
            );
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.check_interval_secs.max(1)));

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.scan_once(Utc::now()).await {
                            warn!("Overstay scan error: {}", e);
                        }
                    }
                    _ = shutdown.wait() => {
                        info!("⏱️ Overstay monitor shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// One pass. Returns the ids newly flagged in this pass.
    pub async fn scan_once(&self, now: DateTime<Utc>) -> DomainResult<Vec<i32>> {
        let active = self.repos.transactions().list_active(None).await?;
        let active_ids: HashSet<i32> = active.iter().map(|t| t.id).collect();
        self.flagged.retain(|id, _| active_ids.contains(id));

        let mut newly_flagged = Vec::new();
        for tx in active {
            let elapsed = tx.elapsed_minutes(now);
            if elapsed <= self.config.max_recommended_minutes || self.flagged.contains_key(&tx.id) {
                continue;
            }
            self.flagged.insert(tx.id, now);
            newly_flagged.push(tx.id);

            warn!(
                transaction_id = tx.id,
                plate = %tx.plate_number,
                elapsed_minutes = elapsed,
                "Vehicle exceeded recommended stay"
            );
            self.events
                .publish(Event::OverstayDetected(OverstayDetectedEvent {
                    transaction_id: tx.id,
                    zone_id: tx.zone_id,
                    plate_number: tx.plate_number.clone(),
                    elapsed_minutes: elapsed,
                    limit_minutes: self.config.max_recommended_minutes,
                    timestamp: now,
                }));
        }
        Ok(newly_flagged)
    }

    pub fn flagged_count(&self) -> usize {
        self.flagged.len()
    }
}
