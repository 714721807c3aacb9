//! Read-side views over transactions

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use super::tariff_resolver::TariffResolver;
use super::transaction_lifecycle::not_found;
use crate::domain::customer::normalize_plate;
use crate::domain::transaction::{Transaction, TransactionFilter};
use crate::domain::{DomainResult, RepositoryProvider};
use crate::shared::{PageRequest, PaginatedResult};

/// An ACTIVE stay with its live figures
#[derive(Debug, Clone)]
pub struct ActiveStay {
    pub transaction: Transaction,
    pub elapsed_minutes: i64,
    /// Amount due if the vehicle left now; `None` when the tariff
    /// configuration cannot price the stay.
    pub estimated_amount: Option<Decimal>,
    pub overdue: bool,
}

pub struct TransactionQueries {
    repos: Arc<dyn RepositoryProvider>,
    tariffs: Arc<TariffResolver>,
    max_recommended_minutes: i64,
}

impl TransactionQueries {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        tariffs: Arc<TariffResolver>,
        max_recommended_minutes: i64,
    ) -> Self {
        Self {
            repos,
            tariffs,
            max_recommended_minutes,
        }
    }

    pub fn max_recommended_minutes(&self) -> i64 {
        self.max_recommended_minutes
    }

    pub async fn get(&self, id: i32) -> DomainResult<Transaction> {
        self.repos
            .transactions()
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found("Transaction", id))
    }

    pub async fn list(
        &self,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Transaction>> {
        self.repos.transactions().list(filter, page).await
    }

    pub async fn active_by_plate(&self, plate: &str) -> DomainResult<Option<Transaction>> {
        let plate = normalize_plate(plate)?;
        self.repos.transactions().find_active_by_plate(&plate).await
    }

    pub async fn count_active(&self) -> DomainResult<usize> {
        Ok(self.repos.transactions().list_active(None).await?.len())
    }

    pub async fn active(&self, zone_id: Option<i32>) -> DomainResult<Vec<ActiveStay>> {
        self.active_at(zone_id, Utc::now()).await
    }

    pub async fn active_at(
        &self,
        zone_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<ActiveStay>> {
        let transactions = self.repos.transactions().list_active(zone_id).await?;
        let mut stays = Vec::with_capacity(transactions.len());
        for tx in transactions {
            stays.push(self.live_view(tx, now).await?);
        }
        Ok(stays)
    }

    pub async fn overdue(&self, zone_id: Option<i32>) -> DomainResult<Vec<ActiveStay>> {
        self.overdue_at(zone_id, Utc::now()).await
    }

    pub async fn overdue_at(
        &self,
        zone_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<ActiveStay>> {
        let stays = self.active_at(zone_id, now).await?;
        Ok(stays.into_iter().filter(|s| s.overdue).collect())
    }

    async fn live_view(&self, tx: Transaction, now: DateTime<Utc>) -> DomainResult<ActiveStay> {
        let elapsed_minutes = tx.elapsed_minutes(now);
        let estimated_amount = match self
            .tariffs
            .quote_stay(tx.parking_id, tx.entry_time, now.max(tx.entry_time))
            .await
        {
            Ok(quote) => Some(quote.amount),
            Err(e) if e.is_configuration() => {
                debug!(transaction_id = tx.id, "No live estimate: {}", e);
                None
            }
            Err(e) => return Err(e),
        };
        Ok(ActiveStay {
            overdue: elapsed_minutes > self.max_recommended_minutes,
            elapsed_minutes,
            estimated_amount,
            transaction: tx,
        })
    }
}
