//! Tariff resolution
//!
//! Splits a stay into per-shift sub-intervals on the facility's local
//! clock and prices each at the rate assigned to that shift.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::domain::tariff::model::duration_minutes;
use crate::domain::tariff::{partition_stay, AssignedRate, RoundingPolicy, TariffLine, TariffQuote};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

pub struct TariffResolver {
    repos: Arc<dyn RepositoryProvider>,
    rounding: RoundingPolicy,
    default_currency: String,
}

impl TariffResolver {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        rounding: RoundingPolicy,
        default_currency: impl Into<String>,
    ) -> Self {
        Self {
            repos,
            rounding,
            default_currency: default_currency.into(),
        }
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// Price a stay from `entry` to `exit`. The billed window is
    /// `[entry, entry + duration_minutes)`, so the charged time always
    /// equals the reported duration.
    pub async fn quote_stay(
        &self,
        parking_id: i32,
        entry: DateTime<Utc>,
        exit: DateTime<Utc>,
    ) -> DomainResult<TariffQuote> {
        let minutes = duration_minutes(entry, exit);
        self.resolve(parking_id, entry, entry + Duration::minutes(minutes))
            .await
    }

    /// Price the half-open interval `[from, to)`.
    pub async fn resolve(
        &self,
        parking_id: i32,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<TariffQuote> {
        if to < from {
            return Err(DomainError::Validation(
                "tariff interval ends before it starts".into(),
            ));
        }

        let parking = self
            .repos
            .facilities()
            .find_parking(parking_id)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "Parking",
                field: "id",
                value: parking_id.to_string(),
            })?;

        let shifts = self.repos.tariffs().list_shifts(parking_id).await?;
        let segments = partition_stay(&shifts, from, to, parking.offset()).map_err(|gap| {
            DomainError::NoShiftCoverage {
                parking_id,
                at: format!("{} (local {})", gap.at.to_rfc3339(), gap.local_time.format("%H:%M")),
            }
        })?;

        let mut rates: HashMap<i32, AssignedRate> = HashMap::new();
        let mut lines = Vec::with_capacity(segments.len());
        for segment in segments {
            let rate = match rates.get(&segment.shift_id) {
                Some(rate) => rate.clone(),
                None => {
                    let rate = self
                        .repos
                        .tariffs()
                        .shift_rate_assignment(parking_id, segment.shift_id)
                        .await?
                        .ok_or(DomainError::TariffNotConfigured {
                            parking_id,
                            shift_id: segment.shift_id,
                        })?;
                    rates.insert(segment.shift_id, rate.clone());
                    rate
                }
            };

            let shift_code = shifts
                .iter()
                .find(|s| s.id == segment.shift_id)
                .map(|s| s.code.clone())
                .unwrap_or_default();
            let seconds = segment.seconds();
            lines.push(TariffLine {
                shift_id: segment.shift_id,
                shift_code,
                rate_id: rate.rate_id,
                hourly_amount: rate.hourly_amount,
                starts_at: segment.starts_at,
                ends_at: segment.ends_at,
                seconds,
                billed_hours: self.rounding.billable_hours(seconds),
                amount: self.rounding.charge(seconds, rate.hourly_amount),
            });
        }

        let currency = single_currency(rates.values(), &self.default_currency)?;
        let amount = TariffQuote::total_of(&lines);
        let billable_minutes = ((to - from).num_seconds() + 59) / 60;

        debug!(
            parking_id,
            segments = lines.len(),
            billable_minutes,
            %amount,
            "Tariff resolved"
        );

        Ok(TariffQuote {
            parking_id,
            billable_minutes,
            lines,
            amount,
            currency,
            rounding: self.rounding,
        })
    }
}

fn single_currency<'a>(
    rates: impl Iterator<Item = &'a AssignedRate>,
    default: &str,
) -> DomainResult<String> {
    let mut currency: Option<&str> = None;
    for rate in rates {
        match currency {
            None => currency = Some(rate.currency.as_str()),
            Some(c) if c == rate.currency => {}
            Some(c) => {
                return Err(DomainError::Validation(format!(
                    "rates for one stay mix currencies {} and {}",
                    c, rate.currency
                )))
            }
        }
    }
    Ok(currency.unwrap_or(default).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::entities::shift_rate_assignment;
    use crate::infrastructure::SeaOrmRepositoryProvider;
    use crate::test_support::{at, fixture_db, on};
    use rust_decimal::Decimal;
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    async fn resolver(rounding: RoundingPolicy) -> (TariffResolver, sea_orm::DatabaseConnection) {
        let db = fixture_db().await;
        let repos = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        (TariffResolver::new(repos, rounding, "PEN"), db)
    }

    #[tokio::test]
    async fn ninety_minutes_in_day_shift() {
        let (resolver, _db) = resolver(RoundingPolicy::PerMinute).await;
        let quote = resolver.quote_stay(1, at(8, 0), at(9, 30)).await.unwrap();
        assert_eq!(quote.billable_minutes, 90);
        assert_eq!(quote.lines.len(), 1);
        assert_eq!(quote.amount, Decimal::new(300, 2));
        assert_eq!(quote.currency, "PEN");
        assert_eq!(quote.rate_ids(), vec![1]);
    }

    #[tokio::test]
    async fn stay_across_shift_boundary_is_split() {
        let (resolver, _db) = resolver(RoundingPolicy::PerMinute).await;
        // 17:00–19:00: one hour day (2.00) + one hour night (1.00)
        let quote = resolver.quote_stay(1, at(17, 0), at(19, 0)).await.unwrap();
        assert_eq!(quote.lines.len(), 2);
        assert_eq!(quote.lines[0].shift_code, "DAY");
        assert_eq!(quote.lines[1].shift_code, "NIGHT");
        assert_eq!(quote.amount, Decimal::new(300, 2));
        assert_eq!(quote.rate_ids(), vec![1, 2]);
    }

    #[tokio::test]
    async fn overnight_multi_day_stay() {
        let (resolver, _db) = resolver(RoundingPolicy::PerMinute).await;
        // 2024-03-01 20:00 → 2024-03-02 08:00: 10h night + 2h day
        let quote = resolver
            .quote_stay(1, on(1, 20, 0), on(2, 8, 0))
            .await
            .unwrap();
        assert_eq!(quote.amount, Decimal::new(1400, 2));
        let total_seconds: i64 = quote.lines.iter().map(|l| l.seconds).sum();
        assert_eq!(total_seconds, 12 * 3600);
    }

    #[tokio::test]
    async fn short_stay_bills_at_least_one_minute() {
        let (resolver, _db) = resolver(RoundingPolicy::PerMinute).await;
        let quote = resolver.quote_stay(1, at(8, 0), at(8, 0)).await.unwrap();
        assert_eq!(quote.billable_minutes, 1);
        // 1 minute at 2.00/h = 0.0333… → 0.03
        assert_eq!(quote.amount, Decimal::new(3, 2));
    }

    #[tokio::test]
    async fn per_started_hour_policy() {
        let (resolver, _db) = resolver(RoundingPolicy::PerStartedHour).await;
        let quote = resolver.quote_stay(1, at(8, 0), at(9, 30)).await.unwrap();
        assert_eq!(quote.amount, Decimal::new(400, 2));
    }

    #[tokio::test]
    async fn missing_assignment_names_the_pair() {
        let (resolver, db) = resolver(RoundingPolicy::PerMinute).await;
        shift_rate_assignment::Entity::delete_many()
            .filter(shift_rate_assignment::Column::ShiftId.eq(2))
            .exec(&db)
            .await
            .unwrap();

        let err = resolver.quote_stay(1, at(17, 0), at(19, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::TariffNotConfigured {
                parking_id: 1,
                shift_id: 2
            }
        ));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn unknown_parking_is_not_found() {
        let (resolver, _db) = resolver(RoundingPolicy::PerMinute).await;
        let err = resolver.quote_stay(99, at(8, 0), at(9, 0)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }
}
