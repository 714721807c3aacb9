//! SeaORM implementation of TariffRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use super::db_err;
use crate::domain::tariff::{AssignedRate, Shift, TariffRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::{rate, shift, shift_rate_assignment};
use crate::shared::money::from_minor_units;

pub struct SeaOrmTariffRepository {
    db: DatabaseConnection,
}

impl SeaOrmTariffRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn shift_to_domain(m: shift::Model) -> Shift {
    Shift {
        id: m.id,
        code: m.code,
        name: m.name,
        start_time: m.start_time,
        end_time: m.end_time,
    }
}

#[async_trait]
impl TariffRepository for SeaOrmTariffRepository {
    async fn list_shifts(&self, parking_id: i32) -> DomainResult<Vec<Shift>> {
        let models = shift::Entity::find()
            .filter(shift::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(shift::Column::ParkingId.is_null())
                    .add(shift::Column::ParkingId.eq(parking_id)),
            )
            .order_by_asc(shift::Column::StartTime)
            .order_by_asc(shift::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        debug!("Loaded {} shifts for parking {}", models.len(), parking_id);
        Ok(models.into_iter().map(shift_to_domain).collect())
    }

    async fn shift_rate_assignment(
        &self,
        parking_id: i32,
        shift_id: i32,
    ) -> DomainResult<Option<AssignedRate>> {
        let found = shift_rate_assignment::Entity::find()
            .filter(shift_rate_assignment::Column::ParkingId.eq(parking_id))
            .filter(shift_rate_assignment::Column::ShiftId.eq(shift_id))
            .filter(shift_rate_assignment::Column::IsActive.eq(true))
            .find_also_related(rate::Entity)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(match found {
            Some((_, Some(rate))) if rate.is_active => Some(AssignedRate {
                rate_id: rate.id,
                hourly_amount: from_minor_units(rate.amount_cents),
                currency: rate.currency,
            }),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_db;
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn lists_active_shifts_in_start_order() {
        let db = fixture_db().await;
        let repo = SeaOrmTariffRepository::new(db);
        let shifts = repo.list_shifts(1).await.unwrap();
        let codes: Vec<_> = shifts.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["DAY", "NIGHT"]);
    }

    #[tokio::test]
    async fn resolves_assignment_with_rate() {
        let db = fixture_db().await;
        let repo = SeaOrmTariffRepository::new(db);
        let day = repo.shift_rate_assignment(1, 1).await.unwrap().unwrap();
        assert_eq!(day.hourly_amount, Decimal::new(200, 2));
        assert_eq!(day.currency, "PEN");
        assert!(repo.shift_rate_assignment(2, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn inactive_rate_is_not_an_assignment() {
        let db = fixture_db().await;
        let rate = rate::Entity::find_by_id(1).one(&db).await.unwrap().unwrap();
        let mut active: rate::ActiveModel = rate.into();
        active.is_active = Set(false);
        active.update(&db).await.unwrap();

        let repo = SeaOrmTariffRepository::new(db);
        assert!(repo.shift_rate_assignment(1, 1).await.unwrap().is_none());
    }
}
