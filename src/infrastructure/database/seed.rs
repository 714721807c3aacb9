//! Demo data seeder
//!
//! Inserts one parking with a zone, ten spaces, three shifts covering the
//! whole day and their rate assignments. Runs only on an empty database.

use chrono::{NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, Set, TransactionTrait,
};
use tracing::info;

use super::entities::{parking, rate, shift, shift_rate_assignment, space, zone};

const DEMO_SPACES: usize = 10;

/// `(code, name, start, end, hourly cents)`
const DEMO_SHIFTS: [(&str, &str, (u32, u32), (u32, u32), i64); 3] = [
    ("MORNING", "Morning", (6, 0), (14, 0), 500),
    ("AFTERNOON", "Afternoon", (14, 0), (22, 0), 600),
    ("NIGHT", "Night", (22, 0), (6, 0), 300),
];

fn hm(h: u32, m: u32) -> Result<NaiveTime, DbErr> {
    NaiveTime::from_hms_opt(h, m, 0).ok_or_else(|| DbErr::Custom(format!("bad time {h}:{m}")))
}

/// Seed demo data. Returns `true` when rows were inserted.
pub async fn seed_demo_data(db: &DatabaseConnection, currency: &str) -> Result<bool, DbErr> {
    if parking::Entity::find().count(db).await? > 0 {
        return Ok(false);
    }

    info!("Seeding demo parking data...");
    let now = Utc::now();
    let txn = db.begin().await?;

    let demo_parking = parking::ActiveModel {
        id: NotSet,
        name: Set("Central Parking".to_string()),
        status: Set("ACTIVE".to_string()),
        opens_at: Set(None),
        closes_at: Set(None),
        utc_offset_minutes: Set(-300),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    let demo_zone = zone::ActiveModel {
        id: NotSet,
        parking_id: Set(demo_parking.id),
        name: Set("Zone A".to_string()),
        status: Set("ACTIVE".to_string()),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    for n in 1..=DEMO_SPACES {
        space::ActiveModel {
            id: NotSet,
            zone_id: Set(demo_zone.id),
            code: Set(format!("A-{:02}", n)),
            status: Set("AVAILABLE".to_string()),
            version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    for (code, name, start, end, cents) in DEMO_SHIFTS {
        let demo_shift = shift::ActiveModel {
            id: NotSet,
            parking_id: Set(None),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            start_time: Set(hm(start.0, start.1)?),
            end_time: Set(hm(end.0, end.1)?),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let demo_rate = rate::ActiveModel {
            id: NotSet,
            name: Set(format!("{} hourly", name)),
            amount_cents: Set(cents),
            currency: Set(currency.to_string()),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        shift_rate_assignment::ActiveModel {
            id: NotSet,
            parking_id: Set(demo_parking.id),
            shift_id: Set(demo_shift.id),
            rate_id: Set(demo_rate.id),
            is_active: Set(true),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;
    info!(
        "Demo data seeded: parking {} with {} spaces",
        demo_parking.id, DEMO_SPACES
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::migrator::Migrator;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    #[tokio::test]
    async fn seeds_once() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        assert!(seed_demo_data(&db, "PEN").await.unwrap());
        assert!(!seed_demo_data(&db, "PEN").await.unwrap());

        assert_eq!(space::Entity::find().count(&db).await.unwrap(), 10);
        assert_eq!(
            shift_rate_assignment::Entity::find().count(&db).await.unwrap(),
            3
        );
    }
}
