//! SeaORM implementation of FacilityRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use super::db_err;
use crate::domain::facility::{
    FacilityRepository, Parking, RecordStatus, Space, SpaceStatus, Zone,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{parking, space, zone};

pub struct SeaOrmFacilityRepository {
    db: DatabaseConnection,
}

impl SeaOrmFacilityRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn record_status(s: &str) -> DomainResult<RecordStatus> {
    RecordStatus::from_str(s)
        .ok_or_else(|| DomainError::Database(format!("unknown record status '{}'", s)))
}

fn parking_to_domain(m: parking::Model) -> DomainResult<Parking> {
    Ok(Parking {
        id: m.id,
        name: m.name,
        status: record_status(&m.status)?,
        opens_at: m.opens_at,
        closes_at: m.closes_at,
        utc_offset_minutes: m.utc_offset_minutes,
        deleted_at: m.deleted_at,
    })
}

fn zone_to_domain(m: zone::Model) -> DomainResult<Zone> {
    Ok(Zone {
        id: m.id,
        parking_id: m.parking_id,
        name: m.name,
        status: record_status(&m.status)?,
        deleted_at: m.deleted_at,
    })
}

pub(crate) fn space_to_domain(m: space::Model) -> DomainResult<Space> {
    let status = SpaceStatus::from_str(&m.status)
        .ok_or_else(|| DomainError::Database(format!("unknown space status '{}'", m.status)))?;
    Ok(Space {
        id: m.id,
        zone_id: m.zone_id,
        code: m.code,
        status,
        version: m.version,
    })
}

// ── Shared queries (pool or open transaction) ───────────────────

pub(crate) async fn load_space<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> DomainResult<Option<Space>> {
    space::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err)?
        .map(space_to_domain)
        .transpose()
}

/// Conditional status change: succeeds only when the row still has
/// `from` status (and `version`, when given). Bumps the version.
pub(crate) async fn transition_space<C: ConnectionTrait>(
    conn: &C,
    id: i32,
    from: SpaceStatus,
    version: Option<i32>,
    to: SpaceStatus,
    at: DateTime<Utc>,
) -> DomainResult<bool> {
    let mut query = space::Entity::update_many()
        .col_expr(space::Column::Status, Expr::value(to.as_str()))
        .col_expr(
            space::Column::Version,
            Expr::col(space::Column::Version).add(1),
        )
        .col_expr(space::Column::UpdatedAt, Expr::value(at))
        .filter(space::Column::Id.eq(id))
        .filter(space::Column::Status.eq(from.as_str()));
    if let Some(version) = version {
        query = query.filter(space::Column::Version.eq(version));
    }
    let result = query.exec(conn).await.map_err(db_err)?;
    Ok(result.rows_affected == 1)
}

// ── FacilityRepository impl ─────────────────────────────────────

#[async_trait]
impl FacilityRepository for SeaOrmFacilityRepository {
    async fn find_parking(&self, id: i32) -> DomainResult<Option<Parking>> {
        parking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(parking_to_domain)
            .transpose()
    }

    async fn find_zone(&self, id: i32) -> DomainResult<Option<Zone>> {
        zone::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(zone_to_domain)
            .transpose()
    }

    async fn find_space(&self, id: i32) -> DomainResult<Option<Space>> {
        load_space(&self.db, id).await
    }

    async fn list_spaces(&self, zone_id: i32) -> DomainResult<Vec<Space>> {
        let models = space::Entity::find()
            .filter(space::Column::ZoneId.eq(zone_id))
            .order_by_asc(space::Column::Code)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(space_to_domain).collect()
    }

    async fn set_space_status(&self, space: &Space, target: SpaceStatus) -> DomainResult<bool> {
        debug!(
            "Setting space {} status {} -> {} (version {})",
            space.id,
            space.status.as_str(),
            target.as_str(),
            space.version
        );
        transition_space(
            &self.db,
            space.id,
            space.status,
            Some(space.version),
            target,
            Utc::now(),
        )
        .await
    }
}
