//! Facility domain entities

use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc};

use crate::shared::errors::TransitionRejected;

/// Lifecycle flag of reference-data records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(Self::Active),
            "INACTIVE" => Some(Self::Inactive),
            _ => None,
        }
    }
}

/// A parking facility
#[derive(Debug, Clone)]
pub struct Parking {
    pub id: i32,
    pub name: String,
    pub status: RecordStatus,
    /// Opening time (local). `None` together with `closes_at` means 24h.
    pub opens_at: Option<NaiveTime>,
    pub closes_at: Option<NaiveTime>,
    /// Fixed offset of the facility's wall clock from UTC, in minutes.
    pub utc_offset_minutes: i32,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Parking {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Local wall-clock time of the facility at `at`.
    pub fn local_time(&self, at: DateTime<Utc>) -> NaiveTime {
        at.with_timezone(&self.offset()).time()
    }

    /// Whether `at` falls within the opening hours. Hours may wrap
    /// midnight (e.g. 18:00–02:00).
    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        match (self.opens_at, self.closes_at) {
            (Some(open), Some(close)) => {
                let t = self.local_time(at);
                if open == close {
                    true
                } else if open < close {
                    t >= open && t < close
                } else {
                    t >= open || t < close
                }
            }
            _ => true,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.status == RecordStatus::Active && self.deleted_at.is_none()
    }
}

/// A subdivision of a parking
#[derive(Debug, Clone)]
pub struct Zone {
    pub id: i32,
    pub parking_id: i32,
    pub name: String,
    pub status: RecordStatus,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Zone {
    /// `Ok(())` when vehicles may be admitted into this zone at `at`,
    /// otherwise the reason it is closed.
    pub fn check_operational(&self, parking: &Parking, at: DateTime<Utc>) -> Result<(), String> {
        if self.deleted_at.is_some() || self.status != RecordStatus::Active {
            return Err(format!("zone '{}' is inactive", self.name));
        }
        if !parking.is_usable() {
            return Err(format!("parking '{}' is inactive", parking.name));
        }
        if !parking.is_open_at(at) {
            return Err(format!(
                "parking '{}' is closed at {}",
                parking.name,
                parking.local_time(at).format("%H:%M")
            ));
        }
        Ok(())
    }
}

/// Occupancy state of a space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceStatus {
    Available,
    Occupied,
    Maintenance,
    OutOfService,
}

/// Moves a space can make
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpaceEvent {
    /// Vehicle admitted (lifecycle engine only)
    Allocate,
    /// Vehicle left or stay cancelled (lifecycle engine only)
    Release,
    /// Operator toggle to AVAILABLE, MAINTENANCE or OUT_OF_SERVICE
    Operator(SpaceStatus),
}

impl SpaceEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allocate => "ALLOCATE",
            Self::Release => "RELEASE",
            Self::Operator(SpaceStatus::Available) => "OPERATOR_AVAILABLE",
            Self::Operator(SpaceStatus::Maintenance) => "OPERATOR_MAINTENANCE",
            Self::Operator(SpaceStatus::OutOfService) => "OPERATOR_OUT_OF_SERVICE",
            Self::Operator(SpaceStatus::Occupied) => "OPERATOR_OCCUPIED",
        }
    }
}

impl SpaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Occupied => "OCCUPIED",
            Self::Maintenance => "MAINTENANCE",
            Self::OutOfService => "OUT_OF_SERVICE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(Self::Available),
            "OCCUPIED" => Some(Self::Occupied),
            "MAINTENANCE" => Some(Self::Maintenance),
            "OUT_OF_SERVICE" => Some(Self::OutOfService),
            _ => None,
        }
    }

    /// Exhaustive transition function. AVAILABLE ⇄ OCCUPIED belongs to
    /// the lifecycle engine; the other states are operator-driven and
    /// never reachable from OCCUPIED.
    pub fn apply(self, event: SpaceEvent) -> Result<SpaceStatus, TransitionRejected> {
        use SpaceStatus::*;
        match (self, event) {
            (Available, SpaceEvent::Allocate) => Ok(Occupied),
            (Occupied, SpaceEvent::Release) => Ok(Available),
            (Available | Maintenance | OutOfService, SpaceEvent::Operator(target))
                if target != Occupied && target != self =>
            {
                Ok(target)
            }
            (from, event) => Err(TransitionRejected::new("space", from.as_str(), event.as_str())),
        }
    }
}

/// A single stall within a zone
#[derive(Debug, Clone)]
pub struct Space {
    pub id: i32,
    pub zone_id: i32,
    pub code: String,
    pub status: SpaceStatus,
    /// Bumped on every status change; used for conditional updates.
    pub version: i32,
}

impl Space {
    pub fn is_available(&self) -> bool {
        self.status == SpaceStatus::Available
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parking(opens: Option<(u32, u32)>, closes: Option<(u32, u32)>) -> Parking {
        Parking {
            id: 1,
            name: "Central".into(),
            status: RecordStatus::Active,
            opens_at: opens.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
            closes_at: closes.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
            utc_offset_minutes: 0,
            deleted_at: None,
        }
    }

    fn zone() -> Zone {
        Zone {
            id: 1,
            parking_id: 1,
            name: "A".into(),
            status: RecordStatus::Active,
            deleted_at: None,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn parking_without_hours_is_always_open() {
        let p = parking(None, None);
        assert!(p.is_open_at(at(3, 0)));
        assert!(p.is_open_at(at(23, 59)));
    }

    #[test]
    fn daytime_hours() {
        let p = parking(Some((6, 0)), Some((22, 0)));
        assert!(p.is_open_at(at(6, 0)));
        assert!(p.is_open_at(at(21, 59)));
        assert!(!p.is_open_at(at(22, 0)));
        assert!(!p.is_open_at(at(2, 0)));
    }

    #[test]
    fn hours_wrapping_midnight() {
        let p = parking(Some((18, 0)), Some((2, 0)));
        assert!(p.is_open_at(at(23, 0)));
        assert!(p.is_open_at(at(1, 59)));
        assert!(!p.is_open_at(at(12, 0)));
    }

    #[test]
    fn local_offset_is_applied() {
        let mut p = parking(Some((6, 0)), Some((22, 0)));
        p.utc_offset_minutes = -300;
        // 04:00 UTC is 23:00 local (UTC-5)
        assert!(!p.is_open_at(at(4, 0)));
        // 12:00 UTC is 07:00 local
        assert!(p.is_open_at(at(12, 0)));
    }

    #[test]
    fn inactive_zone_is_not_operational() {
        let mut z = zone();
        z.status = RecordStatus::Inactive;
        assert!(z.check_operational(&parking(None, None), at(10, 0)).is_err());
    }

    #[test]
    fn deleted_parking_is_not_operational() {
        let mut p = parking(None, None);
        p.deleted_at = Some(at(0, 0));
        let err = zone().check_operational(&p, at(10, 0)).unwrap_err();
        assert!(err.contains("inactive"));
    }

    #[test]
    fn closed_parking_reports_local_time() {
        let p = parking(Some((6, 0)), Some((22, 0)));
        let err = zone().check_operational(&p, at(23, 30)).unwrap_err();
        assert!(err.contains("23:30"));
    }

    #[test]
    fn allocation_and_release() {
        assert_eq!(
            SpaceStatus::Available.apply(SpaceEvent::Allocate),
            Ok(SpaceStatus::Occupied)
        );
        assert_eq!(
            SpaceStatus::Occupied.apply(SpaceEvent::Release),
            Ok(SpaceStatus::Available)
        );
        assert!(SpaceStatus::Occupied.apply(SpaceEvent::Allocate).is_err());
        assert!(SpaceStatus::Maintenance.apply(SpaceEvent::Allocate).is_err());
        assert!(SpaceStatus::Available.apply(SpaceEvent::Release).is_err());
    }

    #[test]
    fn operator_toggles() {
        use SpaceStatus::*;
        assert_eq!(
            Available.apply(SpaceEvent::Operator(Maintenance)),
            Ok(Maintenance)
        );
        assert_eq!(
            Maintenance.apply(SpaceEvent::Operator(OutOfService)),
            Ok(OutOfService)
        );
        assert_eq!(
            OutOfService.apply(SpaceEvent::Operator(Available)),
            Ok(Available)
        );
        assert!(Occupied.apply(SpaceEvent::Operator(Maintenance)).is_err());
        assert!(Available.apply(SpaceEvent::Operator(Occupied)).is_err());
        assert!(Available.apply(SpaceEvent::Operator(Available)).is_err());
    }

    #[test]
    fn space_status_roundtrip() {
        for s in [
            SpaceStatus::Available,
            SpaceStatus::Occupied,
            SpaceStatus::Maintenance,
            SpaceStatus::OutOfService,
        ] {
            assert_eq!(SpaceStatus::from_str(s.as_str()), Some(s));
        }
        assert!(SpaceStatus::from_str("BROKEN").is_none());
    }
}
