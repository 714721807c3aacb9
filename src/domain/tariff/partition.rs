//! Clock-walking partition of a stay into shift sub-intervals.
//!
//! Walks the facility's wall clock from entry to exit. At each step the
//! covering shift is the first one (by start time, then id) whose window
//! contains the current time of day; the step ends at the next shift
//! boundary or at the end of the stay. Adjacent steps in the same shift
//! are merged, so every segment is maximal.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, Utc};

use super::model::Shift;

/// A maximal sub-interval `[starts_at, ends_at)` within one shift
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftSegment {
    pub shift_id: i32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl ShiftSegment {
    pub fn seconds(&self) -> i64 {
        (self.ends_at - self.starts_at).num_seconds()
    }
}

/// No shift covers the facility clock at `at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncoveredInstant {
    pub at: DateTime<Utc>,
    pub local_time: NaiveTime,
}

pub fn partition_stay(
    shifts: &[Shift],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<Vec<ShiftSegment>, UncoveredInstant> {
    let mut ordered: Vec<&Shift> = shifts.iter().collect();
    ordered.sort_by_key(|s| (s.start_time, s.id));

    let mut boundaries: Vec<NaiveTime> = shifts
        .iter()
        .flat_map(|s| [s.start_time, s.end_time])
        .collect();
    boundaries.sort();
    boundaries.dedup();

    let mut segments: Vec<ShiftSegment> = Vec::new();
    let mut cursor = from;

    while cursor < to {
        let local = cursor.with_timezone(&offset).naive_local();
        let shift = ordered
            .iter()
            .find(|s| s.contains(local.time()))
            .ok_or(UncoveredInstant {
                at: cursor,
                local_time: local.time(),
            })?;

        let step = next_boundary(local, &boundaries)
            .map(|next| next - local)
            .unwrap_or_else(|| Duration::days(1));
        let end = (cursor + step).min(to);

        match segments.last_mut() {
            Some(last) if last.shift_id == shift.id && last.ends_at == cursor => {
                last.ends_at = end;
            }
            _ => segments.push(ShiftSegment {
                shift_id: shift.id,
                starts_at: cursor,
                ends_at: end,
            }),
        }
        cursor = end;
    }

    Ok(segments)
}

/// Earliest occurrence of any boundary strictly after `local`.
fn next_boundary(local: NaiveDateTime, boundaries: &[NaiveTime]) -> Option<NaiveDateTime> {
    boundaries
        .iter()
        .map(|b| {
            let today = local.date().and_time(*b);
            if today > local {
                today
            } else {
                today + Duration::days(1)
            }
        })
        .min()
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn shift(id: i32, code: &str, start: NaiveTime, end: NaiveTime) -> Shift {
        Shift {
            id,
            code: code.into(),
            name: code.into(),
            start_time: start,
            end_time: end,
        }
    }

    fn three_shifts() -> Vec<Shift> {
        vec![
            shift(1, "MORNING", t(6, 0), t(14, 0)),
            shift(2, "AFTERNOON", t(14, 0), t(22, 0)),
            shift(3, "NIGHT", t(22, 0), t(6, 0)),
        ]
    }

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn stay_within_one_shift_is_one_segment() {
        let segs = partition_stay(&three_shifts(), at(1, 8, 0), at(1, 9, 30), utc()).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].shift_id, 1);
        assert_eq!(segs[0].seconds(), 90 * 60);
    }

    #[test]
    fn stay_spanning_two_shifts_splits_at_boundary() {
        let segs = partition_stay(&three_shifts(), at(1, 13, 0), at(1, 15, 0), utc()).unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].shift_id, 1);
        assert_eq!(segs[0].ends_at, at(1, 14, 0));
        assert_eq!(segs[1].shift_id, 2);
        assert_eq!(segs[1].starts_at, at(1, 14, 0));
    }

    #[test]
    fn overnight_stay_walks_the_clock() {
        let segs = partition_stay(&three_shifts(), at(1, 21, 0), at(2, 7, 0), utc()).unwrap();
        let ids: Vec<i32> = segs.iter().map(|s| s.shift_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(segs[1].starts_at, at(1, 22, 0));
        assert_eq!(segs[1].ends_at, at(2, 6, 0));
        assert_eq!(segs[1].seconds(), 8 * 3600);
    }

    #[test]
    fn multi_day_stay_revisits_shifts() {
        let segs = partition_stay(&three_shifts(), at(1, 6, 0), at(2, 6, 0), utc()).unwrap();
        let ids: Vec<i32> = segs.iter().map(|s| s.shift_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let total: i64 = segs.iter().map(|s| s.seconds()).sum();
        assert_eq!(total, 24 * 3600);
    }

    #[test]
    fn single_full_day_shift_merges_across_midnight() {
        let shifts = vec![shift(9, "ALL_DAY", t(0, 0), t(0, 0))];
        let segs = partition_stay(&shifts, at(1, 20, 0), at(3, 4, 0), utc()).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].seconds(), 32 * 3600);
    }

    #[test]
    fn gap_between_shifts_is_reported() {
        let shifts = vec![
            shift(1, "MORNING", t(6, 0), t(14, 0)),
            shift(2, "AFTERNOON", t(15, 0), t(22, 0)),
        ];
        let err = partition_stay(&shifts, at(1, 13, 0), at(1, 16, 0), utc()).unwrap_err();
        assert_eq!(err.at, at(1, 14, 0));
        assert_eq!(err.local_time, t(14, 0));
    }

    #[test]
    fn no_shifts_at_all_is_uncovered() {
        let err = partition_stay(&[], at(1, 8, 0), at(1, 9, 0), utc()).unwrap_err();
        assert_eq!(err.at, at(1, 8, 0));
    }

    #[test]
    fn overlapping_shifts_prefer_earliest_start() {
        let shifts = vec![
            shift(1, "EARLY", t(6, 0), t(14, 0)),
            shift(2, "PROMO", t(12, 0), t(13, 0)),
        ];
        let segs = partition_stay(&shifts, at(1, 11, 0), at(1, 13, 30), utc()).unwrap();
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].shift_id, 1);
    }

    #[test]
    fn facility_offset_moves_boundaries() {
        // UTC-5: local 13:00 is 18:00 UTC, the 14:00 boundary is 19:00 UTC
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let segs = partition_stay(&three_shifts(), at(1, 18, 0), at(1, 20, 0), offset).unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].ends_at, at(1, 19, 0));
    }

    #[test]
    fn empty_interval_has_no_segments() {
        let segs = partition_stay(&three_shifts(), at(1, 8, 0), at(1, 8, 0), utc()).unwrap();
        assert!(segs.is_empty());
    }
}
