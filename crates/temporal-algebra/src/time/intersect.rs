//! Intersection of two times.

use crate::error::Result;
use crate::flags::{Flags, RangePadding};
use crate::ops::TemporalOp;
use crate::partial::Partial;
use crate::temporal::Temporal;

use super::{CompositeTime, Slot, Time, TimeKind};

impl Time {
    /// The time satisfying both `self` and `other`.
    ///
    /// Partial values merge their fields; a partial and a slot value (a
    /// season, the weekend, a part of the day) become a composite. Grounded
    /// values intersect their spans. `Ok(None)` when the two cannot both
    /// hold; a pair that cannot be decided yet is kept as a deferred
    /// intersection.
    pub fn intersect(&self, other: &Time) -> Result<Option<Time>> {
        let composite =
            |c: Option<CompositeTime>| c.map(|c| self.with_kind(TimeKind::Composite(c)));
        Ok(match (self.kind(), other.kind()) {
            (TimeKind::Reference, _) => Some(other.clone()),
            (_, TimeKind::Reference) => Some(self.clone()),

            (TimeKind::Partial(a), TimeKind::Partial(b)) => {
                if a.is_compatible(b)? {
                    Some(self.with_partial(a.combine(b)?))
                } else {
                    None
                }
            }
            (TimeKind::Grounded(dt), TimeKind::Partial(p))
            | (TimeKind::Partial(p), TimeKind::Grounded(dt)) => {
                let fields: Vec<_> = p.field_types().collect();
                let view = Partial::from_instant(*dt, &fields).with_chronology(p.chronology());
                view.is_compatible(p)?.then(|| Time::grounded(*dt))
            }
            (TimeKind::Grounded(a), TimeKind::Grounded(b)) => (a == b).then(|| self.clone()),

            (TimeKind::WithRange(a), TimeKind::WithRange(b))
                if a.is_grounded() && b.is_grounded() =>
            {
                a.intersect(b).map(Time::with_range)
            }

            (TimeKind::Composite(a), TimeKind::Composite(b)) => composite(a.merge(b)?),
            (TimeKind::Composite(c), TimeKind::Partial(p))
            | (TimeKind::Partial(p), TimeKind::Composite(c)) => {
                if c.base().is_compatible(p)? {
                    composite(Some(c.with_base(c.base().combine(p)?)))
                } else {
                    None
                }
            }
            (TimeKind::Composite(c), TimeKind::WithRange(_)) if Slot::of(other).is_some() => {
                composite(c.with_slot(other))
            }
            (TimeKind::WithRange(_), TimeKind::Composite(c)) if Slot::of(self).is_some() => {
                composite(c.with_slot(self))
            }
            (TimeKind::Partial(p), TimeKind::WithRange(_)) if Slot::of(other).is_some() => {
                composite(CompositeTime::new(p.clone()).with_slot(other))
            }
            (TimeKind::WithRange(_), TimeKind::Partial(p)) if Slot::of(self).is_some() => {
                composite(CompositeTime::new(p.clone()).with_slot(self))
            }
            (TimeKind::WithRange(_), TimeKind::WithRange(_))
                if Slot::of(self).is_some() && Slot::of(other).is_some() =>
            {
                composite(
                    CompositeTime::new(Partial::new())
                        .with_slot(self)
                        .and_then(|c| c.with_slot(other)),
                )
            }

            _ if self.is_grounded() && other.is_grounded() => {
                match (self.range(RangePadding::Auto), other.range(RangePadding::Auto)) {
                    (Some(a), Some(b)) => a.intersect(&b).map(Time::with_range),
                    _ => None,
                }
            }
            _ => Some(Time::relative(
                self.clone(),
                TemporalOp::Intersect,
                Some(Temporal::Time(other.clone())),
                Flags::NONE,
            )),
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemporalError;
    use crate::field::FieldType;
    use crate::partial::Chronology;
    use crate::range::Range;
    use crate::temporal::{StandardTemporalType, TemporalValue};
    use chrono::NaiveDate;

    fn p(fields: &[(FieldType, i32)]) -> Time {
        Time::partial(Partial::from_fields(fields).unwrap())
    }

    fn summer() -> Time {
        Time::with_range(Range::new(
            Some(p(&[(FieldType::MonthOfYear, 6), (FieldType::DayOfMonth, 21)])),
            Some(p(&[(FieldType::MonthOfYear, 9), (FieldType::DayOfMonth, 21)])),
            None,
        ))
        .with_standard_type(StandardTemporalType::SeasonOfYear)
        .with_label("SU")
    }

    #[test]
    fn test_partial_merge() {
        let june = p(&[(FieldType::MonthOfYear, 6)]);
        let year = p(&[(FieldType::Year, 2016)]);
        let both = june.intersect(&year).unwrap().unwrap();
        assert_eq!(both.timex_value().unwrap(), "2016-06");
    }

    #[test]
    fn test_incompatible_partials() {
        let june = p(&[(FieldType::MonthOfYear, 6)]);
        let july = p(&[(FieldType::MonthOfYear, 7)]);
        assert_eq!(june.intersect(&july).unwrap(), None);
        let q3 = p(&[(FieldType::Quarter, 3)]);
        assert_eq!(june.intersect(&q3).unwrap(), None);
    }

    #[test]
    fn test_grounded_against_partial() {
        let dt = NaiveDate::from_ymd_opt(2016, 6, 19).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let sunday = p(&[(FieldType::DayOfWeek, 7)]);
        let at = Time::grounded(dt);
        assert_eq!(at.intersect(&sunday).unwrap(), Some(at.clone()));
        let monday = p(&[(FieldType::DayOfWeek, 1)]);
        assert_eq!(at.intersect(&monday).unwrap(), None);
    }

    #[test]
    fn test_year_and_season_make_composite() {
        let year = p(&[(FieldType::Year, 2016)]);
        let both = year.intersect(&summer()).unwrap().unwrap();
        assert!(matches!(both.kind(), TimeKind::Composite(_)));
        assert_eq!(both.timex_value().unwrap(), "2016-SU");
    }

    #[test]
    fn test_two_slots_make_composite() {
        let named = |name: &str| crate::constants::lookup(name).and_then(Temporal::as_time).unwrap();
        let both = named("weekend").intersect(named("morning")).unwrap().unwrap();
        let TimeKind::Composite(c) = both.kind() else {
            panic!("expected a composite, got {both}");
        };
        assert!(c.base().is_empty());
        assert_eq!(both.timex_value().unwrap(), "XXXX-WXX-WETMO");
    }

    #[test]
    fn test_chronology_mismatch_fails() {
        let iso = p(&[(FieldType::MonthOfYear, 6)]);
        let offset = Time::partial(
            Partial::from_fields(&[(FieldType::Year, 2016)])
                .unwrap()
                .with_chronology(Chronology::IsoOffset(3600)),
        );
        let err = iso.intersect(&offset).unwrap_err();
        assert!(matches!(err, TemporalError::ChronologyMismatch { .. }));
    }

    #[test]
    fn test_undecidable_pair_is_deferred() {
        let ordinal = Time::ordinal(p(&[(FieldType::DayOfWeek, 5)]), 2);
        let june = p(&[(FieldType::MonthOfYear, 6)]);
        let deferred = ordinal.intersect(&june).unwrap().unwrap();
        assert!(matches!(deferred.kind(), TimeKind::Relative(_)));
    }
}
