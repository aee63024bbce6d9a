//! Lengths of time: exact field counts, exact elapsed milliseconds, min/max
//! ranges and approximate amounts.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{Result, TemporalError};
use crate::field::TimeUnit;
use crate::flags::Flags;
use crate::format::timex_duration;
use crate::ops::TemporalOp;
use crate::partial::Partial;
use crate::period::Period;
use crate::range::Range;
use crate::temporal::{Temporal, TemporalMeta, TemporalValue, TimexType};
use crate::time::Time;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DurationKind {
    /// Exact counts per unit ("3 weeks").
    Fields(Period),
    /// Exact elapsed milliseconds.
    Millis(i64),
    /// Between `min` and `max`; either bound may be open.
    Range {
        min: Option<Box<Duration>>,
        max: Option<Box<Duration>>,
    },
    /// An approximate amount ("a few months"); digits render as `X`.
    Inexact(Period),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Duration {
    kind: DurationKind,
    meta: TemporalMeta,
}

impl Duration {
    pub fn new(kind: DurationKind) -> Self {
        Self {
            kind,
            meta: TemporalMeta::default(),
        }
    }

    pub fn from_period(period: Period) -> Self {
        Self::new(DurationKind::Fields(period))
    }

    pub fn of(unit: TimeUnit, count: i64) -> Self {
        Self::from_period(Period::of(unit, count))
    }

    pub fn millis(ms: i64) -> Self {
        Self::new(DurationKind::Millis(ms))
    }

    pub fn range(min: Option<Duration>, max: Option<Duration>) -> Self {
        Self::new(DurationKind::Range {
            min: min.map(Box::new),
            max: max.map(Box::new),
        })
    }

    pub fn inexact(period: Period) -> Self {
        let mut d = Self::new(DurationKind::Inexact(period));
        d.meta.approx = true;
        d
    }

    pub fn kind(&self) -> &DurationKind {
        &self.kind
    }

    pub fn is_range(&self) -> bool {
        matches!(self.kind, DurationKind::Range { .. })
    }

    /// Exact counts or millis, not flagged approximate.
    pub fn is_exact(&self) -> bool {
        !self.meta.approx && matches!(self.kind, DurationKind::Fields(_) | DurationKind::Millis(_))
    }

    fn with_kind(&self, kind: DurationKind) -> Duration {
        Duration {
            kind,
            meta: self.meta.clone(),
        }
    }

    /// Field counts of this duration. A range reports its upper bound, or its
    /// lower bound when open above.
    pub fn period(&self) -> Option<Period> {
        match &self.kind {
            DurationKind::Fields(p) | DurationKind::Inexact(p) => Some(p.clone()),
            DurationKind::Millis(ms) => Some(Period::from_millis(*ms)),
            DurationKind::Range { min, max } => max.as_ref().or(min.as_ref())?.period(),
        }
    }

    /// Estimated elapsed milliseconds.
    pub fn to_millis(&self) -> Option<i64> {
        match &self.kind {
            DurationKind::Millis(ms) => Some(*ms),
            DurationKind::Fields(p) | DurationKind::Inexact(p) => Some(p.estimated_millis()),
            DurationKind::Range { min, max } => max.as_ref().or(min.as_ref())?.to_millis(),
        }
    }

    /// Finest unit with a non-zero count.
    pub fn granularity(&self) -> Option<TimeUnit> {
        self.period().and_then(|p| p.finest_unit())
    }

    /// Coarsest unit with a non-zero count.
    pub fn unit(&self) -> Option<TimeUnit> {
        self.period().and_then(|p| p.coarsest_unit())
    }

    /// Orders by estimated length; exact values sort before approximate
    /// ones of the same length.
    pub fn compare(&self, other: &Duration) -> Ordering {
        let a = self.to_millis().unwrap_or(i64::MAX);
        let b = other.to_millis().unwrap_or(i64::MAX);
        a.cmp(&b)
            .then_with(|| other.is_exact().cmp(&self.is_exact()))
    }

    pub fn min<'a>(&'a self, other: &'a Duration) -> &'a Duration {
        if self.compare(other) == Ordering::Greater {
            other
        } else {
            self
        }
    }

    pub fn max<'a>(&'a self, other: &'a Duration) -> &'a Duration {
        if self.compare(other) == Ordering::Less {
            other
        } else {
            self
        }
    }

    // ── Arithmetic ──────────────────────────────────────────────────────

    pub fn add(&self, other: &Duration) -> Duration {
        use DurationKind::*;
        match (&self.kind, &other.kind) {
            (Millis(a), Millis(b)) => self.with_kind(Millis(a + b)),
            (Range { min, max }, _) => self.with_kind(Range {
                min: min.as_ref().map(|d| Box::new(d.add(other))),
                max: max.as_ref().map(|d| Box::new(d.add(other))),
            }),
            (_, Range { .. }) => other.add(self),
            _ => {
                let (Some(a), Some(b)) = (self.period(), other.period()) else {
                    return self.clone();
                };
                let sum = a.plus(&b);
                if matches!(self.kind, Inexact(_)) || matches!(other.kind, Inexact(_)) {
                    self.with_kind(Inexact(sum)).with_approx(true)
                } else {
                    self.with_kind(Fields(sum))
                }
            }
        }
    }

    pub fn subtract(&self, other: &Duration) -> Duration {
        self.add(&other.negated())
    }

    pub fn negated(&self) -> Duration {
        self.multiply_by(-1)
    }

    pub fn multiply_by(&self, n: i64) -> Duration {
        match &self.kind {
            DurationKind::Fields(p) => self.with_kind(DurationKind::Fields(p.multiplied_by(n))),
            DurationKind::Inexact(p) => self.with_kind(DurationKind::Inexact(p.multiplied_by(n))),
            DurationKind::Millis(ms) => self.with_kind(DurationKind::Millis(ms * n)),
            DurationKind::Range { min, max } => self.with_kind(DurationKind::Range {
                min: min.as_ref().map(|d| Box::new(d.multiply_by(n))),
                max: max.as_ref().map(|d| Box::new(d.multiply_by(n))),
            }),
        }
    }

    /// Divides by `n`. Remainders move into finer units; a remainder with no
    /// finer unit is an [`TemporalError::UnsupportedDurationField`].
    pub fn divide_by(&self, n: i64) -> Result<Duration> {
        Ok(match &self.kind {
            DurationKind::Fields(p) => self.with_kind(DurationKind::Fields(p.divided_by(n)?)),
            DurationKind::Inexact(p) => self.with_kind(DurationKind::Inexact(p.divided_by(n)?)),
            DurationKind::Millis(ms) => {
                if n == 0 || ms % n != 0 {
                    return Err(TemporalError::UnsupportedDurationField(format!(
                        "{ms}ms is not divisible by {n}"
                    )));
                }
                self.with_kind(DurationKind::Millis(ms / n))
            }
            DurationKind::Range { min, max } => self.with_kind(DurationKind::Range {
                min: min.as_ref().map(|d| d.divide_by(n).map(Box::new)).transpose()?,
                max: max.as_ref().map(|d| d.divide_by(n).map(Box::new)).transpose()?,
            }),
        })
    }

    /// Half of this duration, falling back to half the estimated length
    /// when the counts do not split evenly.
    pub(crate) fn half(&self) -> Duration {
        self.divide_by(2)
            .unwrap_or_else(|_| Duration::millis(self.to_millis().unwrap_or(0) / 2))
    }

    /// The shorter of two durations.
    pub fn intersect(&self, other: &Duration) -> Duration {
        self.min(other).clone()
    }

    pub fn resolve(&self, _reference: &Time, _flags: Flags) -> Result<Duration> {
        Ok(self.clone())
    }

    // ── Anchoring ───────────────────────────────────────────────────────

    /// "The next `self`": the current occurrence ending at the reference,
    /// moved forward by this duration. Deferred until resolved.
    pub fn next(&self) -> Time {
        let current = Time::relative(
            Time::reference(),
            TemporalOp::This,
            Some(Temporal::Duration(self.clone())),
            Flags::DUR_RESOLVE_TO_AS_REF,
        );
        Time::relative(
            current,
            TemporalOp::Offset,
            Some(Temporal::Duration(self.clone())),
            Flags::NONE,
        )
    }

    pub fn prev(&self) -> Time {
        let current = Time::relative(
            Time::reference(),
            TemporalOp::This,
            Some(Temporal::Duration(self.clone())),
            Flags::DUR_RESOLVE_FROM_AS_REF,
        );
        Time::relative(
            current,
            TemporalOp::Offset,
            Some(Temporal::Duration(self.negated())),
            Flags::NONE,
        )
    }

    /// Anchors this duration at a reference time.
    ///
    /// A single calendar unit ("week", "month") becomes the occurrence of
    /// that unit containing the reference, moved one back or forward when
    /// `RESOLVE_TO_PAST`/`RESOLVE_TO_FUTURE` require it. Any other length
    /// becomes a range ending at, starting at, or centred on the reference.
    pub fn to_time(&self, reference: &Time, flags: Flags) -> Time {
        let Some(anchor) = reference.instant() else {
            return Time::relative(
                reference.clone(),
                TemporalOp::This,
                Some(Temporal::Duration(self.clone())),
                flags,
            );
        };
        let Some(period) = self.period() else {
            return Time::grounded(anchor);
        };

        if let Some(truncated) = period
            .single_unit()
            .and_then(|unit| Partial::truncated_instant(anchor, unit))
        {
            let current = Time::partial(truncated);
            let shifted = if flags.contains(Flags::RESOLVE_TO_PAST)
                && current.span().is_some_and(|(_, end)| end > anchor)
            {
                current.subtract(self)
            } else if flags.contains(Flags::RESOLVE_TO_FUTURE)
                && current.instant().is_some_and(|begin| begin <= anchor)
            {
                current.add(self)
            } else {
                current
            };
            debug!(duration = %self.full_string(), %flags, "anchored unit duration");
            return shifted;
        }

        let later = period.add_to(anchor);
        let earlier = period.subtract_from(anchor);
        let (begin, end) = if flags.contains(Flags::DUR_RESOLVE_FROM_AS_REF)
            || (flags.contains(Flags::RESOLVE_TO_FUTURE)
                && !flags.contains(Flags::DUR_RESOLVE_TO_AS_REF))
        {
            (Some(anchor), later)
        } else if flags.contains(Flags::DUR_RESOLVE_TO_AS_REF)
            || flags.contains(Flags::RESOLVE_TO_PAST)
        {
            (earlier, Some(anchor))
        } else {
            let half = self.half().period().unwrap_or_default();
            (half.subtract_from(anchor), half.add_to(anchor))
        };
        let (Some(begin), Some(end)) = (begin, end) else {
            return Time::grounded(anchor);
        };
        let range = Range::new(
            Some(Time::grounded(begin)),
            Some(Time::grounded(end)),
            Some(self.clone()),
        );
        debug!(duration = %self.full_string(), %flags, "anchored duration as range");
        if flags.intersects(Flags::RESOLVE_TO_PAST | Flags::RESOLVE_TO_FUTURE) {
            Time::with_range(range)
        } else {
            Time::inexact(Some(Time::grounded(anchor)), Some(self.clone()), Some(range))
        }
    }

    /// TIMEX3 value with forced units (see [`timex_duration`]).
    pub fn timex_value_with(&self, forced: &[TimeUnit]) -> Option<String> {
        match &self.kind {
            DurationKind::Fields(p) => Some(timex_duration(p, self.meta.approx, forced)),
            DurationKind::Inexact(p) => Some(timex_duration(p, true, forced)),
            DurationKind::Millis(ms) => Some(timex_duration(
                &Period::from_millis(*ms),
                self.meta.approx,
                forced,
            )),
            DurationKind::Range { .. } => self
                .period()
                .map(|p| timex_duration(&p, true, forced)),
        }
    }
}

impl TemporalValue for Duration {
    fn meta(&self) -> &TemporalMeta {
        &self.meta
    }

    fn with_meta(&self, meta: TemporalMeta) -> Self {
        Duration {
            kind: self.kind.clone(),
            meta,
        }
    }

    fn timex_type(&self) -> TimexType {
        TimexType::Duration
    }

    fn timex_value(&self) -> Option<String> {
        self.timex_value_with(&[])
    }

    fn full_string(&self) -> String {
        match &self.kind {
            DurationKind::Range { min, max } => {
                let side = |d: &Option<Box<Duration>>| {
                    d.as_ref()
                        .and_then(|d| d.timex_value())
                        .unwrap_or_else(|| "PXX".to_string())
                };
                format!("{}/{}", side(min), side(max))
            }
            _ => self.timex_value().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn anchor() -> Time {
        Time::grounded(sunday())
    }

    fn sunday() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 6, 19)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_compare_exact_before_approximate() {
        let exact = Duration::of(TimeUnit::Month, 1);
        let approx = Duration::inexact(Period::of(TimeUnit::Month, 1));
        assert_eq!(exact.compare(&approx), Ordering::Less);
        assert_eq!(
            Duration::of(TimeUnit::Day, 2).compare(&Duration::of(TimeUnit::Day, 1)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_add_mixes_kinds() {
        let d = Duration::of(TimeUnit::Day, 1).add(&Duration::of(TimeUnit::Hour, 12));
        assert_eq!(d.timex_value().unwrap(), "P1DT12H");
        let approx = Duration::of(TimeUnit::Day, 1).add(&Duration::inexact(Period::of(TimeUnit::Day, 2)));
        assert!(approx.is_approx());
    }

    #[test]
    fn test_divide_by() {
        let d = Duration::of(TimeUnit::Year, 1).divide_by(4).unwrap();
        assert_eq!(d.period().unwrap(), Period::of(TimeUnit::Month, 3));
        let err = Duration::of(TimeUnit::Decade, 1).divide_by(3).unwrap_err();
        assert!(matches!(err, TemporalError::UnsupportedDurationField(_)));
        assert!(Duration::millis(3).divide_by(2).is_err());
    }

    #[test]
    fn test_range_timex_uses_upper_bound() {
        let d = Duration::range(
            Some(Duration::of(TimeUnit::Day, 2)),
            Some(Duration::of(TimeUnit::Day, 3)),
        );
        assert_eq!(d.timex_value().unwrap(), "PXD");
        assert_eq!(d.full_string(), "P2D/P3D");
    }

    #[test]
    fn test_forced_units() {
        let d = Duration::of(TimeUnit::Year, 20);
        assert_eq!(d.timex_value().unwrap(), "P2E");
        assert_eq!(d.timex_value_with(&[TimeUnit::Year]).unwrap(), "P20Y");
    }

    #[test]
    fn test_to_time_truncates_single_unit() {
        let week = Duration::of(TimeUnit::Week, 1).to_time(&anchor(), Flags::RESOLVE_TO_THIS);
        assert_eq!(week.timex_value().unwrap(), "2016-W24");
        let future = Duration::of(TimeUnit::Month, 1).to_time(&anchor(), Flags::RESOLVE_TO_FUTURE);
        assert_eq!(future.timex_value().unwrap(), "2016-07");
        let past = Duration::of(TimeUnit::Year, 1).to_time(&anchor(), Flags::RESOLVE_TO_PAST);
        assert_eq!(past.timex_value().unwrap(), "2015");
    }

    #[test]
    fn test_to_time_range_alignment() {
        let three_days = Duration::of(TimeUnit::Day, 3);
        let after = three_days.to_time(&anchor(), Flags::RESOLVE_TO_FUTURE);
        let (begin, end) = after.span().unwrap();
        assert_eq!(begin, sunday());
        assert_eq!(end, sunday() + chrono::TimeDelta::days(3) + chrono::TimeDelta::milliseconds(1));

        let around = three_days.to_time(&anchor(), Flags::NONE);
        let (begin, _) = around.span().unwrap();
        assert_eq!(begin, sunday() - chrono::TimeDelta::hours(36));
    }

    #[test]
    fn test_to_time_defers_without_anchor() {
        let t = Duration::of(TimeUnit::Day, 1).to_time(&Time::reference(), Flags::NONE);
        assert!(!t.is_grounded());
    }
}
