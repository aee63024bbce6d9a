//! Field-count periods ("2 years, 3 weeks") and their calendar arithmetic.
//!
//! A [`Period`] keeps the counts exactly as given: 20 years stays 20 years
//! and only turns into "2 decades" when it is rendered. Adding a period to an
//! instant applies the month-based units first (with end-of-month clamping),
//! then days, then the fixed-length time-of-day units.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Months, NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::{Result, TemporalError};
use crate::field::TimeUnit;

/// Counts per [`TimeUnit`]. Zero counts are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Period {
    fields: BTreeMap<TimeUnit, i64>,
}

/// Anchor used to turn a period into an estimated elapsed length.
fn estimation_anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

impl Period {
    pub fn new() -> Self {
        Self::default()
    }

    /// `count` of a single unit.
    pub fn of(unit: TimeUnit, count: i64) -> Self {
        Self::new().with(unit, count)
    }

    /// Adds `count` units to this period.
    pub fn with(mut self, unit: TimeUnit, count: i64) -> Self {
        if unit == TimeUnit::Era || count == 0 {
            return self;
        }
        let entry = self.fields.entry(unit).or_insert(0);
        *entry += count;
        if *entry == 0 {
            self.fields.remove(&unit);
        }
        self
    }

    pub fn get(&self, unit: TimeUnit) -> i64 {
        self.fields.get(&unit).copied().unwrap_or(0)
    }

    pub fn is_zero(&self) -> bool {
        self.fields.is_empty()
    }

    /// Non-zero counts, finest unit first.
    pub fn iter(&self) -> impl Iterator<Item = (TimeUnit, i64)> + '_ {
        self.fields.iter().map(|(u, v)| (*u, *v))
    }

    pub fn finest_unit(&self) -> Option<TimeUnit> {
        self.fields.keys().next().copied()
    }

    pub fn coarsest_unit(&self) -> Option<TimeUnit> {
        self.fields.keys().next_back().copied()
    }

    /// The unit when this period is exactly one of a single unit.
    pub fn single_unit(&self) -> Option<TimeUnit> {
        match self.fields.iter().collect::<Vec<_>>().as_slice() {
            [(unit, 1)] => Some(**unit),
            _ => None,
        }
    }

    pub fn plus(&self, other: &Period) -> Period {
        other
            .iter()
            .fold(self.clone(), |acc, (unit, count)| acc.with(unit, count))
    }

    pub fn minus(&self, other: &Period) -> Period {
        self.plus(&other.negated())
    }

    pub fn negated(&self) -> Period {
        self.multiplied_by(-1)
    }

    pub fn multiplied_by(&self, n: i64) -> Period {
        self.iter()
            .fold(Period::new(), |acc, (unit, count)| acc.with(unit, count * n))
    }

    /// Divides every count by `n`, pushing remainders into the next finer
    /// unit (see [`TimeUnit::finer_split`]). A remainder that has nowhere to
    /// go is an error.
    pub fn divided_by(&self, n: i64) -> Result<Period> {
        if n == 0 {
            return Err(TemporalError::UnsupportedOperation(
                "division of a period by zero".to_string(),
            ));
        }
        let mut scaled = Period::new();
        for (unit, count) in self.iter() {
            let remainder = count % n;
            scaled = scaled.with(unit, count - remainder);
            if remainder != 0 {
                let (finer, factor) = unit.finer_split().ok_or_else(|| {
                    TemporalError::UnsupportedDurationField(format!(
                        "{unit} leaves a remainder when dividing by {n}"
                    ))
                })?;
                scaled = scaled.with(finer, remainder * factor);
            }
        }
        Ok(scaled
            .iter()
            .fold(Period::new(), |acc, (unit, count)| acc.with(unit, count / n)))
    }

    /// Months from all year-section units (millennia down to months).
    pub fn total_months(&self) -> i64 {
        self.iter()
            .filter_map(|(unit, count)| unit.months_factor().map(|f| f * count))
            .sum()
    }

    /// Days from weeks and days.
    pub fn total_days(&self) -> i64 {
        self.iter()
            .filter_map(|(unit, count)| unit.days_factor().map(|f| f * count))
            .sum()
    }

    /// Milliseconds from the time-of-day units (half-days down to millis).
    pub fn total_millis(&self) -> i64 {
        self.iter()
            .filter_map(|(unit, count)| unit.millis_factor().map(|f| f * count))
            .sum()
    }

    /// Adds this period to an instant. `None` when the result is out of range.
    pub fn add_to(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        let months = self.total_months();
        let shifted = if months >= 0 {
            dt.checked_add_months(Months::new(u32::try_from(months).ok()?))?
        } else {
            dt.checked_sub_months(Months::new(u32::try_from(-months).ok()?))?
        };
        shifted
            .checked_add_signed(TimeDelta::try_days(self.total_days())?)?
            .checked_add_signed(TimeDelta::try_milliseconds(self.total_millis())?)
    }

    /// Subtracts this period from an instant.
    pub fn subtract_from(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        self.negated().add_to(dt)
    }

    /// Elapsed milliseconds when added to 1970-01-01T00:00.
    pub fn estimated_millis(&self) -> i64 {
        let anchor = estimation_anchor();
        match self.add_to(anchor) {
            Some(end) => (end - anchor).num_milliseconds(),
            None => self
                .iter()
                .map(|(unit, count)| unit.approx_millis().unwrap_or(0).saturating_mul(count))
                .fold(0i64, |acc, v| acc.saturating_add(v)),
        }
    }

    /// Period from `begin` to `end` in months, days and time-of-day units.
    pub fn between(begin: NaiveDateTime, end: NaiveDateTime) -> Period {
        if end < begin {
            return Period::between(end, begin).negated();
        }
        let mut months = (end.year_month_index() - begin.year_month_index()).max(0);
        let mut anchor = begin;
        while months > 0 {
            match u32::try_from(months)
                .ok()
                .and_then(|m| begin.checked_add_months(Months::new(m)))
            {
                Some(candidate) if candidate <= end => {
                    anchor = candidate;
                    break;
                }
                _ => months -= 1,
            }
        }
        let rest = end - anchor;
        let days = rest.num_days();
        let millis = (rest - TimeDelta::days(days)).num_milliseconds();
        Period::of(TimeUnit::Month, months)
            .with(TimeUnit::Day, days)
            .plus(&Period::from_millis(millis))
    }

    /// Hours, minutes, seconds and millis of an elapsed length.
    pub fn from_millis(millis: i64) -> Period {
        let hours = millis / 3_600_000;
        let minutes = (millis % 3_600_000) / 60_000;
        let seconds = (millis % 60_000) / 1_000;
        let ms = millis % 1_000;
        Period::of(TimeUnit::Hour, hours)
            .with(TimeUnit::Minute, minutes)
            .with(TimeUnit::Second, seconds)
            .with(TimeUnit::Millis, ms)
    }
}

trait YearMonthIndex {
    fn year_month_index(&self) -> i64;
}

impl YearMonthIndex for NaiveDateTime {
    fn year_month_index(&self) -> i64 {
        use chrono::Datelike;
        i64::from(self.year()) * 12 + i64::from(self.month0())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::timex_duration(self, false, &[]))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_with_drops_zero_counts() {
        let p = Period::of(TimeUnit::Day, 3).with(TimeUnit::Day, -3);
        assert!(p.is_zero());
    }

    #[test]
    fn test_add_to_clamps_month_end() {
        let p = Period::of(TimeUnit::Month, 1);
        assert_eq!(p.add_to(dt(2016, 1, 31, 0)), Some(dt(2016, 2, 29, 0)));
    }

    #[test]
    fn test_add_to_mixed_units() {
        let p = Period::of(TimeUnit::Quarter, 1)
            .with(TimeUnit::Week, 1)
            .with(TimeUnit::Hour, 5);
        assert_eq!(p.add_to(dt(2016, 1, 1, 0)), Some(dt(2016, 4, 8, 5)));
    }

    #[test]
    fn test_divided_by_redistributes_remainder() {
        let half_year = Period::of(TimeUnit::Year, 1).divided_by(2).unwrap();
        assert_eq!(half_year, Period::of(TimeUnit::Month, 6));

        let half_day = Period::of(TimeUnit::Day, 1).divided_by(2).unwrap();
        assert_eq!(half_day, Period::of(TimeUnit::Hour, 12));

        let week_third = Period::of(TimeUnit::Week, 1).divided_by(3).unwrap();
        assert_eq!(week_third, Period::of(TimeUnit::Day, 2));
    }

    #[test]
    fn test_divided_by_millis_remainder_fails() {
        let err = Period::of(TimeUnit::Millis, 1).divided_by(2).unwrap_err();
        assert!(matches!(err, TemporalError::UnsupportedDurationField(_)));
    }

    #[test]
    fn test_divided_by_zero_fails() {
        assert!(Period::of(TimeUnit::Day, 1).divided_by(0).is_err());
    }

    #[test]
    fn test_between_month_and_days() {
        let p = Period::between(dt(2016, 1, 15, 0), dt(2016, 3, 20, 6));
        assert_eq!(p.get(TimeUnit::Month), 2);
        assert_eq!(p.get(TimeUnit::Day), 5);
        assert_eq!(p.get(TimeUnit::Hour), 6);
    }

    #[test]
    fn test_between_is_antisymmetric() {
        let a = dt(2016, 6, 13, 0);
        let b = dt(2016, 6, 20, 0);
        assert_eq!(Period::between(b, a), Period::between(a, b).negated());
    }

    #[test]
    fn test_single_unit() {
        assert_eq!(Period::of(TimeUnit::Week, 1).single_unit(), Some(TimeUnit::Week));
        assert_eq!(Period::of(TimeUnit::Week, 2).single_unit(), None);
    }

    proptest! {
        #[test]
        fn prop_plus_minus_roundtrip(a in -500i64..500, b in -500i64..500, c in -500i64..500) {
            let p = Period::of(TimeUnit::Month, a).with(TimeUnit::Day, b);
            let q = Period::of(TimeUnit::Day, c).with(TimeUnit::Hour, a);
            prop_assert_eq!(p.plus(&q).minus(&q), p);
        }

        #[test]
        fn prop_exact_division(n in 1i64..12, k in -100i64..100) {
            let p = Period::of(TimeUnit::Day, k * n).with(TimeUnit::Year, 2 * n);
            let expected = Period::of(TimeUnit::Day, k).with(TimeUnit::Year, 2);
            prop_assert_eq!(p.divided_by(n).unwrap(), expected);
        }
    }
}
