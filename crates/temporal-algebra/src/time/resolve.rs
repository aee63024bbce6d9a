//! Grounding times against a reference.
//!
//! A partial value borrows the fields it does not specify from the
//! reference ("June" against 2016-06-19 is June 2016). When something was
//! borrowed there is more than one legal occurrence, and the
//! `RESOLVE_TO_*` flags pick between the current, previous and next one.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use tracing::debug;

use crate::error::{Result, TemporalError};
use crate::field::FieldType;
use crate::flags::Flags;
use crate::partial::{weekday_from_number, Partial};
use crate::temporal::{Temporal, TemporalMeta, TemporalValue};

use super::{CompositeTime, InexactTime, OrdinalTime, RelativeTime, Time, TimeKind};

/// The calendar fields of a reference time. Symbolic references have none.
fn reference_view(reference: &Time) -> Result<Partial> {
    let unsupported = || {
        TemporalError::UnsupportedOperation(format!(
            "cannot resolve against {}",
            reference.full_string()
        ))
    };
    match reference.kind() {
        TimeKind::Grounded(dt) => Ok(Partial::from_instant_full(*dt)),
        TimeKind::Partial(p) if p.is_groundable() => Ok(p.clone()),
        TimeKind::Reference | TimeKind::Vague(_) | TimeKind::Partial(_) => Err(unsupported()),
        _ => reference
            .instant()
            .map(Partial::from_instant_full)
            .ok_or_else(unsupported),
    }
}

impl Time {
    /// Grounds this time against `reference`.
    ///
    /// Grounded, vague and already placeable values come back unchanged;
    /// the reference sentinel becomes `reference` itself. Fails with
    /// [`TemporalError::UnsupportedOperation`] when `reference` has no
    /// calendar fields to borrow.
    pub fn resolve(&self, reference: &Time, flags: Flags) -> Result<Time> {
        match self.kind() {
            TimeKind::Grounded(_) | TimeKind::Vague(_) => return Ok(self.clone()),
            TimeKind::Reference => return Ok(self.inherit_meta(reference.clone())),
            _ if self.is_grounded() => return Ok(self.clone()),
            _ => {}
        }
        match self.kind() {
            TimeKind::Partial(p) => {
                let view = reference_view(reference)?;
                self.resolve_partial(p, &view, flags)
            }
            TimeKind::Composite(c) => {
                let view = reference_view(reference)?;
                self.resolve_composite(c, &view, flags)
            }
            TimeKind::Ordinal(o) => self.resolve_ordinal(o, reference, flags),
            TimeKind::Relative(r) => self.resolve_relative(r, reference, flags),
            TimeKind::Inexact(i) => self.resolve_inexact(i, reference, flags),
            TimeKind::WithRange(r) => Ok(self.with_kind(TimeKind::WithRange(Box::new(
                r.resolve_endpoints(reference, flags)?,
            )))),
            TimeKind::Grounded(_) | TimeKind::Vague(_) | TimeKind::Reference => Ok(self.clone()),
        }
    }

    /// `result` carrying whatever annotations this time has set.
    fn inherit_meta(&self, result: Time) -> Time {
        let own = self.meta();
        if *own == TemporalMeta::default() {
            return result;
        }
        let mut meta = result.meta().clone();
        if own.modifier.is_some() {
            meta.modifier = own.modifier.clone();
        }
        if own.standard_type.is_some() {
            meta.standard_type = own.standard_type;
        }
        if own.label.is_some() {
            meta.label = own.label.clone();
        }
        meta.approx |= own.approx;
        result.with_meta(meta)
    }

    fn resolve_partial(&self, p: &Partial, view: &Partial, flags: Flags) -> Result<Time> {
        let combined = p.combine_more_general_fields(view, None)?;
        let borrowed = view
            .field_types()
            .any(|f| !p.has_field(f) && combined.has_field(f));
        let merged = combined.resolve_dow_to_day(Some(view));
        let candidate = self.with_partial(merged.clone());

        if !borrowed {
            return Ok(candidate);
        }
        let (Some(step), Some(anchor)) = (self.natural_step(), view.begin_instant()) else {
            return Ok(candidate);
        };
        let shifted = |forward: bool| {
            let period = if forward { step.clone() } else { step.negated() };
            merged.add_period(&period).map(|s| self.with_partial(s))
        };
        let resolved = choose_occurrence(candidate, anchor, flags, shifted);
        debug!(value = %resolved, step = %step, %flags, "resolved partial against reference");
        Ok(resolved)
    }

    /// Places the base of a composite, then steps it by the composite's
    /// cycle when the flags ask for another occurrence.
    fn resolve_composite(&self, c: &CompositeTime, view: &Partial, flags: Flags) -> Result<Time> {
        let placed = c.resolve_base(view)?;
        let candidate = self.with_kind(TimeKind::Composite(placed.clone()));
        if c.base().has_absolute_year() {
            return Ok(candidate);
        }
        let (Some(step), Some(anchor)) = (self.natural_step(), view.begin_instant()) else {
            return Ok(candidate);
        };
        let shifted = |forward: bool| {
            let period = if forward { step.clone() } else { step.negated() };
            placed
                .base()
                .add_period(&period)
                .map(|base| self.with_kind(TimeKind::Composite(placed.with_base(base))))
        };
        let resolved = choose_occurrence(candidate, anchor, flags, shifted);
        debug!(value = %resolved, step = %step, %flags, "resolved composite against reference");
        Ok(resolved)
    }

    /// Picks the `n`th matching weekday of the month named by the base;
    /// negative `n` counts back from the last one.
    fn resolve_ordinal(&self, o: &OrdinalTime, reference: &Time, flags: Flags) -> Result<Time> {
        let base = if o.base.as_partial().is_some() {
            (*o.base).clone()
        } else {
            o.base.resolve(reference, flags)?
        };
        let Some(p) = base.as_partial() else {
            return Ok(self.clone());
        };
        let Some(weekday) = p.get(FieldType::DayOfWeek).and_then(weekday_from_number) else {
            return Ok(self.clone());
        };
        let view = reference_view(reference)?.discard_more_specific_fields(FieldType::MonthOfYear);
        let located = p
            .without(FieldType::DayOfWeek)
            .combine_more_general_fields(&view, None)?;
        let (Some(year), Some(month)) = (located.year_value(), located.effective_month()) else {
            return Ok(self.clone());
        };
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Ok(self.clone());
        };
        let offset = (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
        let days: Vec<NaiveDate> = (0..)
            .map(|week| first + TimeDelta::days(i64::from(offset + 7 * week)))
            .take_while(|d| d.month() == month)
            .collect();

        let index = match o.n {
            n if n > 0 => usize::try_from(n - 1).ok(),
            n if n < 0 => days.len().checked_sub(n.unsigned_abs() as usize),
            _ => None,
        };
        let Some(day) = index.and_then(|i| days.get(i)) else {
            debug!(n = o.n, candidates = days.len(), "ordinal out of range");
            return Ok(self.clone());
        };
        let resolved = located
            .with(FieldType::MonthOfYear, month as i32)
            .with(FieldType::DayOfMonth, day.day() as i32)
            .with(FieldType::DayOfWeek, weekday.number_from_monday() as i32);
        Ok(self.inherit_meta(base.with_partial(resolved)))
    }

    /// Resolves the base, applies the operator, and resolves the outcome.
    /// When the grounded base gives nothing usable the operator is applied
    /// to the unresolved base instead.
    fn resolve_relative(&self, r: &RelativeTime, reference: &Time, flags: Flags) -> Result<Time> {
        use crate::ops::TemporalOp;

        let op_flags = r.flags.union(flags);
        let base = r.base.resolve(reference, flags)?;
        let arg = match r.arg.as_deref() {
            Some(Temporal::Time(t))
                if matches!(
                    r.op,
                    TemporalOp::Intersect | TemporalOp::Union | TemporalOp::Min | TemporalOp::Max
                ) =>
            {
                Some(Temporal::Time(t.resolve(reference, flags)?))
            }
            other => other.cloned(),
        };

        let first = r
            .op
            .apply(Some(&Temporal::Time(base)), arg.as_ref(), op_flags)?
            .and_then(as_time);
        debug!(op = %r.op, result = ?first.as_ref().map(|t| t.to_string()), "applied operator");
        if let Some(t) = first.as_ref().filter(|t| t.is_grounded()) {
            return Ok(self.inherit_meta(t.clone()));
        }

        let retry = r
            .op
            .apply(Some(&Temporal::Time((*r.base).clone())), arg.as_ref(), op_flags)?
            .and_then(as_time);
        match retry {
            Some(t) if t != *self && !matches!(t.kind(), TimeKind::Relative(_)) => {
                Ok(self.inherit_meta(t.resolve(reference, flags)?))
            }
            _ => Ok(first.map_or_else(|| self.clone(), |t| self.inherit_meta(t))),
        }
    }

    fn resolve_inexact(&self, i: &InexactTime, reference: &Time, flags: Flags) -> Result<Time> {
        let base = i
            .base
            .as_ref()
            .map(|b| b.resolve(reference, flags))
            .transpose()?;
        let range = i
            .range
            .as_ref()
            .map(|r| r.resolve_endpoints(reference, flags))
            .transpose()?;
        Ok(self.with_kind(TimeKind::Inexact(InexactTime {
            base: base.map(Box::new),
            uncertainty: i.uncertainty.clone(),
            range: range.map(Box::new),
        })))
    }
}

/// Picks between `candidate` and its neighbours one cycle away.
///
/// `RESOLVE_TO_PAST` steps back when the candidate begins after `anchor`,
/// `RESOLVE_TO_FUTURE` steps forward when it ends at or before it, and
/// `RESOLVE_TO_CLOSEST` keeps whichever begins nearest.
fn choose_occurrence(
    candidate: Time,
    anchor: NaiveDateTime,
    flags: Flags,
    shifted: impl Fn(bool) -> Option<Time>,
) -> Time {
    let Some((begin, end)) = candidate.span() else {
        return candidate;
    };
    let chosen = if flags.contains(Flags::RESOLVE_TO_PAST) && begin > anchor {
        shifted(false)
    } else if flags.contains(Flags::RESOLVE_TO_FUTURE) && end <= anchor {
        shifted(true)
    } else if flags.contains(Flags::RESOLVE_TO_CLOSEST) {
        let distance = |t: &Time| t.instant().map(|i| (i - anchor).abs());
        let mut best = candidate.clone();
        for other in [shifted(false), shifted(true)].into_iter().flatten() {
            if let (Some(d), Some(best_d)) = (distance(&other), distance(&best)) {
                if d < best_d {
                    best = other;
                }
            }
        }
        Some(best)
    } else {
        None
    };
    chosen.unwrap_or(candidate)
}

fn as_time(t: Temporal) -> Option<Time> {
    match t {
        Temporal::Time(t) => Some(t),
        Temporal::Range(r) => Some(Time::with_range(r)),
        Temporal::Duration(_) | Temporal::Set(_) => None,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Duration;
    use crate::field::TimeUnit;
    use crate::flags::RangePadding;
    use crate::ops::TemporalOp;
    use chrono::NaiveDateTime;

    fn sunday() -> Time {
        Time::grounded(
            NaiveDate::from_ymd_opt(2016, 6, 19)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        )
    }

    fn p(fields: &[(FieldType, i32)]) -> Time {
        Time::partial(Partial::from_fields(fields).unwrap())
    }

    fn value(t: &Time) -> String {
        t.timex_value().unwrap()
    }

    fn day_range(t: &Time) -> String {
        t.range(RangePadding::Auto).unwrap().timex_value().unwrap()
    }

    #[test]
    fn test_grounded_is_unchanged() {
        let t = Time::grounded(NaiveDateTime::default());
        assert_eq!(t.resolve(&sunday(), Flags::RESOLVE_TO_PAST).unwrap(), t);
    }

    #[test]
    fn test_reference_sentinel_becomes_reference() {
        assert_eq!(Time::reference().resolve(&sunday(), Flags::NONE).unwrap(), sunday());
    }

    #[test]
    fn test_symbolic_reference_is_unsupported() {
        let june = p(&[(FieldType::MonthOfYear, 6)]);
        let err = june.resolve(&Time::reference(), Flags::NONE).unwrap_err();
        assert!(matches!(err, TemporalError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_month_borrows_year() {
        let june = p(&[(FieldType::MonthOfYear, 6)]);
        assert_eq!(value(&june.resolve(&sunday(), Flags::NONE).unwrap()), "2016-06");
    }

    #[test]
    fn test_past_and_future_steps() {
        let august = p(&[(FieldType::MonthOfYear, 8)]);
        assert_eq!(value(&august.resolve(&sunday(), Flags::RESOLVE_TO_PAST).unwrap()), "2015-08");
        let may = p(&[(FieldType::MonthOfYear, 5)]);
        assert_eq!(value(&may.resolve(&sunday(), Flags::RESOLVE_TO_FUTURE).unwrap()), "2017-05");
        assert_eq!(value(&may.resolve(&sunday(), Flags::RESOLVE_TO_PAST).unwrap()), "2016-05");
    }

    #[test]
    fn test_closest_weekday() {
        let monday = p(&[(FieldType::DayOfWeek, 1)]);
        let closest = monday.resolve(&sunday(), Flags::RESOLVE_TO_CLOSEST).unwrap();
        assert_eq!(day_range(&closest), "2016-06-20/2016-06-20");
        let this = monday.resolve(&sunday(), Flags::RESOLVE_TO_THIS).unwrap();
        assert_eq!(day_range(&this), "2016-06-13/2016-06-13");
    }

    #[test]
    fn test_year_of_century_uses_previous_century() {
        let twenties = p(&[(FieldType::YearOfCentury, 20)]);
        assert_eq!(value(&twenties.resolve(&sunday(), Flags::NONE).unwrap()), "1920");
        let ten = p(&[(FieldType::YearOfCentury, 10)]);
        assert_eq!(value(&ten.resolve(&sunday(), Flags::NONE).unwrap()), "2010");
    }

    #[test]
    fn test_ordinal_weekday_of_month() {
        let friday_in_june = p(&[(FieldType::MonthOfYear, 6), (FieldType::DayOfWeek, 5)]);
        let second = Time::ordinal(friday_in_june.clone(), 2);
        assert_eq!(value(&second.resolve(&sunday(), Flags::NONE).unwrap()), "2016-06-10");
        let last = Time::ordinal(friday_in_june.clone(), -1);
        assert_eq!(value(&last.resolve(&sunday(), Flags::NONE).unwrap()), "2016-06-24");
        let sixth = Time::ordinal(friday_in_june, 6);
        assert_eq!(sixth.resolve(&sunday(), Flags::NONE).unwrap(), sixth);
    }

    #[test]
    fn test_ordinal_weekday_without_month() {
        let second_friday = Time::ordinal(p(&[(FieldType::DayOfWeek, 5)]), 2);
        let resolved = second_friday.resolve(&sunday(), Flags::NONE).unwrap();
        assert_eq!(value(&resolved), "2016-06-10");
        assert!(!resolved.has_time_of_day());
    }

    #[test]
    fn test_composite_resolves_to_future() {
        let named = |name: &str| crate::constants::lookup(name).and_then(Temporal::as_time).unwrap();
        let friday_evening = named("friday").intersect(named("evening")).unwrap().unwrap();
        assert!(matches!(friday_evening.kind(), TimeKind::Composite(_)));

        let this = friday_evening.resolve(&sunday(), Flags::NONE).unwrap();
        assert_eq!(value(&this), "2016-06-17TEV");
        let future = friday_evening.resolve(&sunday(), Flags::RESOLVE_TO_FUTURE).unwrap();
        assert_eq!(value(&future), "2016-06-24TEV");
        let past = friday_evening.resolve(&sunday(), Flags::RESOLVE_TO_PAST).unwrap();
        assert_eq!(value(&past), "2016-06-17TEV");
        let closest = friday_evening.resolve(&sunday(), Flags::RESOLVE_TO_CLOSEST).unwrap();
        assert_eq!(closest, this);
    }

    #[test]
    fn test_composite_resolves_to_past() {
        // Saturday 2016-06-25 05:00, before that morning has started.
        let saturday = Time::grounded(
            NaiveDate::from_ymd_opt(2016, 6, 25)
                .unwrap()
                .and_hms_opt(5, 0, 0)
                .unwrap(),
        );
        let named = |name: &str| crate::constants::lookup(name).and_then(Temporal::as_time).unwrap();
        let saturday_morning = named("saturday").intersect(named("morning")).unwrap().unwrap();
        let this = saturday_morning.resolve(&saturday, Flags::NONE).unwrap();
        assert_eq!(value(&this), "2016-06-25TMO");
        let past = saturday_morning.resolve(&saturday, Flags::RESOLVE_TO_PAST).unwrap();
        assert_eq!(value(&past), "2016-06-18TMO");
    }

    #[test]
    fn test_relative_offset_resolves_base_first() {
        let monday = p(&[(FieldType::DayOfWeek, 1)]);
        let week_later = Time::relative(
            monday,
            TemporalOp::OffsetExact,
            Some(Temporal::Duration(Duration::of(TimeUnit::Week, 1))),
            Flags::NONE,
        );
        let resolved = week_later.resolve(&sunday(), Flags::NONE).unwrap();
        assert_eq!(value(&resolved), "2016-06-20");
    }

    #[test]
    fn test_inexact_resolves_parts() {
        let around = Time::inexact(
            Some(Time::reference()),
            Some(Duration::of(TimeUnit::Hour, 2)),
            None,
        );
        let resolved = around.resolve(&sunday(), Flags::NONE).unwrap();
        assert_eq!(resolved.instant(), sunday().instant());
    }
}
