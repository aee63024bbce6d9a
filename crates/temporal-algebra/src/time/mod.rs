//! Time points in all their shapes, from the symbolic reference time to a
//! fully grounded instant.
//!
//! A [`Time`] is one of:
//!
//! | Kind | Example | Grounded? |
//! |---|---|---|
//! | `Reference` | "now" placeholder | no, resolves to the reference |
//! | `Vague` | `PAST_REF` | never |
//! | `Partial` | `{month: 6, day: 19}` | once a year is known |
//! | `Composite` | "weekend morning" | once its slots can be placed |
//! | `Ordinal` | "the 2nd Friday of June" | no, resolves to a partial |
//! | `Relative` | `NEXT(Monday)` | no, resolves to its result |
//! | `Grounded` | `2016-06-19T10:30:00.000` | yes |
//! | `Inexact` | "around noon" | when its range or base is |
//! | `WithRange` | "summer", `[ref-3d, ref]` | when both endpoints are |
//!
//! Resolution lives in `resolve`, intersection in `intersect`, and the
//! slot logic of composite values in `composite`.

mod composite;
mod intersect;
mod resolve;

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub use composite::{CompositeTime, Slot};

use crate::duration::Duration;
use crate::field::TimeUnit;
use crate::flags::{Flags, RangePadding};
use crate::format::{format_instant, format_partial, named_date_range};
use crate::ops::TemporalOp;
use crate::partial::Partial;
use crate::period::Period;
use crate::range::Range;
use crate::temporal::{StandardTemporalType, Temporal, TemporalMeta, TemporalValue, TimexType};

// ── Kinds ───────────────────────────────────────────────────────────────────

/// Times that are known only by a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VagueTime {
    PresentRef,
    PastRef,
    FutureRef,
    Unknown,
}

impl VagueTime {
    pub fn timex(self) -> &'static str {
        match self {
            VagueTime::PresentRef => "PRESENT_REF",
            VagueTime::PastRef => "PAST_REF",
            VagueTime::FutureRef => "FUTURE_REF",
            VagueTime::Unknown => "UNKNOWN",
        }
    }

    pub fn from_timex(s: &str) -> Option<VagueTime> {
        match s {
            "PRESENT_REF" => Some(VagueTime::PresentRef),
            "PAST_REF" => Some(VagueTime::PastRef),
            "FUTURE_REF" => Some(VagueTime::FutureRef),
            "UNKNOWN" => Some(VagueTime::Unknown),
            _ => None,
        }
    }
}

/// The `n`th occurrence of `base`; negative `n` counts from the end.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrdinalTime {
    pub(crate) base: Box<Time>,
    pub(crate) n: i32,
}

/// An operator application evaluated on resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelativeTime {
    pub(crate) base: Box<Time>,
    pub(crate) op: TemporalOp,
    pub(crate) arg: Option<Box<Temporal>>,
    pub(crate) flags: Flags,
}

/// A best guess with an optional uncertainty and fallback range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InexactTime {
    pub(crate) base: Option<Box<Time>>,
    pub(crate) uncertainty: Option<Duration>,
    pub(crate) range: Option<Box<Range>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeKind {
    Reference,
    Vague(VagueTime),
    Partial(Partial),
    Composite(CompositeTime),
    Ordinal(OrdinalTime),
    Relative(RelativeTime),
    Grounded(NaiveDateTime),
    Inexact(InexactTime),
    WithRange(Box<Range>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Time {
    kind: TimeKind,
    meta: TemporalMeta,
}

// ── Construction ────────────────────────────────────────────────────────────

impl Time {
    fn from_kind(kind: TimeKind) -> Self {
        Time {
            kind,
            meta: TemporalMeta::default(),
        }
    }

    /// Placeholder for the reference time, replaced on resolution.
    pub fn reference() -> Self {
        Self::from_kind(TimeKind::Reference)
    }

    pub fn vague(label: VagueTime) -> Self {
        Self::from_kind(TimeKind::Vague(label))
    }

    pub fn partial(partial: Partial) -> Self {
        Self::from_kind(TimeKind::Partial(partial))
    }

    pub fn grounded(instant: NaiveDateTime) -> Self {
        Self::from_kind(TimeKind::Grounded(instant))
    }

    pub fn composite(composite: CompositeTime) -> Self {
        Self::from_kind(TimeKind::Composite(composite))
    }

    pub fn ordinal(base: Time, n: i32) -> Self {
        Self::from_kind(TimeKind::Ordinal(OrdinalTime {
            base: Box::new(base),
            n,
        }))
    }

    pub fn relative(base: Time, op: TemporalOp, arg: Option<Temporal>, flags: Flags) -> Self {
        Self::from_kind(TimeKind::Relative(RelativeTime {
            base: Box::new(base),
            op,
            arg: arg.map(Box::new),
            flags,
        }))
    }

    pub fn inexact(base: Option<Time>, uncertainty: Option<Duration>, range: Option<Range>) -> Self {
        Self::from_kind(TimeKind::Inexact(InexactTime {
            base: base.map(Box::new),
            uncertainty,
            range: range.map(Box::new),
        }))
    }

    pub fn with_range(range: Range) -> Self {
        Self::from_kind(TimeKind::WithRange(Box::new(range)))
    }

    pub(crate) fn with_kind(&self, kind: TimeKind) -> Time {
        Time {
            kind,
            meta: self.meta.clone(),
        }
    }

    pub(crate) fn with_partial(&self, partial: Partial) -> Time {
        self.with_kind(TimeKind::Partial(partial))
    }

    pub fn kind(&self) -> &TimeKind {
        &self.kind
    }

    pub fn as_partial(&self) -> Option<&Partial> {
        match &self.kind {
            TimeKind::Partial(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, TimeKind::Reference)
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// The half-open `[begin, end)` interval this time covers, once grounded.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match &self.kind {
            TimeKind::Grounded(dt) => Some((*dt, Period::of(TimeUnit::Millis, 1).add_to(*dt)?)),
            TimeKind::Partial(p) if p.is_groundable() => {
                let begin = p.begin_instant()?;
                Some((begin, Period::of(p.granularity()?, 1).add_to(begin)?))
            }
            TimeKind::Composite(c) => c.span(),
            TimeKind::WithRange(r) => r.span(),
            TimeKind::Inexact(i) => i
                .range
                .as_ref()
                .and_then(|r| r.span())
                .or_else(|| i.base.as_ref().and_then(|b| b.span())),
            _ => None,
        }
    }

    /// The first instant this time covers.
    pub fn instant(&self) -> Option<NaiveDateTime> {
        match &self.kind {
            TimeKind::Grounded(dt) => Some(*dt),
            _ => self.span().map(|(begin, _)| begin),
        }
    }

    pub fn is_grounded(&self) -> bool {
        match &self.kind {
            TimeKind::Grounded(_) => true,
            TimeKind::Partial(p) => p.is_groundable(),
            TimeKind::WithRange(r) => r.is_grounded(),
            TimeKind::Composite(_) | TimeKind::Inexact(_) => self.span().is_some(),
            TimeKind::Reference
            | TimeKind::Vague(_)
            | TimeKind::Ordinal(_)
            | TimeKind::Relative(_) => false,
        }
    }

    /// Finest unit this time specifies.
    pub fn granularity(&self) -> Option<TimeUnit> {
        match &self.kind {
            TimeKind::Grounded(_) => Some(TimeUnit::Millis),
            TimeKind::Partial(p) => p.granularity(),
            TimeKind::Composite(c) => c.granularity(),
            TimeKind::Ordinal(o) => o.base.granularity(),
            TimeKind::WithRange(_) | TimeKind::Inexact(_) => self
                .span()
                .and_then(|(b, e)| Period::between(b, e).finest_unit()),
            _ => None,
        }
    }

    pub fn has_time_of_day(&self) -> bool {
        match &self.kind {
            TimeKind::Partial(p) => p.has_time_of_day(),
            TimeKind::Composite(c) => c.has_time_of_day(),
            TimeKind::Grounded(_) => true,
            _ => self.granularity().is_some_and(TimeUnit::is_time_of_day),
        }
    }

    /// How long this time lasts.
    pub fn duration(&self) -> Option<Duration> {
        match &self.kind {
            TimeKind::Partial(p) => p.granularity().map(|unit| Duration::of(unit, 1)),
            TimeKind::Composite(c) => c
                .span()
                .map(|(b, e)| Duration::from_period(Period::between(b, e))),
            TimeKind::WithRange(r) => r.duration().cloned(),
            TimeKind::Inexact(i) => i
                .range
                .as_ref()
                .and_then(|r| r.duration().cloned())
                .or_else(|| i.base.as_ref().and_then(|b| b.duration())),
            TimeKind::Ordinal(o) => o.base.duration(),
            _ => None,
        }
    }

    /// The range this time covers, padded per `padding`.
    pub fn range(&self, padding: RangePadding) -> Option<Range> {
        match &self.kind {
            TimeKind::Partial(p) => partial_range(self, p, padding),
            TimeKind::Grounded(_) | TimeKind::Reference => {
                Some(Range::new(Some(self.clone()), Some(self.clone()), None))
            }
            TimeKind::Composite(c) => {
                let Some(unit) = padding_unit(padding, c.has_time_of_day()) else {
                    return Some(Range::new(Some(self.clone()), Some(self.clone()), self.duration()));
                };
                let (begin, end) = c.span()?;
                Range::from_span(begin, end, unit, None)
            }
            TimeKind::WithRange(r) => Some((**r).clone()),
            TimeKind::Inexact(i) => i
                .range
                .as_deref()
                .cloned()
                .or_else(|| i.base.as_ref().and_then(|b| b.range(padding))),
            TimeKind::Vague(_) | TimeKind::Ordinal(_) | TimeKind::Relative(_) => None,
        }
    }

    /// This time with unset fields filled down to `unit`.
    pub fn padded(&self, unit: TimeUnit) -> Time {
        match &self.kind {
            TimeKind::Partial(p) => self.with_partial(p.pad_more_specific_fields(unit)),
            _ => self.clone(),
        }
    }

    /// Drops fields finer than `unit` from a partial value.
    pub(crate) fn discard_finer_than(&self, unit: TimeUnit) -> Time {
        match &self.kind {
            TimeKind::Partial(p) => self.with_partial(p.discard_finer_than(unit)),
            _ => self.clone(),
        }
    }

    // ── Arithmetic ──────────────────────────────────────────────────────

    fn deferred(&self, op: TemporalOp, arg: Temporal) -> Time {
        Time::relative(self.clone(), op, Some(arg), Flags::NONE)
    }

    /// Moves this time by a duration. Values that cannot be moved until they
    /// are grounded come back as a deferred offset.
    pub fn add(&self, duration: &Duration) -> Time {
        let deferred = || self.deferred(TemporalOp::OffsetExact, Temporal::Duration(duration.clone()));
        let Some(period) = duration.period() else {
            return self.clone();
        };
        match &self.kind {
            TimeKind::Grounded(dt) => period
                .add_to(*dt)
                .map(|moved| self.with_kind(TimeKind::Grounded(moved)))
                .unwrap_or_else(deferred),
            TimeKind::Partial(p) => p
                .add_period(&period)
                .map(|moved| self.with_partial(moved))
                .unwrap_or_else(deferred),
            TimeKind::Composite(_) => match self.range(RangePadding::Auto) {
                Some(range) => self.with_kind(TimeKind::WithRange(Box::new(
                    range.offset(duration, Flags::NONE),
                ))),
                None => deferred(),
            },
            TimeKind::WithRange(r) if r.is_grounded() => {
                self.with_kind(TimeKind::WithRange(Box::new(r.offset(duration, Flags::NONE))))
            }
            TimeKind::Inexact(i) if self.is_grounded() => self.with_kind(TimeKind::Inexact(InexactTime {
                base: i.base.as_ref().map(|b| Box::new(b.add(duration))),
                uncertainty: i.uncertainty.clone(),
                range: i
                    .range
                    .as_ref()
                    .map(|r| Box::new(r.offset(duration, Flags::NONE))),
            })),
            _ => deferred(),
        }
    }

    pub fn subtract(&self, duration: &Duration) -> Time {
        self.add(&duration.negated())
    }

    /// The step between consecutive occurrences: the standard type's
    /// period, else the cycle of the most general field, else one unit of
    /// granularity.
    pub fn natural_step(&self) -> Option<Period> {
        if let Some(unit) = self.meta.standard_type.and_then(StandardTemporalType::period_unit) {
            return Some(Period::of(unit, 1));
        }
        match &self.kind {
            TimeKind::Partial(p) => p
                .natural_period()
                .or_else(|| p.granularity())
                .map(|unit| Period::of(unit, 1)),
            TimeKind::Composite(c) => c.natural_period().map(|unit| Period::of(unit, 1)),
            TimeKind::Ordinal(o) => o.base.natural_step(),
            TimeKind::Inexact(i) => i.base.as_ref().and_then(|b| b.natural_step()),
            TimeKind::WithRange(r) => r.duration().and_then(Duration::period),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Time> {
        self.natural_step()
            .map(|step| self.add(&Duration::from_period(step)))
    }

    pub fn prev(&self) -> Option<Time> {
        self.natural_step()
            .map(|step| self.subtract(&Duration::from_period(step)))
    }

    /// Orders grounded times by their first instant.
    pub fn compare(&self, other: &Time) -> Option<Ordering> {
        Some(self.instant()?.cmp(&other.instant()?))
    }

    /// The candidate whose first instant is nearest this time's.
    pub fn closest<'a>(&self, candidates: &'a [Time]) -> Option<&'a Time> {
        let anchor = self.instant()?;
        candidates
            .iter()
            .filter_map(|c| c.instant().map(|i| ((i - anchor).abs(), c)))
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, c)| c)
    }

    /// Canonical value honoring `FORMAT_PAD_UNKNOWN`.
    pub fn timex_value_with(&self, flags: Flags) -> Option<String> {
        let pad = flags.contains(Flags::FORMAT_PAD_UNKNOWN);
        match &self.kind {
            TimeKind::Reference => Some(VagueTime::PresentRef.timex().to_string()),
            TimeKind::Vague(v) => Some(v.timex().to_string()),
            TimeKind::Partial(p) => format_partial(p, pad),
            TimeKind::Grounded(dt) => Some(format_instant(*dt)),
            TimeKind::Composite(c) => c
                .span()
                .and_then(|(b, e)| named_date_range(b, e))
                .or_else(|| Some(c.label_form())),
            TimeKind::WithRange(r) => {
                if let Some(named) = r.span().and_then(|(b, e)| named_date_range(b, e)) {
                    return Some(named);
                }
                match (r.is_grounded(), Slot::of(self), self.label()) {
                    (false, Some(slot), Some(label)) => Some(slot.unanchored_form(label)),
                    _ => r.timex_value(),
                }
            }
            TimeKind::Inexact(i) => i
                .range
                .as_ref()
                .and_then(|r| r.timex_value())
                .or_else(|| i.base.as_ref().and_then(|b| b.timex_value_with(flags))),
            TimeKind::Ordinal(_) | TimeKind::Relative(_) => None,
        }
    }
}

fn padding_unit(padding: RangePadding, has_time_of_day: bool) -> Option<TimeUnit> {
    match padding {
        RangePadding::None => None,
        RangePadding::Auto if has_time_of_day => Some(TimeUnit::Millis),
        RangePadding::Auto => Some(TimeUnit::Day),
        RangePadding::Finest => Some(TimeUnit::Millis),
        RangePadding::Specified(unit) => Some(unit),
    }
}

/// `[begin, end]` of a partial value: begin is the value padded down to the
/// padding unit, end is begin plus one granule of the value minus one
/// padding unit.
fn partial_range(time: &Time, p: &Partial, padding: RangePadding) -> Option<Range> {
    let granularity = p.granularity()?;
    let duration = Duration::of(granularity, 1);
    let Some(unit) = padding_unit(padding, p.has_time_of_day()) else {
        return Some(Range::new(Some(time.clone()), Some(time.clone()), Some(duration)));
    };
    let unit = unit.min(granularity);
    if p.is_groundable() {
        let begin = p.begin_instant()?;
        let end = Period::of(granularity, 1).add_to(begin)?;
        if let Some(range) = Range::from_span(begin, end, unit, Some(duration.clone())) {
            return Some(range);
        }
    }
    let begin = p.pad_more_specific_fields(unit);
    let last = Period::of(granularity, 1).minus(&Period::of(unit, 1));
    let end = begin.shift_within_cycle(&last)?;
    Some(Range::new(
        Some(time.with_partial(begin)),
        Some(time.with_partial(end)),
        Some(duration),
    ))
}

impl TemporalValue for Time {
    fn meta(&self) -> &TemporalMeta {
        &self.meta
    }

    fn with_meta(&self, meta: TemporalMeta) -> Self {
        Time {
            kind: self.kind.clone(),
            meta,
        }
    }

    fn timex_type(&self) -> TimexType {
        if let Some(t) = self.meta.standard_type {
            return t.timex_type();
        }
        match &self.kind {
            TimeKind::Reference | TimeKind::Vague(_) => TimexType::Date,
            TimeKind::Grounded(_) => TimexType::Time,
            TimeKind::Relative(r) => r.base.timex_type(),
            TimeKind::Inexact(i) => i
                .base
                .as_ref()
                .map_or(TimexType::Date, |b| b.timex_type()),
            _ if self.has_time_of_day() => TimexType::Time,
            _ => TimexType::Date,
        }
    }

    fn timex_value(&self) -> Option<String> {
        self.timex_value_with(Flags::NONE)
    }

    fn full_string(&self) -> String {
        match &self.kind {
            TimeKind::Reference => "REF".to_string(),
            TimeKind::Vague(v) => v.timex().to_string(),
            TimeKind::Partial(p) => format_partial(p, true).unwrap_or_else(|| "{}".to_string()),
            TimeKind::Grounded(dt) => format_instant(*dt),
            TimeKind::Composite(c) => c.label_form(),
            TimeKind::Ordinal(o) => format!("ORDINAL({}, {})", o.n, o.base.full_string()),
            TimeKind::Relative(r) => match &r.arg {
                Some(arg) => format!("{}({}, {})", r.op, r.base.full_string(), arg.full_string()),
                None => format!("{}({})", r.op, r.base.full_string()),
            },
            TimeKind::Inexact(i) => {
                let base = i.base.as_ref().map_or_else(|| "?".to_string(), |b| b.full_string());
                match &i.range {
                    Some(r) => format!("~{base} {}", r.full_string()),
                    None => format!("~{base}"),
                }
            }
            TimeKind::WithRange(r) => match self.label() {
                Some(label) => format!("{label}{}", r.full_string()),
                None => r.full_string(),
            },
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timex_value() {
            Some(v) => f.write_str(&v),
            None => f.write_str(&self.full_string()),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use chrono::NaiveDate;

    fn p(fields: &[(FieldType, i32)]) -> Time {
        Time::partial(Partial::from_fields(fields).unwrap())
    }

    fn range_string(t: &Time) -> String {
        t.range(RangePadding::Auto).unwrap().timex_value().unwrap()
    }

    #[test]
    fn test_partial_range_pads_to_day() {
        let june = p(&[(FieldType::Year, 2016), (FieldType::MonthOfYear, 6)]);
        assert_eq!(range_string(&june), "2016-06-01/2016-06-30");
        let week = p(&[(FieldType::Year, 2016), (FieldType::WeekOfYear, 24)]);
        assert_eq!(range_string(&week), "2016-06-13/2016-06-19");
    }

    #[test]
    fn test_partial_range_without_year() {
        let june = p(&[(FieldType::MonthOfYear, 6)]);
        assert_eq!(range_string(&june), "XXXX-06-01/XXXX-06-30");
    }

    #[test]
    fn test_partial_range_with_time_pads_to_millis() {
        let ten = p(&[
            (FieldType::Year, 2016),
            (FieldType::MonthOfYear, 6),
            (FieldType::DayOfMonth, 19),
            (FieldType::HourOfDay, 10),
        ]);
        assert_eq!(
            range_string(&ten),
            "2016-06-19T10:00:00.000/2016-06-19T10:59:59.999"
        );
    }

    #[test]
    fn test_composite_range_padding() {
        let weekend = crate::parse::parse_time_value("2016-W24-WE").unwrap();
        assert!(matches!(weekend.kind(), TimeKind::Composite(_)));
        assert_eq!(range_string(&weekend), "2016-06-18/2016-06-19");

        let instant_only = weekend.range(RangePadding::None).unwrap();
        assert_eq!(instant_only.begin(), Some(&weekend));
        assert_eq!(instant_only.end(), Some(&weekend));
        assert_eq!(instant_only.span(), weekend.span());
    }

    #[test]
    fn test_add_defers_ungrounded() {
        let monday = p(&[(FieldType::DayOfWeek, 1)]);
        let later = monday.add(&Duration::of(TimeUnit::Week, 1));
        assert!(matches!(later.kind(), TimeKind::Relative(_)));

        let june = p(&[(FieldType::Year, 2016), (FieldType::MonthOfYear, 6)]);
        assert_eq!(
            june.add(&Duration::of(TimeUnit::Month, 1)).timex_value().unwrap(),
            "2016-07"
        );
    }

    #[test]
    fn test_natural_step() {
        let monday = p(&[(FieldType::DayOfWeek, 1)]);
        assert_eq!(monday.natural_step(), Some(Period::of(TimeUnit::Week, 1)));
        let june_2016 = p(&[(FieldType::Year, 2016), (FieldType::MonthOfYear, 6)]);
        assert_eq!(june_2016.natural_step(), Some(Period::of(TimeUnit::Month, 1)));
    }

    #[test]
    fn test_closest() {
        let at = |d| {
            Time::grounded(NaiveDate::from_ymd_opt(2016, 6, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
        };
        let candidates = [at(10), at(18), at(27)];
        assert_eq!(at(19).closest(&candidates), Some(&candidates[1]));
    }

    #[test]
    fn test_vague_labels() {
        assert_eq!(Time::vague(VagueTime::PastRef).timex_value().unwrap(), "PAST_REF");
        assert_eq!(Time::reference().timex_value().unwrap(), "PRESENT_REF");
        assert_eq!(VagueTime::from_timex("FUTURE_REF"), Some(VagueTime::FutureRef));
    }
}
