//! The root [`Temporal`] sum type and the metadata every value carries.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::duration::Duration;
use crate::error::Result;
use crate::field::TimeUnit;
use crate::flags::{Flags, RangePadding};
use crate::range::Range;
use crate::set::TemporalSet;
use crate::time::Time;

// ── Metadata ────────────────────────────────────────────────────────────────

/// TIMEX3 `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimexType {
    Date,
    Time,
    Duration,
    Set,
}

impl fmt::Display for TimexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimexType::Date => "DATE",
            TimexType::Time => "TIME",
            TimexType::Duration => "DURATION",
            TimexType::Set => "SET",
        })
    }
}

/// Category of a named temporal value. Decides the unit a value steps by in
/// `next`/`prev` and which composite slot it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StandardTemporalType {
    RefDate,
    RefTime,
    TimeOfDay,
    DayOfWeek,
    DayOfMonth,
    WeekOfYear,
    MonthOfYear,
    QuarterOfYear,
    HalfOfYear,
    SeasonOfYear,
    PartOfYear,
    Year,
}

impl StandardTemporalType {
    pub fn timex_type(self) -> TimexType {
        match self {
            StandardTemporalType::RefTime | StandardTemporalType::TimeOfDay => TimexType::Time,
            _ => TimexType::Date,
        }
    }

    /// The cycle one occurrence repeats within.
    pub fn period_unit(self) -> Option<TimeUnit> {
        match self {
            StandardTemporalType::RefDate
            | StandardTemporalType::RefTime
            | StandardTemporalType::Year => None,
            StandardTemporalType::TimeOfDay => Some(TimeUnit::Day),
            StandardTemporalType::DayOfWeek => Some(TimeUnit::Week),
            StandardTemporalType::DayOfMonth => Some(TimeUnit::Month),
            StandardTemporalType::WeekOfYear
            | StandardTemporalType::MonthOfYear
            | StandardTemporalType::QuarterOfYear
            | StandardTemporalType::HalfOfYear
            | StandardTemporalType::SeasonOfYear
            | StandardTemporalType::PartOfYear => Some(TimeUnit::Year),
        }
    }

    /// The length of one occurrence, when it is a whole unit.
    pub fn unit(self) -> Option<TimeUnit> {
        match self {
            StandardTemporalType::DayOfWeek | StandardTemporalType::DayOfMonth => {
                Some(TimeUnit::Day)
            }
            StandardTemporalType::WeekOfYear => Some(TimeUnit::Week),
            StandardTemporalType::MonthOfYear => Some(TimeUnit::Month),
            StandardTemporalType::QuarterOfYear | StandardTemporalType::SeasonOfYear => {
                Some(TimeUnit::Quarter)
            }
            StandardTemporalType::HalfOfYear => Some(TimeUnit::HalfYear),
            StandardTemporalType::Year => Some(TimeUnit::Year),
            _ => None,
        }
    }
}

/// Annotations shared by every temporal value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TemporalMeta {
    /// TIMEX3 `mod`, e.g. `BEFORE`, `APPROX`, `START`.
    pub modifier: Option<String>,
    pub approx: bool,
    pub standard_type: Option<StandardTemporalType>,
    /// Short slot code such as `MO`, `SU` or `WE`.
    pub label: Option<String>,
}

/// Metadata access and the formatting contract common to all temporal
/// values. The `with_*` methods return modified copies.
pub trait TemporalValue: Clone {
    fn meta(&self) -> &TemporalMeta;

    fn with_meta(&self, meta: TemporalMeta) -> Self;

    fn timex_type(&self) -> TimexType;

    /// Canonical TIMEX3 value, when one exists.
    fn timex_value(&self) -> Option<String>;

    /// Non-canonical rendering used for `alt_value` and diagnostics.
    fn full_string(&self) -> String;

    fn with_modifier(&self, modifier: impl Into<String>) -> Self {
        let mut meta = self.meta().clone();
        meta.modifier = Some(modifier.into());
        self.with_meta(meta)
    }

    fn with_approx(&self, approx: bool) -> Self {
        let mut meta = self.meta().clone();
        meta.approx = approx;
        self.with_meta(meta)
    }

    fn with_standard_type(&self, standard_type: StandardTemporalType) -> Self {
        let mut meta = self.meta().clone();
        meta.standard_type = Some(standard_type);
        self.with_meta(meta)
    }

    fn with_label(&self, label: impl Into<String>) -> Self {
        let mut meta = self.meta().clone();
        meta.label = Some(label.into());
        self.with_meta(meta)
    }

    fn modifier(&self) -> Option<&str> {
        self.meta().modifier.as_deref()
    }

    fn is_approx(&self) -> bool {
        self.meta().approx
    }

    fn standard_type(&self) -> Option<StandardTemporalType> {
        self.meta().standard_type
    }

    fn label(&self) -> Option<&str> {
        self.meta().label.as_deref()
    }
}

// ── Temporal ────────────────────────────────────────────────────────────────

/// Any temporal value: a point, a length, an interval, or a set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Temporal {
    Time(Time),
    Duration(Duration),
    Range(Range),
    Set(TemporalSet),
}

impl Temporal {
    pub fn as_time(&self) -> Option<&Time> {
        match self {
            Temporal::Time(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Temporal::Duration(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&Range> {
        match self {
            Temporal::Range(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&TemporalSet> {
        match self {
            Temporal::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Grounds this value against `reference`.
    pub fn resolve(&self, reference: &Time, flags: Flags) -> Result<Temporal> {
        Ok(match self {
            Temporal::Time(t) => Temporal::Time(t.resolve(reference, flags)?),
            Temporal::Duration(d) => Temporal::Duration(d.resolve(reference, flags)?),
            Temporal::Range(r) => Temporal::Range(r.resolve(reference, flags)?),
            Temporal::Set(s) => Temporal::Set(s.resolve(reference, flags)?),
        })
    }

    pub fn is_grounded(&self) -> bool {
        match self {
            Temporal::Time(t) => t.is_grounded(),
            Temporal::Duration(_) => true,
            Temporal::Range(r) => r.is_grounded(),
            Temporal::Set(_) => false,
        }
    }

    /// The following occurrence. Durations become "the next such unit".
    pub fn next(&self) -> Option<Temporal> {
        match self {
            Temporal::Time(t) => t.next().map(Temporal::Time),
            Temporal::Duration(d) => Some(Temporal::Time(d.next())),
            Temporal::Range(r) => r.next().map(Temporal::Range),
            Temporal::Set(_) => None,
        }
    }

    pub fn prev(&self) -> Option<Temporal> {
        match self {
            Temporal::Time(t) => t.prev().map(Temporal::Time),
            Temporal::Duration(d) => Some(Temporal::Time(d.prev())),
            Temporal::Range(r) => r.prev().map(Temporal::Range),
            Temporal::Set(_) => None,
        }
    }

    /// Intersection of two values. `Ok(None)` when nothing satisfies both.
    pub fn intersect(&self, other: &Temporal) -> Result<Option<Temporal>> {
        Ok(match (self, other) {
            (Temporal::Time(a), Temporal::Time(b)) => a.intersect(b)?.map(Temporal::Time),
            (Temporal::Range(a), Temporal::Range(b)) => a.intersect(b).map(Temporal::Range),
            (Temporal::Time(t), Temporal::Range(r)) | (Temporal::Range(r), Temporal::Time(t)) => t
                .range(RangePadding::Auto)
                .and_then(|tr| r.intersect(&tr))
                .map(Temporal::Range),
            (Temporal::Duration(a), Temporal::Duration(b)) => {
                Some(Temporal::Duration(a.intersect(b)))
            }
            (Temporal::Set(s), other) | (other, Temporal::Set(s)) => {
                s.intersect(other)?.map(Temporal::Set)
            }
            (Temporal::Duration(_), _) | (_, Temporal::Duration(_)) => None,
        })
    }

    pub fn duration(&self) -> Option<Duration> {
        match self {
            Temporal::Time(t) => t.duration(),
            Temporal::Duration(d) => Some(d.clone()),
            Temporal::Range(r) => r.duration().cloned(),
            Temporal::Set(_) => None,
        }
    }

    pub fn range(&self) -> Option<Range> {
        match self {
            Temporal::Time(t) => t.range(RangePadding::Auto),
            Temporal::Range(r) => Some(r.clone()),
            Temporal::Duration(_) | Temporal::Set(_) => None,
        }
    }

    /// `alt_value` content: a full rendering when the canonical value is
    /// missing or does not capture the value (duration ranges).
    pub fn alt_value(&self) -> Option<String> {
        match self {
            Temporal::Duration(d) if d.is_range() => Some(d.full_string()),
            _ if self.timex_value().is_none() => Some(self.full_string()),
            _ => None,
        }
    }
}

impl TemporalValue for Temporal {
    fn meta(&self) -> &TemporalMeta {
        match self {
            Temporal::Time(t) => t.meta(),
            Temporal::Duration(d) => d.meta(),
            Temporal::Range(r) => r.meta(),
            Temporal::Set(s) => s.meta(),
        }
    }

    fn with_meta(&self, meta: TemporalMeta) -> Self {
        match self {
            Temporal::Time(t) => Temporal::Time(t.with_meta(meta)),
            Temporal::Duration(d) => Temporal::Duration(d.with_meta(meta)),
            Temporal::Range(r) => Temporal::Range(r.with_meta(meta)),
            Temporal::Set(s) => Temporal::Set(s.with_meta(meta)),
        }
    }

    fn timex_type(&self) -> TimexType {
        match self {
            Temporal::Time(t) => t.timex_type(),
            Temporal::Duration(d) => d.timex_type(),
            Temporal::Range(r) => r.timex_type(),
            Temporal::Set(s) => s.timex_type(),
        }
    }

    fn timex_value(&self) -> Option<String> {
        match self {
            Temporal::Time(t) => t.timex_value(),
            Temporal::Duration(d) => d.timex_value(),
            Temporal::Range(r) => r.timex_value(),
            Temporal::Set(s) => s.timex_value(),
        }
    }

    fn full_string(&self) -> String {
        match self {
            Temporal::Time(t) => t.full_string(),
            Temporal::Duration(d) => d.full_string(),
            Temporal::Range(r) => r.full_string(),
            Temporal::Set(s) => s.full_string(),
        }
    }
}

impl From<Time> for Temporal {
    fn from(t: Time) -> Self {
        Temporal::Time(t)
    }
}

impl From<Duration> for Temporal {
    fn from(d: Duration) -> Self {
        Temporal::Duration(d)
    }
}

impl From<Range> for Temporal {
    fn from(r: Range) -> Self {
        Temporal::Range(r)
    }
}

impl From<TemporalSet> for Temporal {
    fn from(s: TemporalSet) -> Self {
        Temporal::Set(s)
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.timex_value() {
            Some(v) => f.write_str(&v),
            None => f.write_str(&self.full_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldType;
    use crate::partial::Partial;

    #[test]
    fn test_with_modifier_returns_copy() {
        let june = Time::partial(Partial::from_fields(&[(FieldType::MonthOfYear, 6)]).unwrap());
        let early = june.with_modifier("START");
        assert_eq!(early.modifier(), Some("START"));
        assert_eq!(june.modifier(), None);
    }

    #[test]
    fn test_standard_type_units() {
        assert_eq!(StandardTemporalType::DayOfWeek.period_unit(), Some(TimeUnit::Week));
        assert_eq!(StandardTemporalType::SeasonOfYear.unit(), Some(TimeUnit::Quarter));
        assert_eq!(StandardTemporalType::TimeOfDay.timex_type(), TimexType::Time);
    }

    #[test]
    fn test_duration_intersect_picks_shorter() {
        let week: Temporal = Duration::of(TimeUnit::Week, 1).into();
        let day: Temporal = Duration::of(TimeUnit::Day, 1).into();
        assert_eq!(week.intersect(&day).unwrap(), Some(day.clone()));
    }
}
