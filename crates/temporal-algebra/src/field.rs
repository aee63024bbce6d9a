//! Calendar field vocabulary and the generality ordering over it.
//!
//! Two closed enumerations live here:
//!
//! - [`TimeUnit`]: the units a duration can be counted in, ordered from the
//!   finest (millisecond) to the most general (era). The derived `Ord` *is*
//!   the generality ordering.
//! - [`FieldType`]: the fields a [`Partial`](crate::partial::Partial) can
//!   assign. Each field is described by the unit it counts (its duration
//!   unit) and the unit it cycles within (its range unit): `MonthOfYear`
//!   counts months within a year, `DayOfWeek` counts days within a week.
//!
//! Week-of-year and day-of-week form a parallel "week branch": they cannot be
//! combined with the month chain (month, day-of-month, ...) without going
//! through a concrete date first.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── TimeUnit ────────────────────────────────────────────────────────────────

/// Units of elapsed calendar time, finest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Millis,
    Second,
    Minute,
    Hour,
    HalfDay,
    Day,
    Week,
    Month,
    Quarter,
    HalfYear,
    Year,
    Decade,
    Century,
    Millennium,
    Era,
}

impl TimeUnit {
    /// All units, finest first.
    pub const ALL: [TimeUnit; 15] = [
        TimeUnit::Millis,
        TimeUnit::Second,
        TimeUnit::Minute,
        TimeUnit::Hour,
        TimeUnit::HalfDay,
        TimeUnit::Day,
        TimeUnit::Week,
        TimeUnit::Month,
        TimeUnit::Quarter,
        TimeUnit::HalfYear,
        TimeUnit::Year,
        TimeUnit::Decade,
        TimeUnit::Century,
        TimeUnit::Millennium,
        TimeUnit::Era,
    ];

    /// Average length in milliseconds (Gregorian year of 365.2425 days).
    /// `None` for [`TimeUnit::Era`], which has no fixed length.
    pub fn approx_millis(self) -> Option<i64> {
        const DAY: i64 = 86_400_000;
        const MONTH: i64 = 2_629_746_000;
        Some(match self {
            TimeUnit::Millis => 1,
            TimeUnit::Second => 1_000,
            TimeUnit::Minute => 60_000,
            TimeUnit::Hour => 3_600_000,
            TimeUnit::HalfDay => DAY / 2,
            TimeUnit::Day => DAY,
            TimeUnit::Week => 7 * DAY,
            TimeUnit::Month => MONTH,
            TimeUnit::Quarter => 3 * MONTH,
            TimeUnit::HalfYear => 6 * MONTH,
            TimeUnit::Year => 12 * MONTH,
            TimeUnit::Decade => 120 * MONTH,
            TimeUnit::Century => 1_200 * MONTH,
            TimeUnit::Millennium => 12_000 * MONTH,
            TimeUnit::Era => return None,
        })
    }

    /// The finer unit a division remainder is redistributed into, and how
    /// many of it make one of `self`. `month → 30 days` is approximate.
    pub fn finer_split(self) -> Option<(TimeUnit, i64)> {
        match self {
            TimeUnit::Century => Some((TimeUnit::Year, 100)),
            TimeUnit::Year => Some((TimeUnit::Month, 12)),
            TimeUnit::HalfDay => Some((TimeUnit::Hour, 12)),
            TimeUnit::Day => Some((TimeUnit::Hour, 24)),
            TimeUnit::Hour => Some((TimeUnit::Minute, 60)),
            TimeUnit::Minute => Some((TimeUnit::Second, 60)),
            TimeUnit::Second => Some((TimeUnit::Millis, 1000)),
            TimeUnit::Month => Some((TimeUnit::Day, 30)),
            TimeUnit::Week => Some((TimeUnit::Day, 7)),
            _ => None,
        }
    }

    /// Months per unit for the year-section units, `None` otherwise.
    pub(crate) fn months_factor(self) -> Option<i64> {
        match self {
            TimeUnit::Month => Some(1),
            TimeUnit::Quarter => Some(3),
            TimeUnit::HalfYear => Some(6),
            TimeUnit::Year => Some(12),
            TimeUnit::Decade => Some(120),
            TimeUnit::Century => Some(1_200),
            TimeUnit::Millennium => Some(12_000),
            _ => None,
        }
    }

    /// Days per unit for week and day, `None` otherwise.
    pub(crate) fn days_factor(self) -> Option<i64> {
        match self {
            TimeUnit::Week => Some(7),
            TimeUnit::Day => Some(1),
            _ => None,
        }
    }

    /// Milliseconds per unit for the time-of-day units, `None` otherwise.
    pub(crate) fn millis_factor(self) -> Option<i64> {
        match self {
            TimeUnit::HalfDay => Some(43_200_000),
            TimeUnit::Hour => Some(3_600_000),
            TimeUnit::Minute => Some(60_000),
            TimeUnit::Second => Some(1_000),
            TimeUnit::Millis => Some(1),
            _ => None,
        }
    }

    /// Single-letter code used in TIMEX3 duration values.
    pub fn timex_code(self) -> Option<char> {
        match self {
            TimeUnit::Millennium => Some('L'),
            TimeUnit::Century => Some('C'),
            TimeUnit::Decade => Some('E'),
            TimeUnit::Year => Some('Y'),
            TimeUnit::Quarter => Some('Q'),
            TimeUnit::Month => Some('M'),
            TimeUnit::Week => Some('W'),
            TimeUnit::Day => Some('D'),
            TimeUnit::Hour => Some('H'),
            TimeUnit::Minute => Some('M'),
            TimeUnit::Second => Some('S'),
            _ => None,
        }
    }

    /// True for units shorter than a day.
    pub fn is_time_of_day(self) -> bool {
        self < TimeUnit::Day
    }

    /// The fields that identify one occurrence of this unit on the calendar,
    /// e.g. a week is identified by (year, week-of-year).
    pub fn truncation_fields(self) -> Option<&'static [FieldType]> {
        use FieldType::*;
        Some(match self {
            TimeUnit::Century => &[Century],
            TimeUnit::Decade => &[Century, DecadeOfCentury],
            TimeUnit::Year => &[Year],
            TimeUnit::HalfYear => &[Year, HalfYear],
            TimeUnit::Quarter => &[Year, Quarter],
            TimeUnit::Month => &[Year, MonthOfYear],
            TimeUnit::Week => &[Year, WeekOfYear],
            TimeUnit::Day => &[Year, MonthOfYear, DayOfMonth],
            TimeUnit::HalfDay => &[Year, MonthOfYear, DayOfMonth, HalfDay],
            TimeUnit::Hour => &[Year, MonthOfYear, DayOfMonth, HourOfDay],
            TimeUnit::Minute => &[Year, MonthOfYear, DayOfMonth, HourOfDay, MinuteOfHour],
            TimeUnit::Second => &[
                Year,
                MonthOfYear,
                DayOfMonth,
                HourOfDay,
                MinuteOfHour,
                SecondOfMinute,
            ],
            TimeUnit::Millis => &FULL_FIELDS,
            TimeUnit::Millennium | TimeUnit::Era => return None,
        })
    }

    /// Unit lookup by name, accepting singular and plural English forms.
    pub fn from_name(name: &str) -> Option<TimeUnit> {
        let name = name.trim().to_ascii_lowercase();
        if name == "ms" {
            return Some(TimeUnit::Millis);
        }
        let name = name.strip_suffix('s').unwrap_or(&name);
        Some(match name {
            "milli" | "millisecond" => TimeUnit::Millis,
            "second" | "sec" => TimeUnit::Second,
            "minute" | "min" => TimeUnit::Minute,
            "hour" => TimeUnit::Hour,
            "halfday" | "half-day" => TimeUnit::HalfDay,
            "day" => TimeUnit::Day,
            "week" => TimeUnit::Week,
            "month" => TimeUnit::Month,
            "quarter" => TimeUnit::Quarter,
            "halfyear" | "half-year" => TimeUnit::HalfYear,
            "year" => TimeUnit::Year,
            "decade" => TimeUnit::Decade,
            "century" | "centurie" => TimeUnit::Century,
            "millennium" | "millennia" | "millenium" => TimeUnit::Millennium,
            "era" => TimeUnit::Era,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            TimeUnit::Millis => "millis",
            TimeUnit::Second => "second",
            TimeUnit::Minute => "minute",
            TimeUnit::Hour => "hour",
            TimeUnit::HalfDay => "halfday",
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
            TimeUnit::Month => "month",
            TimeUnit::Quarter => "quarter",
            TimeUnit::HalfYear => "halfyear",
            TimeUnit::Year => "year",
            TimeUnit::Decade => "decade",
            TimeUnit::Century => "century",
            TimeUnit::Millennium => "millennium",
            TimeUnit::Era => "era",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── FieldType ───────────────────────────────────────────────────────────────

/// The fields of a partial calendar value.
///
/// Declaration order is the storage order inside a `Partial` (roughly most
/// general first); use [`FieldType::is_more_general_than`] for generality.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Era,
    Century,
    DecadeOfCentury,
    Year,
    YearOfCentury,
    HalfYear,
    Quarter,
    MonthOfYear,
    WeekOfYear,
    WeekOfMonth,
    DayOfMonth,
    DayOfWeek,
    DayOfYear,
    HalfDay,
    HourOfDay,
    HourOfHalfDay,
    MinuteOfHour,
    SecondOfMinute,
    MillisOfSecond,
}

/// Year, month, day, hour, minute, second, millisecond: the shape of a fully
/// specified instant.
pub const FULL_FIELDS: [FieldType; 7] = [
    FieldType::Year,
    FieldType::MonthOfYear,
    FieldType::DayOfMonth,
    FieldType::HourOfDay,
    FieldType::MinuteOfHour,
    FieldType::SecondOfMinute,
    FieldType::MillisOfSecond,
];

/// Which chain of fields a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Fields valid alongside either chain (year, time of day, ...).
    Common,
    /// Month-based chain: half-year, quarter, month, week-of-month, day-of-month.
    Month,
    /// ISO week chain: week-of-year.
    Week,
}

impl FieldType {
    pub const ALL: [FieldType; 19] = [
        FieldType::Era,
        FieldType::Century,
        FieldType::DecadeOfCentury,
        FieldType::Year,
        FieldType::YearOfCentury,
        FieldType::HalfYear,
        FieldType::Quarter,
        FieldType::MonthOfYear,
        FieldType::WeekOfYear,
        FieldType::WeekOfMonth,
        FieldType::DayOfMonth,
        FieldType::DayOfWeek,
        FieldType::DayOfYear,
        FieldType::HalfDay,
        FieldType::HourOfDay,
        FieldType::HourOfHalfDay,
        FieldType::MinuteOfHour,
        FieldType::SecondOfMinute,
        FieldType::MillisOfSecond,
    ];

    /// The unit one step of this field represents.
    pub fn duration_unit(self) -> TimeUnit {
        match self {
            FieldType::Era => TimeUnit::Era,
            FieldType::Century => TimeUnit::Century,
            FieldType::DecadeOfCentury => TimeUnit::Decade,
            FieldType::Year | FieldType::YearOfCentury => TimeUnit::Year,
            FieldType::HalfYear => TimeUnit::HalfYear,
            FieldType::Quarter => TimeUnit::Quarter,
            FieldType::MonthOfYear => TimeUnit::Month,
            FieldType::WeekOfYear | FieldType::WeekOfMonth => TimeUnit::Week,
            FieldType::DayOfMonth | FieldType::DayOfWeek | FieldType::DayOfYear => TimeUnit::Day,
            FieldType::HalfDay => TimeUnit::HalfDay,
            FieldType::HourOfDay | FieldType::HourOfHalfDay => TimeUnit::Hour,
            FieldType::MinuteOfHour => TimeUnit::Minute,
            FieldType::SecondOfMinute => TimeUnit::Second,
            FieldType::MillisOfSecond => TimeUnit::Millis,
        }
    }

    /// The unit this field cycles within.
    pub fn range_unit(self) -> TimeUnit {
        match self {
            FieldType::Era | FieldType::Century | FieldType::Year => TimeUnit::Era,
            FieldType::DecadeOfCentury | FieldType::YearOfCentury => TimeUnit::Century,
            FieldType::HalfYear
            | FieldType::Quarter
            | FieldType::MonthOfYear
            | FieldType::WeekOfYear
            | FieldType::DayOfYear => TimeUnit::Year,
            FieldType::WeekOfMonth | FieldType::DayOfMonth => TimeUnit::Month,
            FieldType::DayOfWeek => TimeUnit::Week,
            FieldType::HalfDay | FieldType::HourOfDay => TimeUnit::Day,
            FieldType::HourOfHalfDay => TimeUnit::HalfDay,
            FieldType::MinuteOfHour => TimeUnit::Hour,
            FieldType::SecondOfMinute => TimeUnit::Minute,
            FieldType::MillisOfSecond => TimeUnit::Second,
        }
    }

    /// Inclusive bounds of valid values.
    pub fn bounds(self) -> (i32, i32) {
        match self {
            FieldType::Era => (0, 1),
            FieldType::Century => (-2_620, 2_620),
            FieldType::DecadeOfCentury => (0, 9),
            FieldType::Year => (-262_000, 262_000),
            FieldType::YearOfCentury => (0, 99),
            FieldType::HalfYear => (1, 2),
            FieldType::Quarter => (1, 4),
            FieldType::MonthOfYear => (1, 12),
            FieldType::WeekOfYear => (1, 53),
            FieldType::WeekOfMonth => (1, 6),
            FieldType::DayOfMonth => (1, 31),
            FieldType::DayOfWeek => (1, 7),
            FieldType::DayOfYear => (1, 366),
            FieldType::HalfDay => (0, 1),
            FieldType::HourOfDay => (0, 23),
            FieldType::HourOfHalfDay => (0, 11),
            FieldType::MinuteOfHour => (0, 59),
            FieldType::SecondOfMinute => (0, 59),
            FieldType::MillisOfSecond => (0, 999),
        }
    }

    pub fn branch(self) -> Branch {
        match self {
            FieldType::HalfYear
            | FieldType::Quarter
            | FieldType::MonthOfYear
            | FieldType::WeekOfMonth
            | FieldType::DayOfMonth
            | FieldType::DayOfYear => Branch::Month,
            FieldType::WeekOfYear => Branch::Week,
            _ => Branch::Common,
        }
    }

    /// True for half-day and anything finer.
    pub fn is_time_of_day(self) -> bool {
        self.duration_unit() < TimeUnit::Day
    }

    fn generality_key(self) -> (TimeUnit, TimeUnit) {
        (self.duration_unit(), self.range_unit())
    }

    /// Compares duration units first, then range units on a tie.
    pub fn is_more_general_than(self, other: FieldType) -> bool {
        self.generality_key() > other.generality_key()
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Era => "era",
            FieldType::Century => "centuryOfEra",
            FieldType::DecadeOfCentury => "decadeOfCentury",
            FieldType::Year => "year",
            FieldType::YearOfCentury => "yearOfCentury",
            FieldType::HalfYear => "halfYearOfYear",
            FieldType::Quarter => "quarterOfYear",
            FieldType::MonthOfYear => "monthOfYear",
            FieldType::WeekOfYear => "weekOfWeekyear",
            FieldType::WeekOfMonth => "weekOfMonth",
            FieldType::DayOfMonth => "dayOfMonth",
            FieldType::DayOfWeek => "dayOfWeek",
            FieldType::DayOfYear => "dayOfYear",
            FieldType::HalfDay => "halfdayOfDay",
            FieldType::HourOfDay => "hourOfDay",
            FieldType::HourOfHalfDay => "hourOfHalfday",
            FieldType::MinuteOfHour => "minuteOfHour",
            FieldType::SecondOfMinute => "secondOfMinute",
            FieldType::MillisOfSecond => "millisOfSecond",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
