//! Partially specified calendar values and the field algebra over them.
//!
//! A [`Partial`] is an ordered set of `field → value` assignments, e.g.
//! `{monthOfYear: 6, dayOfMonth: 19}` for "June 19th" with no year. The
//! operations here are the building blocks of resolution:
//!
//! - [`Partial::combine`]: union where the left side wins
//! - [`Partial::combine_more_general_fields`]: borrow only the coarser
//!   fields of a reference (used when grounding "June" against a reference
//!   date: the year is borrowed, the reference's day is not)
//! - [`Partial::discard_more_specific_fields`] / [`Partial::pad_more_specific_fields`]:
//!   truncate or fill in defaults
//! - [`Partial::resolve_dow_to_day`]: turn a bare weekday into a date
//!
//! Conversion to an instant fills unset fields with defaults (year 0,
//! month 1, day 1, midnight).

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TemporalError};
use crate::field::{Branch, FieldType, TimeUnit, FULL_FIELDS};
use crate::period::Period;

// ── Chronology ──────────────────────────────────────────────────────────────

/// The calendar system a partial value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Chronology {
    /// Proleptic ISO calendar, no zone.
    #[default]
    Iso,
    /// ISO calendar at a fixed offset from UTC, in seconds east.
    IsoOffset(i32),
}

impl fmt::Display for Chronology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chronology::Iso => f.write_str("ISO"),
            Chronology::IsoOffset(secs) => write!(f, "ISO[{secs:+}s]"),
        }
    }
}

// ── Partial ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Partial {
    fields: BTreeMap<FieldType, i32>,
    chronology: Chronology,
}

pub(crate) fn weekday_from_number(n: i32) -> Option<Weekday> {
    Some(match n {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        7 => Weekday::Sun,
        _ => return None,
    })
}

impl Partial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a partial from field assignments, validating each one.
    pub fn from_fields(fields: &[(FieldType, i32)]) -> Result<Self> {
        fields
            .iter()
            .try_fold(Partial::new(), |p, (field, value)| p.set_field(*field, *value))
    }

    pub fn chronology(&self) -> Chronology {
        self.chronology
    }

    pub fn with_chronology(mut self, chronology: Chronology) -> Self {
        self.chronology = chronology;
        self
    }

    pub fn has_field(&self, field: FieldType) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn get(&self, field: FieldType) -> Option<i32> {
        self.fields.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Assignments in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldType, i32)> + '_ {
        self.fields.iter().map(|(f, v)| (*f, *v))
    }

    pub fn field_types(&self) -> impl Iterator<Item = FieldType> + '_ {
        self.fields.keys().copied()
    }

    /// Sets a field, rejecting out-of-range values and values that disagree
    /// with an overlapping field already present.
    pub fn set_field(&self, field: FieldType, value: i32) -> Result<Partial> {
        let (min, max) = field.bounds();
        let invalid = || TemporalError::InvalidField {
            field: field.name().to_string(),
            value: i64::from(value),
        };
        if value < min || value > max {
            return Err(invalid());
        }
        let candidate = self.with(field, value);
        if candidate.is_self_consistent() {
            Ok(candidate)
        } else {
            Err(invalid())
        }
    }

    /// Unchecked setter.
    pub(crate) fn with(&self, field: FieldType, value: i32) -> Partial {
        let mut p = self.clone();
        p.fields.insert(field, value);
        p
    }

    pub fn without(&self, field: FieldType) -> Partial {
        let mut p = self.clone();
        p.fields.remove(&field);
        p
    }

    // ── Derived values ──────────────────────────────────────────────────

    /// The absolute year implied by year, or century with year-of-century
    /// or decade.
    pub fn year_value(&self) -> Option<i32> {
        if let Some(y) = self.get(FieldType::Year) {
            return Some(y);
        }
        let century = self.get(FieldType::Century)?;
        Some(match (self.get(FieldType::YearOfCentury), self.get(FieldType::DecadeOfCentury)) {
            (Some(yoc), _) => century * 100 + yoc,
            (None, Some(decade)) => century * 100 + decade * 10,
            (None, None) => century * 100,
        })
    }

    /// Month of year, or the first month of the quarter/half-year.
    pub fn effective_month(&self) -> Option<u32> {
        let month = self
            .get(FieldType::MonthOfYear)
            .or_else(|| self.get(FieldType::Quarter).map(|q| (q - 1) * 3 + 1))
            .or_else(|| self.get(FieldType::HalfYear).map(|h| (h - 1) * 6 + 1))?;
        u32::try_from(month).ok()
    }

    fn effective_hour(&self) -> Option<i32> {
        self.get(FieldType::HourOfDay).or_else(|| {
            self.get(FieldType::HalfDay)
                .map(|hd| hd * 12 + self.get(FieldType::HourOfHalfDay).unwrap_or(0))
        })
    }

    pub fn has_absolute_year(&self) -> bool {
        self.has_field(FieldType::Year) || self.has_field(FieldType::Century)
    }

    pub fn has_time_of_day(&self) -> bool {
        self.fields.keys().any(|f| f.is_time_of_day())
    }

    pub fn has_date_fields(&self) -> bool {
        self.fields.keys().any(|f| !f.is_time_of_day())
    }

    fn has_branch(&self, branch: Branch) -> bool {
        self.fields.keys().any(|f| f.branch() == branch)
    }

    pub fn most_general_field(&self) -> Option<FieldType> {
        self.fields
            .keys()
            .copied()
            .reduce(|a, b| if b.is_more_general_than(a) { b } else { a })
    }

    pub fn most_specific_field(&self) -> Option<FieldType> {
        self.fields
            .keys()
            .copied()
            .reduce(|a, b| if a.is_more_general_than(b) { b } else { a })
    }

    /// The finest unit this value specifies.
    pub fn granularity(&self) -> Option<TimeUnit> {
        self.most_specific_field().map(FieldType::duration_unit)
    }

    /// The unit one occurrence repeats within: a month-of-year repeats every
    /// year, a weekday every week. `None` once an absolute year is present.
    pub fn natural_period(&self) -> Option<TimeUnit> {
        let unit = self.most_general_field()?.range_unit();
        (unit != TimeUnit::Era).then_some(unit)
    }

    /// True when the value can be placed on the timeline without a reference.
    pub fn is_groundable(&self) -> bool {
        self.has_absolute_year() && self.begin_instant().is_some()
    }

    // ── Consistency ─────────────────────────────────────────────────────

    fn is_self_consistent(&self) -> bool {
        let get = |f| self.get(f);
        if let Some(year) = get(FieldType::Year) {
            if get(FieldType::YearOfCentury).is_some_and(|yoc| yoc != year.rem_euclid(100)) {
                return false;
            }
            if get(FieldType::Century).is_some_and(|c| c != year.div_euclid(100)) {
                return false;
            }
            if get(FieldType::DecadeOfCentury)
                .is_some_and(|d| d != year.rem_euclid(100) / 10)
            {
                return false;
            }
        }
        if let (Some(yoc), Some(decade)) = (
            get(FieldType::YearOfCentury),
            get(FieldType::DecadeOfCentury),
        ) {
            if yoc / 10 != decade {
                return false;
            }
        }
        if let Some(month) = get(FieldType::MonthOfYear) {
            if get(FieldType::Quarter).is_some_and(|q| q != (month - 1) / 3 + 1) {
                return false;
            }
            if get(FieldType::HalfYear).is_some_and(|h| h != (month - 1) / 6 + 1) {
                return false;
            }
        }
        if let (Some(q), Some(h)) = (get(FieldType::Quarter), get(FieldType::HalfYear)) {
            if (q - 1) / 2 + 1 != h {
                return false;
            }
        }
        if let Some(hour) = get(FieldType::HourOfDay) {
            if get(FieldType::HalfDay).is_some_and(|hd| hd != hour / 12) {
                return false;
            }
            if get(FieldType::HourOfHalfDay).is_some_and(|h| h != hour % 12) {
                return false;
            }
        }
        if let (Some(dow), Some(_)) = (get(FieldType::DayOfWeek), get(FieldType::DayOfMonth)) {
            if let Some(date) = self.full_date() {
                if date.weekday().number_from_monday() as i32 != dow {
                    return false;
                }
            }
        }
        true
    }

    fn full_date(&self) -> Option<NaiveDate> {
        let year = self.year_value()?;
        let month = self.effective_month()?;
        let day = u32::try_from(self.get(FieldType::DayOfMonth)?).ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn check_chronology(&self, other: &Partial) -> Result<()> {
        if self.chronology == other.chronology {
            Ok(())
        } else {
            Err(TemporalError::ChronologyMismatch {
                left: self.chronology.to_string(),
                right: other.chronology.to_string(),
            })
        }
    }

    /// True when no field of one value disagrees with the other.
    pub fn is_compatible(&self, other: &Partial) -> Result<bool> {
        self.check_chronology(other)?;
        for (field, value) in other.iter() {
            if self.get(field).is_some_and(|v| v != value) {
                return Ok(false);
            }
        }
        let mut union = self.clone();
        for (field, value) in other.iter() {
            union.fields.entry(field).or_insert(value);
        }
        Ok(union.is_self_consistent())
    }

    // ── Combination ─────────────────────────────────────────────────────

    /// Union of both values; fields of `self` win.
    pub fn combine(&self, other: &Partial) -> Result<Partial> {
        self.check_chronology(other)?;
        let mut p = self.clone();
        for (field, value) in other.iter() {
            p.fields.entry(field).or_insert(value);
        }
        Ok(p.normalized())
    }

    /// Folds implied fields together: century + year-of-century becomes a
    /// year, half-day + hour-of-half-day becomes an hour of day.
    fn normalized(mut self) -> Partial {
        if !self.has_field(FieldType::Year) {
            if let (Some(c), Some(yoc)) = (
                self.get(FieldType::Century),
                self.get(FieldType::YearOfCentury),
            ) {
                self.fields.insert(FieldType::Year, c * 100 + yoc);
            }
        }
        if self.has_field(FieldType::Year) {
            self.fields.remove(&FieldType::YearOfCentury);
        }
        if !self.has_field(FieldType::HourOfDay) {
            if let (Some(hd), Some(h)) = (
                self.get(FieldType::HalfDay),
                self.get(FieldType::HourOfHalfDay),
            ) {
                self.fields.insert(FieldType::HourOfDay, hd * 12 + h);
            }
        }
        if self.has_field(FieldType::HourOfDay) {
            self.fields.remove(&FieldType::HourOfHalfDay);
        }
        self
    }

    /// Borrows from `reference` only the fields strictly more general than
    /// both `cutoff` and this value's most general field.
    ///
    /// Year-of-century and decade-of-century are completed from the
    /// reference year, picking the century that does not land after it.
    pub fn combine_more_general_fields(
        &self,
        reference: &Partial,
        cutoff: Option<FieldType>,
    ) -> Result<Partial> {
        self.check_chronology(reference)?;
        let own = self.most_general_field();
        let threshold = match (own, cutoff) {
            (Some(own), Some(cutoff)) if cutoff.is_more_general_than(own) => Some(own),
            (Some(own), None) => Some(own),
            (_, cutoff) => cutoff,
        };

        let mut p = self.clone();
        for (field, value) in reference.iter() {
            if field == FieldType::Year && !p.has_absolute_year() {
                if let Some(yoc) = p.get(FieldType::YearOfCentury) {
                    let mut year = value.div_euclid(100) * 100 + yoc;
                    if value < year {
                        year -= 100;
                    }
                    p = p.without(FieldType::YearOfCentury).with(FieldType::Year, year);
                    continue;
                }
                if let Some(decade) = p.get(FieldType::DecadeOfCentury) {
                    let mut century = value.div_euclid(100);
                    if value < century * 100 + decade * 10 {
                        century -= 1;
                    }
                    p = p.with(FieldType::Century, century);
                    continue;
                }
            }
            if p.has_field(field) {
                continue;
            }
            if threshold.is_some_and(|t| !field.is_more_general_than(t)) {
                continue;
            }
            if field.branch() == Branch::Month
                && (p.has_branch(Branch::Week) || p.has_field(FieldType::DayOfYear))
            {
                continue;
            }
            if field.branch() == Branch::Week && p.has_branch(Branch::Month) {
                continue;
            }
            let candidate = p.with(field, value);
            if candidate.is_self_consistent() {
                p = candidate;
            }
        }
        Ok(p.normalized())
    }

    /// Keeps only fields at least as general as `cutoff`.
    pub fn discard_more_specific_fields(&self, cutoff: FieldType) -> Partial {
        let mut p = self.clone();
        p.fields.retain(|field, _| {
            if cutoff.is_more_general_than(*field) {
                return false;
            }
            match cutoff.branch() {
                Branch::Week => field.branch() != Branch::Month,
                Branch::Month => field.branch() != Branch::Week,
                Branch::Common => true,
            }
        });
        p
    }

    /// Keeps only fields whose unit is at least `unit`.
    pub fn discard_finer_than(&self, unit: TimeUnit) -> Partial {
        let mut p = self.clone();
        p.fields.retain(|field, _| field.duration_unit() >= unit);
        p
    }

    /// Fills default values for every unset field between this value's
    /// granularity and `unit` (month 1, day 1, hour 0, ...).
    pub fn pad_more_specific_fields(&self, unit: TimeUnit) -> Partial {
        let Some(granularity) = self.granularity() else {
            return self.clone();
        };
        if unit >= granularity {
            return self.clone();
        }
        let mut p = self.clone();
        if granularity > TimeUnit::Day && unit <= TimeUnit::Week {
            if p.has_field(FieldType::WeekOfYear) || p.has_field(FieldType::WeekOfMonth) {
                if unit <= TimeUnit::Day && !p.has_field(FieldType::DayOfWeek) {
                    p = p.with(FieldType::DayOfWeek, 1);
                }
            } else {
                if !p.has_field(FieldType::MonthOfYear) {
                    let month = p.effective_month().map_or(1, |m| m as i32);
                    p = p.with(FieldType::MonthOfYear, month);
                }
                if unit <= TimeUnit::Day && !p.has_field(FieldType::DayOfMonth) {
                    p = p.with(FieldType::DayOfMonth, 1);
                }
            }
        } else if granularity > TimeUnit::Month && unit <= TimeUnit::Month {
            let month = p.effective_month().map_or(1, |m| m as i32);
            p = p.with(FieldType::MonthOfYear, month);
        }
        if unit < TimeUnit::Day && granularity > unit {
            if unit <= TimeUnit::Hour && !p.has_field(FieldType::HourOfDay) && granularity > TimeUnit::Hour {
                let hour = p.effective_hour().unwrap_or(0);
                p = p.without(FieldType::HourOfHalfDay).with(FieldType::HourOfDay, hour);
            } else if unit == TimeUnit::HalfDay && granularity > TimeUnit::HalfDay {
                p = p.with(FieldType::HalfDay, 0);
            }
            if unit <= TimeUnit::Minute && granularity > TimeUnit::Minute {
                p = p.with(FieldType::MinuteOfHour, 0);
            }
            if unit <= TimeUnit::Second && granularity > TimeUnit::Second {
                p = p.with(FieldType::SecondOfMinute, 0);
            }
            if unit <= TimeUnit::Millis && granularity > TimeUnit::Millis {
                p = p.with(FieldType::MillisOfSecond, 0);
            }
        }
        p
    }

    /// Replaces a bare day-of-week with a concrete day of month.
    ///
    /// With a week-of-year and year the ISO week date is used. Otherwise the
    /// reference date (moved to this value's year/month when given) selects
    /// the ISO week, and the weekday is placed inside it.
    pub fn resolve_dow_to_day(&self, reference: Option<&Partial>) -> Partial {
        let Some(dow) = self.get(FieldType::DayOfWeek) else {
            return self.clone();
        };
        if self.has_field(FieldType::DayOfMonth) || self.has_field(FieldType::DayOfYear) {
            return self.clone();
        }
        let Some(weekday) = weekday_from_number(dow) else {
            return self.clone();
        };

        let date = if let (Some(week), Some(year)) =
            (self.get(FieldType::WeekOfYear), self.year_value())
        {
            u32::try_from(week)
                .ok()
                .and_then(|w| NaiveDate::from_isoywd_opt(year, w, weekday))
        } else if let Some(ref_date) = reference.and_then(Partial::full_date) {
            let year = self.year_value().unwrap_or(ref_date.year());
            let month = self.effective_month().unwrap_or(ref_date.month());
            let anchor = (1..=ref_date.day())
                .rev()
                .find_map(|d| NaiveDate::from_ymd_opt(year, month, d));
            anchor.map(|a| {
                a - TimeDelta::days(i64::from(a.weekday().num_days_from_monday()))
                    + TimeDelta::days(i64::from(weekday.num_days_from_monday()))
            })
        } else if self.has_absolute_year() && !self.has_field(FieldType::WeekOfMonth) {
            self.begin_instant().map(|dt| dt.date())
        } else {
            None
        };

        let Some(date) = date else {
            return self.clone();
        };
        let mut p = self.clone();
        for field in [
            FieldType::WeekOfYear,
            FieldType::WeekOfMonth,
            FieldType::YearOfCentury,
            FieldType::DecadeOfCentury,
            FieldType::Century,
        ] {
            p.fields.remove(&field);
        }
        p.with(FieldType::Year, date.year())
            .with(FieldType::MonthOfYear, date.month() as i32)
            .with(FieldType::DayOfMonth, date.day() as i32)
    }

    // ── Instant conversion ──────────────────────────────────────────────

    /// The first instant this value covers, unset fields taking defaults.
    /// `None` when the fields do not name a real date (e.g. February 30).
    pub fn begin_instant(&self) -> Option<NaiveDateTime> {
        let year = self.year_value().unwrap_or(0);
        let date = if let Some(week) = self.get(FieldType::WeekOfYear) {
            let weekday = weekday_from_number(self.get(FieldType::DayOfWeek).unwrap_or(1))?;
            NaiveDate::from_isoywd_opt(year, u32::try_from(week).ok()?, weekday)?
        } else if let (Some(doy), None) = (
            self.get(FieldType::DayOfYear),
            self.get(FieldType::MonthOfYear),
        ) {
            NaiveDate::from_yo_opt(year, u32::try_from(doy).ok()?)?
        } else {
            let month = self.effective_month().unwrap_or(1);
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            if let Some(day) = self.get(FieldType::DayOfMonth) {
                NaiveDate::from_ymd_opt(year, month, u32::try_from(day).ok()?)?
            } else if let Some(wom) = self.get(FieldType::WeekOfMonth) {
                let week_one = first
                    - TimeDelta::days(i64::from(first.weekday().num_days_from_monday()));
                let week_start = week_one + TimeDelta::weeks(i64::from(wom - 1));
                match self.get(FieldType::DayOfWeek) {
                    Some(dow) => week_start + TimeDelta::days(i64::from(dow - 1)),
                    None => week_start.max(first),
                }
            } else if let Some(dow) = self.get(FieldType::DayOfWeek) {
                let weekday = weekday_from_number(dow)?;
                let offset = (7 + weekday.num_days_from_monday()
                    - first.weekday().num_days_from_monday())
                    % 7;
                first + TimeDelta::days(i64::from(offset))
            } else {
                first
            }
        };
        let to_u32 = |v: Option<i32>| u32::try_from(v.unwrap_or(0)).ok();
        date.and_hms_milli_opt(
            to_u32(self.effective_hour())?,
            to_u32(self.get(FieldType::MinuteOfHour))?,
            to_u32(self.get(FieldType::SecondOfMinute))?,
            to_u32(self.get(FieldType::MillisOfSecond))?,
        )
    }

    /// Reads the requested fields off an instant. When week-of-year is
    /// requested, year is the ISO week-based year.
    pub fn from_instant(dt: NaiveDateTime, fields: &[FieldType]) -> Partial {
        let week_based = fields.contains(&FieldType::WeekOfYear);
        let date = dt.date();
        let mut p = Partial::new();
        for field in fields {
            let value = match field {
                FieldType::Era => i32::from(date.year() > 0),
                FieldType::Century => date.year().div_euclid(100),
                FieldType::DecadeOfCentury => date.year().rem_euclid(100) / 10,
                FieldType::Year if week_based => date.iso_week().year(),
                FieldType::Year => date.year(),
                FieldType::YearOfCentury => date.year().rem_euclid(100),
                FieldType::HalfYear => (date.month0() / 6 + 1) as i32,
                FieldType::Quarter => (date.month0() / 3 + 1) as i32,
                FieldType::MonthOfYear => date.month() as i32,
                FieldType::WeekOfYear => date.iso_week().week() as i32,
                FieldType::WeekOfMonth => {
                    let first_offset = date
                        .with_day(1)
                        .map_or(0, |f| f.weekday().num_days_from_monday());
                    ((date.day0() + first_offset) / 7 + 1) as i32
                }
                FieldType::DayOfMonth => date.day() as i32,
                FieldType::DayOfWeek => date.weekday().number_from_monday() as i32,
                FieldType::DayOfYear => date.ordinal() as i32,
                FieldType::HalfDay => (dt.hour() / 12) as i32,
                FieldType::HourOfDay => dt.hour() as i32,
                FieldType::HourOfHalfDay => (dt.hour() % 12) as i32,
                FieldType::MinuteOfHour => dt.minute() as i32,
                FieldType::SecondOfMinute => dt.second() as i32,
                FieldType::MillisOfSecond => (dt.nanosecond() / 1_000_000).min(999) as i32,
            };
            p.fields.insert(*field, value);
        }
        p
    }

    /// Year through millisecond of an instant.
    pub fn from_instant_full(dt: NaiveDateTime) -> Partial {
        Partial::from_instant(dt, &FULL_FIELDS)
    }

    /// The occurrence of `unit` containing `dt`, e.g. `(2016, W24)` for a
    /// week. `None` for units with no calendar fields (millennium, era).
    pub fn truncated_instant(dt: NaiveDateTime, unit: TimeUnit) -> Option<Partial> {
        unit.truncation_fields()
            .map(|fields| Partial::from_instant(dt, fields))
    }

    /// Moves this value by a period, keeping its shape. Requires a groundable
    /// value; a period finer than the value's granularity pads it first.
    pub fn add_period(&self, period: &Period) -> Option<Partial> {
        if period.is_zero() {
            return Some(self.clone());
        }
        if !self.is_groundable() {
            return None;
        }
        let shape = match (period.finest_unit(), self.granularity()) {
            (Some(fine), Some(granularity)) if fine < granularity => {
                self.pad_more_specific_fields(fine)
            }
            _ => self.clone(),
        };
        let shifted = period.add_to(shape.begin_instant()?)?;
        let fields: Vec<FieldType> = shape.field_types().collect();
        Some(Partial::from_instant(shifted, &fields).with_chronology(self.chronology))
    }

    /// Like [`Partial::add_period`], but a value without a year is moved
    /// within its own cycle: Sunday + 1 day is Monday, 23h + 2h is 1h.
    pub(crate) fn shift_within_cycle(&self, period: &Period) -> Option<Partial> {
        if self.has_absolute_year() {
            return self.add_period(period);
        }
        let placeholder_year = 2000
            + self
                .get(FieldType::YearOfCentury)
                .or_else(|| self.get(FieldType::DecadeOfCentury).map(|d| d * 10))
                .unwrap_or(0);
        let shifted = self
            .with(FieldType::Year, placeholder_year)
            .add_period(period)?;
        let fields: Vec<FieldType> = self.field_types().collect();
        Some(Partial::from_instant(shifted.begin_instant()?, &fields).with_chronology(self.chronology))
    }
}

impl fmt::Display for Partial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::format::format_partial(self, false) {
            Some(s) => f.write_str(&s),
            None => f.write_str("{}"),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(fields: &[(FieldType, i32)]) -> Partial {
        Partial::from_fields(fields).unwrap()
    }

    fn reference() -> Partial {
        // Sunday, June 19, 2016 10:30
        Partial::from_instant_full(
            NaiveDate::from_ymd_opt(2016, 6, 19)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        )
    }

    #[test]
    fn test_set_field_rejects_out_of_range() {
        assert!(Partial::new().set_field(FieldType::MonthOfYear, 13).is_err());
        assert!(Partial::new().set_field(FieldType::DayOfWeek, 0).is_err());
    }

    #[test]
    fn test_set_field_rejects_inconsistent_year_of_century() {
        let year = p(&[(FieldType::Year, 2016)]);
        assert!(year.set_field(FieldType::YearOfCentury, 16).is_ok());
        assert!(year.set_field(FieldType::YearOfCentury, 17).is_err());
    }

    #[test]
    fn test_combine_left_wins_and_merges_halfday() {
        let pm = p(&[(FieldType::HalfDay, 1), (FieldType::HourOfHalfDay, 3)]);
        let merged = pm.combine(&p(&[(FieldType::MinuteOfHour, 15)])).unwrap();
        assert_eq!(merged.get(FieldType::HourOfDay), Some(15));
        assert!(!merged.has_field(FieldType::HourOfHalfDay));
        assert_eq!(merged.get(FieldType::MinuteOfHour), Some(15));
    }

    #[test]
    fn test_combine_century_and_year_of_century() {
        let c = p(&[(FieldType::Century, 19)]);
        let merged = c.combine(&p(&[(FieldType::YearOfCentury, 85)])).unwrap();
        assert_eq!(merged.get(FieldType::Year), Some(1985));
    }

    #[test]
    fn test_combine_chronology_mismatch_fails() {
        let a = p(&[(FieldType::Year, 2016)]);
        let b = p(&[(FieldType::MonthOfYear, 6)]).with_chronology(Chronology::IsoOffset(3600));
        assert!(matches!(
            a.combine(&b),
            Err(TemporalError::ChronologyMismatch { .. })
        ));
    }

    #[test]
    fn test_is_compatible() {
        let june = p(&[(FieldType::MonthOfYear, 6)]);
        assert!(june.is_compatible(&p(&[(FieldType::Quarter, 2)])).unwrap());
        assert!(!june.is_compatible(&p(&[(FieldType::Quarter, 3)])).unwrap());
        assert!(!june.is_compatible(&p(&[(FieldType::MonthOfYear, 7)])).unwrap());
    }

    #[test]
    fn test_combine_more_general_borrows_year_only() {
        let june_5 = p(&[(FieldType::MonthOfYear, 6), (FieldType::DayOfMonth, 5)]);
        let merged = june_5.combine_more_general_fields(&reference(), None).unwrap();
        assert_eq!(merged.get(FieldType::Year), Some(2016));
        assert_eq!(merged.get(FieldType::DayOfMonth), Some(5));
        assert!(!merged.has_field(FieldType::HourOfDay));
    }

    #[test]
    fn test_combine_more_general_year_of_century_goes_back() {
        let yoc = p(&[(FieldType::YearOfCentury, 20)]);
        let merged = yoc.combine_more_general_fields(&reference(), None).unwrap();
        assert_eq!(merged.get(FieldType::Year), Some(1920));

        let yoc = p(&[(FieldType::YearOfCentury, 12)]);
        let merged = yoc.combine_more_general_fields(&reference(), None).unwrap();
        assert_eq!(merged.get(FieldType::Year), Some(2012));
    }

    #[test]
    fn test_combine_more_general_decade_picks_century() {
        let nineties = p(&[(FieldType::DecadeOfCentury, 9)]);
        let merged = nineties.combine_more_general_fields(&reference(), None).unwrap();
        assert_eq!(merged.get(FieldType::Century), Some(19));
        assert_eq!(merged.year_value(), Some(1990));
    }

    #[test]
    fn test_combine_more_general_week_branch_skips_month() {
        let week = p(&[(FieldType::WeekOfYear, 25)]);
        let merged = week.combine_more_general_fields(&reference(), None).unwrap();
        assert_eq!(merged.get(FieldType::Year), Some(2016));
        assert!(!merged.has_field(FieldType::MonthOfYear));
    }

    #[test]
    fn test_discard_more_specific_fields() {
        let full = reference();
        let month = full.discard_more_specific_fields(FieldType::MonthOfYear);
        assert_eq!(month, p(&[(FieldType::Year, 2016), (FieldType::MonthOfYear, 6)]));
    }

    #[test]
    fn test_pad_more_specific_fields() {
        let year = p(&[(FieldType::Year, 2016)]);
        let padded = year.pad_more_specific_fields(TimeUnit::Day);
        assert_eq!(padded.get(FieldType::MonthOfYear), Some(1));
        assert_eq!(padded.get(FieldType::DayOfMonth), Some(1));
        assert!(!padded.has_field(FieldType::HourOfDay));

        let hour = p(&[(FieldType::HourOfDay, 10)]);
        let padded = hour.pad_more_specific_fields(TimeUnit::Millis);
        assert_eq!(padded.get(FieldType::MinuteOfHour), Some(0));
        assert_eq!(padded.get(FieldType::MillisOfSecond), Some(0));
        assert!(!padded.has_field(FieldType::MonthOfYear));

        let quarter = p(&[(FieldType::Year, 2016), (FieldType::Quarter, 3)]);
        let padded = quarter.pad_more_specific_fields(TimeUnit::Day);
        assert_eq!(padded.get(FieldType::MonthOfYear), Some(7));
    }

    #[test]
    fn test_resolve_dow_with_week_of_year() {
        let w1_monday = p(&[
            (FieldType::Year, 2016),
            (FieldType::WeekOfYear, 1),
            (FieldType::DayOfWeek, 1),
        ]);
        let resolved = w1_monday.resolve_dow_to_day(None);
        assert_eq!(resolved.get(FieldType::Year), Some(2016));
        assert_eq!(resolved.get(FieldType::MonthOfYear), Some(1));
        assert_eq!(resolved.get(FieldType::DayOfMonth), Some(4));
    }

    #[test]
    fn test_resolve_dow_uses_reference_week() {
        let monday = p(&[(FieldType::DayOfWeek, 1)]);
        let resolved = monday.resolve_dow_to_day(Some(&reference()));
        assert_eq!(resolved.get(FieldType::DayOfMonth), Some(13));
        assert_eq!(resolved.get(FieldType::MonthOfYear), Some(6));
    }

    #[test]
    fn test_begin_instant_defaults() {
        let june = p(&[(FieldType::Year, 2016), (FieldType::MonthOfYear, 6)]);
        let begin = june.begin_instant().unwrap();
        assert_eq!(begin.to_string(), "2016-06-01 00:00:00");

        let bad = Partial::new()
            .with(FieldType::Year, 2015)
            .with(FieldType::MonthOfYear, 2)
            .with(FieldType::DayOfMonth, 30);
        assert!(bad.begin_instant().is_none());
    }

    #[test]
    fn test_truncated_week_uses_iso_year() {
        let jan_1 = NaiveDate::from_ymd_opt(2016, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let week = Partial::truncated_instant(jan_1, TimeUnit::Week).unwrap();
        assert_eq!(week.get(FieldType::Year), Some(2015));
        assert_eq!(week.get(FieldType::WeekOfYear), Some(53));
    }

    #[test]
    fn test_add_period_keeps_shape() {
        let week = p(&[(FieldType::Year, 2016), (FieldType::WeekOfYear, 52)]);
        let next = week.add_period(&Period::of(TimeUnit::Week, 1)).unwrap();
        assert_eq!(next, p(&[(FieldType::Year, 2017), (FieldType::WeekOfYear, 1)]));

        let june = p(&[(FieldType::MonthOfYear, 6)]);
        assert!(june.add_period(&Period::of(TimeUnit::Year, 1)).is_none());
    }

    #[test]
    fn test_natural_period() {
        assert_eq!(p(&[(FieldType::MonthOfYear, 6)]).natural_period(), Some(TimeUnit::Year));
        assert_eq!(p(&[(FieldType::DayOfWeek, 3)]).natural_period(), Some(TimeUnit::Week));
        assert_eq!(p(&[(FieldType::Year, 2016)]).natural_period(), None);
    }

    proptest! {
        #[test]
        fn prop_compatible_combine_commutes(m in 1i32..=12, d in 1i32..=28, h in 0i32..24) {
            let a = p(&[(FieldType::MonthOfYear, m)]);
            let b = p(&[(FieldType::DayOfMonth, d), (FieldType::HourOfDay, h)]);
            prop_assert!(a.is_compatible(&b).unwrap());
            prop_assert_eq!(a.combine(&b).unwrap(), b.combine(&a).unwrap());
        }

        #[test]
        fn prop_instant_roundtrip(days in 0i64..40_000, ms in 0i64..86_400_000) {
            let base = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
            let dt = base + TimeDelta::days(days) + TimeDelta::milliseconds(ms);
            prop_assert_eq!(Partial::from_instant_full(dt).begin_instant(), Some(dt));
        }
    }
}
