//! Composite times: a base partial plus up to three independently ranged
//! slots ("weekend morning in June").
//!
//! A slot is a ranged time tagged with a standard type: part of year
//! (seasons), day of week (weekend) or time of day (morning). The slots
//! cannot be folded into one field set because each brings its own begin
//! and end, so they are kept apart and placed on the calendar one at a time,
//! coarsest first.

use chrono::NaiveDateTime;

use crate::error::Result;
use crate::field::{FieldType, TimeUnit};
use crate::format::format_partial;
use crate::partial::Partial;
use crate::temporal::{StandardTemporalType, TemporalValue};

use super::{Time, TimeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    PartOfYear,
    DayOfWeek,
    TimeOfDay,
}

impl Slot {
    /// The slot a ranged, typed time occupies.
    pub fn of(time: &Time) -> Option<Slot> {
        if !matches!(time.kind(), TimeKind::WithRange(_)) {
            return None;
        }
        match time.standard_type()? {
            StandardTemporalType::SeasonOfYear | StandardTemporalType::PartOfYear => {
                Some(Slot::PartOfYear)
            }
            StandardTemporalType::DayOfWeek => Some(Slot::DayOfWeek),
            StandardTemporalType::TimeOfDay => Some(Slot::TimeOfDay),
            _ => None,
        }
    }

    /// The cycle the slot repeats within.
    pub fn period(self) -> TimeUnit {
        match self {
            Slot::PartOfYear => TimeUnit::Year,
            Slot::DayOfWeek => TimeUnit::Week,
            Slot::TimeOfDay => TimeUnit::Day,
        }
    }

    /// Reference fields a base borrows when this is its coarsest slot.
    fn reference_fields(self) -> &'static [FieldType] {
        match self {
            Slot::PartOfYear => &[FieldType::Year],
            Slot::DayOfWeek => &[FieldType::Year, FieldType::WeekOfYear],
            Slot::TimeOfDay => &[FieldType::Year, FieldType::MonthOfYear, FieldType::DayOfMonth],
        }
    }

    /// `XXXX-SU`, `XXXX-WXX-WE`, `TMO`.
    pub(crate) fn unanchored_form(self, label: &str) -> String {
        match self {
            Slot::PartOfYear => format!("XXXX-{label}"),
            Slot::DayOfWeek => format!("XXXX-WXX-{label}"),
            Slot::TimeOfDay => format!("T{label}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CompositeTime {
    pub(crate) base: Partial,
    pub(crate) part_of_year: Option<Box<Time>>,
    pub(crate) day_of_week: Option<Box<Time>>,
    pub(crate) time_of_day: Option<Box<Time>>,
}

impl CompositeTime {
    pub fn new(base: Partial) -> Self {
        CompositeTime {
            base,
            ..Default::default()
        }
    }

    pub fn base(&self) -> &Partial {
        &self.base
    }

    pub fn slot(&self, slot: Slot) -> Option<&Time> {
        match slot {
            Slot::PartOfYear => self.part_of_year.as_deref(),
            Slot::DayOfWeek => self.day_of_week.as_deref(),
            Slot::TimeOfDay => self.time_of_day.as_deref(),
        }
    }

    /// Occupied slots, coarsest first.
    pub fn slots(&self) -> impl Iterator<Item = (Slot, &Time)> + '_ {
        [Slot::PartOfYear, Slot::DayOfWeek, Slot::TimeOfDay]
            .into_iter()
            .filter_map(|s| self.slot(s).map(|t| (s, t)))
    }

    /// Places `time` in its slot. `None` when `time` is not a slot value or
    /// the slot already holds a different one.
    pub fn with_slot(&self, time: &Time) -> Option<CompositeTime> {
        let slot = Slot::of(time)?;
        if self.slot(slot).is_some_and(|existing| existing != time) {
            return None;
        }
        let mut c = self.clone();
        let boxed = Some(Box::new(time.clone()));
        match slot {
            Slot::PartOfYear => c.part_of_year = boxed,
            Slot::DayOfWeek => c.day_of_week = boxed,
            Slot::TimeOfDay => c.time_of_day = boxed,
        }
        Some(c)
    }

    pub fn with_base(&self, base: Partial) -> CompositeTime {
        CompositeTime {
            base,
            ..self.clone()
        }
    }

    /// Combines two composites. `Ok(None)` when the bases or a shared slot
    /// disagree.
    pub fn merge(&self, other: &CompositeTime) -> Result<Option<CompositeTime>> {
        if !self.base.is_compatible(&other.base)? {
            return Ok(None);
        }
        let mut merged = self.with_base(self.base.combine(&other.base)?);
        for (_, time) in other.slots() {
            match merged.with_slot(time) {
                Some(next) => merged = next,
                None => return Ok(None),
            }
        }
        Ok(Some(merged))
    }

    pub fn has_time_of_day(&self) -> bool {
        self.base.has_time_of_day() || self.time_of_day.is_some()
    }

    /// The finer of the base granularity and the finest slot's unit.
    pub fn granularity(&self) -> Option<TimeUnit> {
        let slot_unit = self.slots().last().map(|(slot, _)| match slot {
            Slot::TimeOfDay => TimeUnit::Hour,
            Slot::PartOfYear | Slot::DayOfWeek => TimeUnit::Day,
        });
        match (self.base.granularity(), slot_unit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn natural_period(&self) -> Option<TimeUnit> {
        self.base
            .natural_period()
            .or_else(|| self.slots().next().map(|(slot, _)| slot.period()))
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Completes the base from `reference` up to what the coarsest slot
    /// needs: a year for seasons, a week for weekends, a day for parts of
    /// the day.
    pub(crate) fn resolve_base(&self, reference: &Partial) -> Result<CompositeTime> {
        let view = match (self.slots().next(), reference.begin_instant()) {
            (Some((slot, _)), Some(instant)) => {
                Partial::from_instant(instant, slot.reference_fields())
                    .with_chronology(reference.chronology())
            }
            _ => reference.clone(),
        };
        let base = self
            .base
            .combine_more_general_fields(&view, None)?
            .resolve_dow_to_day(Some(reference));
        Ok(self.with_base(base))
    }

    /// The span covered by every slot, each slot placed within the previous
    /// one. `None` until the base carries a year.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        if !self.base.has_absolute_year() {
            return None;
        }
        let mut current: Option<(NaiveDateTime, NaiveDateTime)> = None;
        for (slot, time) in self.slots() {
            let anchor = match current {
                None => self.base.clone(),
                Some((begin, _)) => Partial::truncated_instant(begin, anchor_unit(slot))?,
            };
            let (b, e) = ground_slot(time, &anchor)?;
            current = match current {
                None => Some((b, e)),
                Some((cb, ce)) => {
                    let (b, e) = (b.max(cb), e.min(ce));
                    if b >= e {
                        return None;
                    }
                    Some((b, e))
                }
            };
        }
        current.or_else(|| Time::partial(self.base.clone()).span())
    }

    /// Base and slot labels: `2016-SU`, `2016-W24-WE`, `2016-06-19TMO`,
    /// `XXXX-WXX-WETMO`.
    pub(crate) fn label_form(&self) -> String {
        let mut s = format_partial(&self.base, false).unwrap_or_default();
        if let Some(poy) = &self.part_of_year {
            if s.is_empty() {
                s.push_str("XXXX");
            }
            s.push('-');
            s.push_str(slot_label(poy));
        }
        if let Some(dow) = &self.day_of_week {
            if s.is_empty() {
                s.push_str("XXXX");
            }
            if !self.base.has_field(FieldType::WeekOfYear) && !self.base.has_field(FieldType::DayOfMonth) {
                s.push_str("-WXX");
            }
            s.push('-');
            s.push_str(slot_label(dow));
        }
        if let Some(tod) = &self.time_of_day {
            s.push('T');
            s.push_str(slot_label(tod));
        }
        s
    }
}

fn slot_label(time: &Time) -> &str {
    time.label().unwrap_or("XX")
}

fn anchor_unit(slot: Slot) -> TimeUnit {
    match slot {
        Slot::PartOfYear => TimeUnit::Year,
        Slot::DayOfWeek => TimeUnit::Week,
        Slot::TimeOfDay => TimeUnit::Day,
    }
}

/// Places both endpoints of a slot using the fields of `anchor`. An end
/// before its begin moves forward one cycle of the end value.
fn ground_slot(time: &Time, anchor: &Partial) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let TimeKind::WithRange(range) = time.kind() else {
        return None;
    };
    let place = |endpoint: Option<&Time>| -> Option<(NaiveDateTime, NaiveDateTime)> {
        let partial = endpoint?.as_partial()?;
        let grounded = partial
            .combine_more_general_fields(anchor, None)
            .ok()?
            .resolve_dow_to_day(None);
        Time::partial(grounded).span()
    };
    let (begin, _) = place(range.begin())?;
    let (last, mut end) = place(range.end())?;
    if last < begin {
        let cycle = range.end()?.natural_step()?;
        end = cycle.add_to(end)?;
    }
    Some((begin, end))
}

// ── Tests ───────────────────────────────────────────────────────────────────
