//! Intervals between two [`Time`] endpoints.
//!
//! Endpoints are closed at their own granularity: `[2016-06-01, 2016-06-30]`
//! covers every instant of June 30th. The half-open instant span is
//! `[begin.instant, end.instant + one end granule)`.

use std::fmt;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::duration::Duration;
use crate::error::Result;
use crate::field::TimeUnit;
use crate::flags::Flags;
use crate::partial::Partial;
use crate::period::Period;
use crate::temporal::{TemporalMeta, TemporalValue, TimexType};
use crate::time::Time;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    begin: Option<Time>,
    end: Option<Time>,
    duration: Option<Duration>,
    meta: TemporalMeta,
}

impl Range {
    /// Builds a range. A missing duration is derived from the endpoints
    /// when both are grounded.
    pub fn new(begin: Option<Time>, end: Option<Time>, duration: Option<Duration>) -> Self {
        let duration = duration.or_else(|| {
            let (b, _) = begin.as_ref()?.span()?;
            let (_, e) = end.as_ref()?.span()?;
            Some(Duration::from_period(Period::between(b, e)))
        });
        Range {
            begin,
            end,
            duration,
            meta: TemporalMeta::default(),
        }
    }

    /// The closed range at `unit` covering the half-open span `[begin, end)`.
    pub fn from_span(
        begin: NaiveDateTime,
        end: NaiveDateTime,
        unit: TimeUnit,
        duration: Option<Duration>,
    ) -> Option<Range> {
        let first = Partial::truncated_instant(begin, unit)?;
        let last = Partial::truncated_instant(Period::of(unit, 1).subtract_from(end)?, unit)?;
        Some(Range::new(
            Some(Time::partial(first)),
            Some(Time::partial(last)),
            duration,
        ))
    }

    fn rebuilt(&self, begin: Option<Time>, end: Option<Time>, duration: Option<Duration>) -> Range {
        Range {
            begin,
            end,
            duration,
            meta: self.meta.clone(),
        }
    }

    pub fn begin(&self) -> Option<&Time> {
        self.begin.as_ref()
    }

    pub fn end(&self) -> Option<&Time> {
        self.end.as_ref()
    }

    pub fn duration(&self) -> Option<&Duration> {
        self.duration.as_ref()
    }

    /// Half-open instant span. A missing endpoint is recovered from the
    /// other one and the duration.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let begin = self.begin.as_ref().and_then(Time::span);
        let end = self.end.as_ref().and_then(Time::span);
        let period = self.duration.as_ref().and_then(Duration::period);
        match (begin, end) {
            (Some((b, _)), Some((_, e))) => Some((b, e)),
            (Some((b, _)), None) => Some((b, period?.add_to(b)?)),
            (None, Some((_, e))) => Some((period?.subtract_from(e)?, e)),
            (None, None) => None,
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.span().is_some()
    }

    // ── Containment ─────────────────────────────────────────────────────

    /// True when `other` lies within this range, endpoints included.
    pub fn contains_range(&self, other: &Range) -> bool {
        let instant = |t: Option<&Time>| t.and_then(Time::instant);
        match (
            instant(self.begin()),
            instant(self.end()),
            instant(other.begin()),
            instant(other.end()),
        ) {
            (Some(b1), Some(e1), Some(b2), Some(e2)) => b1 <= b2 && e2 <= e1,
            _ => false,
        }
    }

    /// True when the first instant of `time` falls inside this range.
    pub fn contains_time(&self, time: &Time) -> bool {
        match (self.span(), time.instant()) {
            (Some((begin, end)), Some(t)) => begin <= t && t < end,
            _ => false,
        }
    }

    /// The overlap of two grounded ranges, `None` when they are disjoint.
    pub fn intersect(&self, other: &Range) -> Option<Range> {
        let (b1, e1) = self.span()?;
        let (b2, e2) = other.span()?;
        if b1.max(b2) >= e1.min(e2) {
            return None;
        }
        let begin = if b1 >= b2 { self.begin() } else { other.begin() };
        let end = if e1 <= e2 { self.end() } else { other.end() };
        Some(Range::new(begin.cloned(), end.cloned(), None))
    }

    // ── Shifting ────────────────────────────────────────────────────────

    /// Moves the endpoints selected by `RANGE_OFFSET_BEGIN`/`RANGE_OFFSET_END`
    /// (both when neither is set) by `duration`.
    pub fn offset(&self, duration: &Duration, flags: Flags) -> Range {
        let selective = flags.intersects(Flags::RANGE_OFFSET_BEGIN | Flags::RANGE_OFFSET_END);
        let move_begin = !selective || flags.contains(Flags::RANGE_OFFSET_BEGIN);
        let move_end = !selective || flags.contains(Flags::RANGE_OFFSET_END);

        let begin = match &self.begin {
            Some(b) if move_begin => Some(b.add(duration)),
            other => other.clone(),
        };
        let end = match &self.end {
            Some(e) if move_end => Some(e.add(duration)),
            other => other.clone(),
        };
        let length = match (move_begin, move_end) {
            (true, false) => self.duration.as_ref().map(|d| d.subtract(duration)),
            (false, true) => self.duration.as_ref().map(|d| d.add(duration)),
            _ => self.duration.clone(),
        };
        self.rebuilt(begin, end, length)
    }

    /// Lengthens the range by `duration` and recomputes one endpoint from the
    /// other and the new length. With `RANGE_EXPAND_FIX_BEGIN` the end is
    /// `begin + length`; otherwise the begin is `end - length`.
    pub fn add(&self, duration: &Duration, flags: Flags) -> Range {
        let length = match &self.duration {
            Some(d) => d.add(duration),
            None => duration.clone(),
        };
        if flags.contains(Flags::RANGE_EXPAND_FIX_BEGIN) {
            let end = match (&self.begin, &self.end) {
                (Some(b), _) => Some(b.add(&length)),
                (None, Some(e)) => Some(e.add(duration)),
                (None, None) => None,
            };
            self.rebuilt(self.begin.clone(), end, Some(length))
        } else {
            let begin = match (&self.end, &self.begin) {
                (Some(e), _) => Some(e.subtract(&length)),
                (None, Some(b)) => Some(b.subtract(duration)),
                (None, None) => None,
            };
            self.rebuilt(begin, self.end.clone(), Some(length))
        }
    }

    pub fn subtract(&self, duration: &Duration, flags: Flags) -> Range {
        self.add(&duration.negated(), flags)
    }

    /// The middle of the range: begin plus half the duration, or end minus
    /// half of it, or the single known endpoint.
    pub fn mid(&self) -> Option<Time> {
        match (&self.begin, &self.end, &self.duration) {
            (Some(b), _, Some(d)) => {
                let begin = match d.granularity() {
                    Some(unit) => b.padded(unit),
                    None => b.clone(),
                };
                Some(begin.add(&d.half()))
            }
            (None, Some(e), Some(d)) => Some(e.subtract(&d.half())),
            (b, e, None) => b.clone().or_else(|| e.clone()),
            (None, None, Some(_)) => None,
        }
    }

    /// The following range of the same length.
    pub fn next(&self) -> Option<Range> {
        let step = self.duration.as_ref()?;
        Some(self.offset(step, Flags::NONE))
    }

    pub fn prev(&self) -> Option<Range> {
        let step = self.duration.as_ref()?;
        Some(self.offset(&step.negated(), Flags::NONE))
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Replaces reference-sentinel endpoints with `reference`. Only active
    /// under `RANGE_RESOLVE_TIME_REF`.
    pub fn resolve(&self, reference: &Time, flags: Flags) -> Result<Range> {
        if !flags.contains(Flags::RANGE_RESOLVE_TIME_REF) {
            return Ok(self.clone());
        }
        let ground = |t: &Option<Time>| match t {
            Some(t) if t.is_reference() => Some(reference.clone()),
            other => other.clone(),
        };
        let mut range = Range::new(ground(&self.begin), ground(&self.end), self.duration.clone());
        range.meta = self.meta.clone();
        Ok(range)
    }

    /// Grounds both endpoints: the begin against `reference` with `flags`,
    /// the end against the grounded begin. An end landing before its begin
    /// moves forward one cycle, so December 21st to March 19th spans the
    /// turn of the year.
    pub fn resolve_endpoints(&self, reference: &Time, flags: Flags) -> Result<Range> {
        let begin = self
            .begin
            .as_ref()
            .map(|b| b.resolve(reference, flags))
            .transpose()?;
        let end_reference = begin
            .as_ref()
            .filter(|b| b.is_grounded())
            .unwrap_or(reference);
        let mut end = self
            .end
            .as_ref()
            .map(|e| e.resolve(end_reference, flags.without(Flags::RESOLVE_TO_MASK)))
            .transpose()?;

        let begin_instant = begin.as_ref().and_then(Time::instant);
        let end_instant = end.as_ref().and_then(Time::instant);
        if let (Some(b), Some(e)) = (begin_instant, end_instant) {
            let cycle = self.end.as_ref().and_then(Time::natural_step);
            if let (true, Some(cycle)) = (e < b, cycle) {
                debug!(begin = %b, end = %e, "range end precedes begin, moving one cycle");
                end = end.map(|e| e.add(&Duration::from_period(cycle)));
            }
        }
        let duration = match (&begin, &end) {
            (Some(b), Some(e)) if b.is_grounded() && e.is_grounded() => None,
            _ => self.duration.clone(),
        };
        let mut range = Range::new(begin, end, duration);
        range.meta = self.meta.clone();
        Ok(range)
    }
}

impl TemporalValue for Range {
    fn meta(&self) -> &TemporalMeta {
        &self.meta
    }

    fn with_meta(&self, meta: TemporalMeta) -> Self {
        let mut range = self.clone();
        range.meta = meta;
        range
    }

    fn timex_type(&self) -> TimexType {
        TimexType::Duration
    }

    /// `begin/end`, `begin/duration` or `duration/end`, whichever two parts
    /// are known.
    fn timex_value(&self) -> Option<String> {
        let begin = self.begin.as_ref().and_then(|b| b.timex_value());
        let end = self.end.as_ref().and_then(|e| e.timex_value());
        let duration = self.duration.as_ref().and_then(|d| d.timex_value());
        match (begin, end, duration) {
            (Some(b), Some(e), _) => Some(format!("{b}/{e}")),
            (Some(b), None, Some(d)) => Some(format!("{b}/{d}")),
            (None, Some(e), Some(d)) => Some(format!("{d}/{e}")),
            (None, None, Some(d)) => Some(d),
            _ => None,
        }
    }

    fn full_string(&self) -> String {
        let side = |t: &Option<Time>| t.as_ref().map_or_else(|| "?".to_string(), |t| t.full_string());
        let duration = self
            .duration
            .as_ref()
            .map_or_else(|| "?".to_string(), |d| d.full_string());
        format!("[{}, {}, {}]", side(&self.begin), side(&self.end), duration)
    }
}

impl fmt::Display for Range {
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

    fn day(y: i32, m: i32, d: i32) -> Time {
        Time::partial(
            Partial::from_fields(&[
                (FieldType::Year, y),
                (FieldType::MonthOfYear, m),
                (FieldType::DayOfMonth, d),
            ])
            .unwrap(),
        )
    }

    fn range(b: (i32, i32, i32), e: (i32, i32, i32)) -> Range {
        Range::new(Some(day(b.0, b.1, b.2)), Some(day(e.0, e.1, e.2)), None)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_duration_from_closed_endpoints() {
        let r = range((2016, 6, 20), (2016, 6, 26));
        assert_eq!(r.duration().unwrap().timex_value().unwrap(), "P1W");
        assert_eq!(r.timex_value().unwrap(), "2016-06-20/2016-06-26");
    }

    #[test]
    fn test_from_span_closes_at_unit() {
        let r = Range::from_span(at(2016, 6, 1, 0), at(2016, 7, 1, 0), TimeUnit::Day, None).unwrap();
        assert_eq!(r.timex_value().unwrap(), "2016-06-01/2016-06-30");
        assert_eq!(r.span(), Some((at(2016, 6, 1, 0), at(2016, 7, 1, 0))));
    }

    #[test]
    fn test_intersect_overlap() {
        let a = range((2016, 6, 1), (2016, 6, 20));
        let b = range((2016, 6, 10), (2016, 6, 30));
        let both = a.intersect(&b).unwrap();
        assert_eq!(both.timex_value().unwrap(), "2016-06-10/2016-06-20");
        let c = range((2016, 7, 1), (2016, 7, 2));
        assert!(a.intersect(&c).is_none());
    }

    #[test]
    fn test_offset_selected_endpoint() {
        let r = range((2016, 6, 1), (2016, 6, 10));
        let two_days = Duration::of(TimeUnit::Day, 2);
        let both = r.offset(&two_days, Flags::NONE);
        assert_eq!(both.timex_value().unwrap(), "2016-06-03/2016-06-12");
        let end_only = r.offset(&two_days, Flags::RANGE_OFFSET_END);
        assert_eq!(end_only.timex_value().unwrap(), "2016-06-01/2016-06-12");
    }

    #[test]
    fn test_add_recomputes_end_from_begin() {
        // Ten days, so the new length is twelve.
        let r = range((2016, 6, 1), (2016, 6, 10));
        let two_days = Duration::of(TimeUnit::Day, 2);
        let longer = r.add(&two_days, Flags::RANGE_EXPAND_FIX_BEGIN);
        assert_eq!(longer.timex_value().unwrap(), "2016-06-01/2016-06-13");
        assert_eq!(longer.span(), Some((at(2016, 6, 1, 0), at(2016, 6, 14, 0))));
    }

    #[test]
    fn test_add_recomputes_begin_from_end() {
        let r = range((2016, 6, 1), (2016, 6, 10));
        let two_days = Duration::of(TimeUnit::Day, 2);
        let unfixed = r.add(&two_days, Flags::NONE);
        assert_eq!(unfixed.timex_value().unwrap(), "2016-05-29/2016-06-10");
        let fixed_end = r.add(&two_days, Flags::RANGE_EXPAND_FIX_END);
        assert_eq!(fixed_end, unfixed);
    }

    #[test]
    fn test_subtract_shortens_from_begin() {
        let r = range((2016, 6, 1), (2016, 6, 10));
        let shorter = r.subtract(&Duration::of(TimeUnit::Day, 2), Flags::NONE);
        assert_eq!(shorter.timex_value().unwrap(), "2016-06-02/2016-06-10");
    }

    #[test]
    fn test_resolve_only_with_flag() {
        let r = Range::new(Some(Time::reference()), None, Some(Duration::of(TimeUnit::Day, 3)));
        let anchor = Time::grounded(at(2016, 6, 19, 10));
        let untouched = r.resolve(&anchor, Flags::NONE).unwrap();
        assert!(untouched.begin().unwrap().is_reference());
        let grounded = r.resolve(&anchor, Flags::RANGE_RESOLVE_TIME_REF).unwrap();
        assert_eq!(grounded.begin(), Some(&anchor));
        assert!(grounded.is_grounded());
    }

    #[test]
    fn test_resolve_endpoints_wraps_year() {
        let winter = Range::new(
            Some(Time::partial(
                Partial::from_fields(&[(FieldType::MonthOfYear, 12), (FieldType::DayOfMonth, 21)]).unwrap(),
            )),
            Some(Time::partial(
                Partial::from_fields(&[(FieldType::MonthOfYear, 3), (FieldType::DayOfMonth, 19)]).unwrap(),
            )),
            None,
        );
        let anchor = Time::grounded(at(2016, 6, 19, 10));
        let grounded = winter.resolve_endpoints(&anchor, Flags::NONE).unwrap();
        assert_eq!(grounded.timex_value().unwrap(), "2016-12-21/2017-03-19");
    }

    #[test]
    fn test_mid() {
        let r = range((2016, 6, 1), (2016, 6, 10));
        let mid = r.mid().unwrap();
        assert_eq!(mid.instant(), Some(at(2016, 6, 6, 0)));
    }
}
