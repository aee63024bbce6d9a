//! TIMEX3 attribute emission.
//!
//! [`TimexAnnotator`] takes the values a grammar layer has built for one
//! document, grounds them against the document's anchor time and produces
//! the attribute maps a TIMEX3 writer needs. Ids come from a [`TimeIndex`]
//! owned by the annotator, so one annotator serves exactly one document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, TemporalError};
use crate::flags::{Flags, RangePadding};
use crate::index::TimeIndex;
use crate::temporal::{Temporal, TemporalValue, TimexType};
use crate::time::Time;

// ── Configuration ───────────────────────────────────────────────────────────

/// How much guessing resolution may do for values that need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicLevel {
    /// Leave values unresolved.
    None,
    /// Resolve to the occurrence containing the anchor.
    #[default]
    Basic,
    /// Resolve to the occurrence closest to the anchor.
    More,
}

impl HeuristicLevel {
    /// Resolution flags for this level, `None` when nothing is resolved.
    pub fn resolve_flags(self) -> Option<Flags> {
        match self {
            HeuristicLevel::None => None,
            HeuristicLevel::Basic => Some(Flags::RESOLVE_TO_THIS),
            HeuristicLevel::More => Some(Flags::RESOLVE_TO_CLOSEST),
        }
    }
}

/// Options for [`TimexAnnotator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimexOptions {
    pub heuristic_level: HeuristicLevel,
    /// Emit separate entries for range endpoints.
    pub include_nested: bool,
    /// Add the `range` attribute to times that cover an interval.
    pub include_range: bool,
    /// Render ranges as TIMEX3 durations with begin and end points, and
    /// skip values that have no canonical `value`.
    pub restrict_to_timex3: bool,
}

impl Default for TimexOptions {
    fn default() -> Self {
        TimexOptions {
            heuristic_level: HeuristicLevel::Basic,
            include_nested: false,
            include_range: false,
            restrict_to_timex3: true,
        }
    }
}

impl TimexOptions {
    /// Options from JSON; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TemporalError::Config(e.to_string()))
    }

    pub fn resolve_flags(&self) -> Option<Flags> {
        self.heuristic_level.resolve_flags()
    }
}

// ── Attributes ──────────────────────────────────────────────────────────────

/// The attributes of one TIMEX3 element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimexAttributes {
    pub tid: String,
    #[serde(rename = "type")]
    pub timex_type: TimexType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "mod", skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freq: Option<String>,
    #[serde(rename = "beginPoint", skip_serializing_if = "Option::is_none")]
    pub begin_point: Option<String>,
    #[serde(rename = "endPoint", skip_serializing_if = "Option::is_none")]
    pub end_point: Option<String>,
    #[serde(rename = "temporalFunction", skip_serializing_if = "std::ops::Not::not")]
    pub temporal_function: bool,
    #[serde(rename = "valueFromFunction", skip_serializing_if = "Option::is_none")]
    pub value_from_function: Option<String>,
    #[serde(rename = "anchorTimeID", skip_serializing_if = "Option::is_none")]
    pub anchor_time_id: Option<String>,
    #[serde(rename = "alt_value", skip_serializing_if = "Option::is_none")]
    pub alt_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

impl TimexAttributes {
    fn new(tid: String, timex_type: TimexType) -> Self {
        TimexAttributes {
            tid,
            timex_type,
            value: None,
            modifier: None,
            quant: None,
            freq: None,
            begin_point: None,
            end_point: None,
            temporal_function: false,
            value_from_function: None,
            anchor_time_id: None,
            alt_value: None,
            range: None,
        }
    }

    /// The set attributes keyed by their TIMEX3 names.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn tid(id: u32) -> String {
    format!("t{id}")
}

// ── Annotator ───────────────────────────────────────────────────────────────

pub struct TimexAnnotator {
    anchor: Time,
    options: TimexOptions,
    index: TimeIndex,
}

impl TimexAnnotator {
    pub fn new(anchor: Time, options: TimexOptions) -> Self {
        TimexAnnotator {
            anchor,
            options,
            index: TimeIndex::new(),
        }
    }

    pub fn anchor(&self) -> &Time {
        &self.anchor
    }

    pub fn options(&self) -> &TimexOptions {
        &self.options
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    /// Attributes for `temporal`, the value built for the expression `text`.
    ///
    /// The first entry describes the value itself. With `include_nested`,
    /// entries for a range's endpoints follow it. Under `restrict_to_timex3`
    /// a value without a canonical form produces no entries.
    pub fn annotate(&mut self, text: &str, temporal: &Temporal) -> Result<Vec<TimexAttributes>> {
        let expression = self.index.register_expression(text);
        let resolved = match self.options.resolve_flags() {
            Some(flags) => temporal.resolve(&self.anchor, flags)?,
            None => temporal.clone(),
        };
        let from_function = resolved != *temporal;
        debug!(text, value = %resolved, from_function, "annotating temporal expression");

        let value = match &resolved {
            Temporal::Range(range) if self.options.restrict_to_timex3 => {
                range.duration().and_then(|d| d.timex_value())
            }
            other => other.timex_value(),
        };
        if value.is_none() && self.options.restrict_to_timex3 {
            debug!(text, "no canonical value, skipping");
            return Ok(Vec::new());
        }

        let id = self.index.register(&resolved);
        let mut main = TimexAttributes::new(tid(id), resolved.timex_type());
        main.value = value;
        main.modifier = resolved.modifier().map(str::to_string);
        main.alt_value = resolved.alt_value();

        if from_function {
            main.temporal_function = true;
            main.value_from_function = Some(format!("tf{expression}"));
            main.anchor_time_id = Some(tid(TimeIndex::REFERENCE_ID));
        }

        let mut nested = Vec::new();
        match &resolved {
            Temporal::Set(set) => {
                main.quant = set.quant().map(str::to_string);
                main.freq = set.freq().map(str::to_string);
            }
            Temporal::Range(range) if self.options.restrict_to_timex3 => {
                main.timex_type = TimexType::Duration;
                main.alt_value = range.timex_value();
                for (endpoint, slot) in [
                    (range.begin(), &mut main.begin_point),
                    (range.end(), &mut main.end_point),
                ] {
                    let Some(point) = endpoint else {
                        continue;
                    };
                    let point = Temporal::Time(point.clone());
                    let point_id = self.index.register(&point);
                    *slot = Some(tid(point_id));
                    if self.options.include_nested {
                        let mut attrs = TimexAttributes::new(tid(point_id), point.timex_type());
                        attrs.value = point.timex_value();
                        attrs.alt_value = point.alt_value();
                        nested.push(attrs);
                    }
                }
            }
            Temporal::Time(time) if self.options.include_range => {
                main.range = time
                    .range(RangePadding::Auto)
                    .and_then(|r| r.timex_value())
                    .filter(|r| Some(r) != main.value.as_ref());
            }
            _ => {}
        }

        let mut out = Vec::with_capacity(1 + nested.len());
        out.push(main);
        out.extend(nested);
        Ok(out)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
