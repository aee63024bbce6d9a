//! Per-document registry of temporal values and their source expressions.
//!
//! Ids are handed out on first registration and never reused. Id 0 is the
//! reference time. One index belongs to one analysis unit; build a fresh
//! one per document.

use bimap::BiHashMap;
use tracing::trace;

use crate::temporal::Temporal;
use crate::time::Time;

#[derive(Debug, Clone)]
pub struct TimeIndex {
    temporals: BiHashMap<u32, Temporal>,
    expressions: BiHashMap<u32, String>,
    next_temporal: u32,
    next_expression: u32,
}

impl TimeIndex {
    /// Id of the reference time.
    pub const REFERENCE_ID: u32 = 0;

    pub fn new() -> Self {
        let mut temporals = BiHashMap::new();
        temporals.insert(Self::REFERENCE_ID, Temporal::Time(Time::reference()));
        TimeIndex {
            temporals,
            expressions: BiHashMap::new(),
            next_temporal: Self::REFERENCE_ID + 1,
            next_expression: 1,
        }
    }

    /// Id of `temporal`, registering it if unseen.
    pub fn register(&mut self, temporal: &Temporal) -> u32 {
        if let Some(id) = self.temporals.get_by_right(temporal) {
            return *id;
        }
        let id = self.next_temporal;
        self.next_temporal += 1;
        self.temporals.insert(id, temporal.clone());
        trace!(id, value = %temporal, "registered temporal");
        id
    }

    pub fn id_of(&self, temporal: &Temporal) -> Option<u32> {
        self.temporals.get_by_right(temporal).copied()
    }

    pub fn get(&self, id: u32) -> Option<&Temporal> {
        self.temporals.get_by_left(&id)
    }

    /// Id of a source expression, registering it if unseen.
    pub fn register_expression(&mut self, text: &str) -> u32 {
        if let Some(id) = self.expressions.get_by_right(text) {
            return *id;
        }
        let id = self.next_expression;
        self.next_expression += 1;
        self.expressions.insert(id, text.to_string());
        trace!(id, text, "registered expression");
        id
    }

    pub fn expression_id(&self, text: &str) -> Option<u32> {
        self.expressions.get_by_right(text).copied()
    }

    pub fn expression(&self, id: u32) -> Option<&str> {
        self.expressions.get_by_left(&id).map(String::as_str)
    }

    /// Registered temporals, the reference included.
    pub fn len(&self) -> usize {
        self.temporals.len()
    }

    /// True when nothing beyond the reference has been registered.
    pub fn is_empty(&self) -> bool {
        self.temporals.len() <= 1
    }
}

impl Default for TimeIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Duration;
    use crate::field::TimeUnit;

    #[test]
    fn test_reference_is_id_zero() {
        let index = TimeIndex::new();
        assert_eq!(index.id_of(&Temporal::Time(Time::reference())), Some(0));
        assert!(index.is_empty());
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut index = TimeIndex::new();
        let week: Temporal = Duration::of(TimeUnit::Week, 1).into();
        let day: Temporal = Duration::of(TimeUnit::Day, 1).into();
        let a = index.register(&week);
        let b = index.register(&day);
        assert_eq!((a, b), (1, 2));
        assert_eq!(index.register(&week), 1);
        assert_eq!(index.get(2), Some(&day));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_expressions_have_their_own_ids() {
        let mut index = TimeIndex::new();
        assert_eq!(index.register_expression("next week"), 1);
        assert_eq!(index.register_expression("June"), 2);
        assert_eq!(index.register_expression("next week"), 1);
        assert_eq!(index.expression(2), Some("June"));
        assert_eq!(index.expression_id("June"), Some(2));
    }
}
