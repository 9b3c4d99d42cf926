//! Meter identity and tag model
//!
//! A `MeterId` names a meter before the registry materializes it. Filters never
//! mutate an id in place; every rewrite produces a new value.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Kind of meter being registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterType {
    Counter,
    Gauge,
    Timer,
    DistributionSummary,
    LongTaskTimer,
    Other,
}

impl MeterType {
    /// Whether meters of this type carry a distribution statistics config
    ///
    /// Only timers and distribution summaries go through the configure pass.
    pub fn uses_distribution_config(&self) -> bool {
        matches!(self, MeterType::Timer | MeterType::DistributionSummary)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeterType::Counter => "counter",
            MeterType::Gauge => "gauge",
            MeterType::Timer => "timer",
            MeterType::DistributionSummary => "distribution_summary",
            MeterType::LongTaskTimer => "long_task_timer",
            MeterType::Other => "other",
        }
    }
}

/// A single key/value dimension on a meter
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Tag {
    key: String,
    value: String,
}

impl Tag {
    pub fn of(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Tag {
    fn from((key, value): (K, V)) -> Self {
        Tag::of(key, value)
    }
}

/// Identity of a meter: name, ordered tags, unit, description and type
///
/// Tags keep insertion order and may contain duplicates; nothing here
/// normalizes them. Equality and hashing only look at the name and the tag
/// list, so two ids differing only in unit, description or type are the same
/// time series.
#[derive(Debug, Clone)]
pub struct MeterId {
    name: String,
    tags: Vec<Tag>,
    base_unit: Option<String>,
    description: Option<String>,
    meter_type: MeterType,
}

impl MeterId {
    /// Create an id with no tags, unit or description
    pub fn new(name: impl Into<String>, meter_type: MeterType) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            base_unit: None,
            description: None,
            meter_type,
        }
    }

    /// Replace the tag list
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_base_unit(mut self, base_unit: impl Into<String>) -> Self {
        self.base_unit = Some(base_unit.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Rebuild the tag list, keeping name, unit, description and type
    pub fn map_tags<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Vec<Tag>) -> Vec<Tag>,
    {
        self.tags = f(std::mem::take(&mut self.tags));
        self
    }

    /// Same id under a different name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Value of the first tag carrying `key`, if any
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    pub fn base_unit(&self) -> Option<&str> {
        self.base_unit.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn meter_type(&self) -> MeterType {
        self.meter_type
    }
}

impl PartialEq for MeterId {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.tags == other.tags
    }
}

impl Eq for MeterId {}

impl Hash for MeterId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.tags.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tag_lookup_returns_first_match() {
        let id = MeterId::new("http.requests", MeterType::Counter)
            .with_tags([("method", "GET"), ("method", "POST")]);
        assert_eq!(id.tag("method"), Some("GET"));
        assert_eq!(id.tag("status"), None);
    }

    #[test]
    fn test_equality_ignores_unit_description_and_type() {
        let a = MeterId::new("db.calls", MeterType::Counter)
            .with_tags([("table", "users")])
            .with_base_unit("calls");
        let b = MeterId::new("db.calls", MeterType::Timer)
            .with_tags([("table", "users")])
            .with_description("database calls");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b), "same name and tags must hash identically");
    }

    #[test]
    fn test_equality_is_sensitive_to_tag_order() {
        let a = MeterId::new("m", MeterType::Gauge).with_tags([("a", "1"), ("b", "2")]);
        let b = MeterId::new("m", MeterType::Gauge).with_tags([("b", "2"), ("a", "1")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_distribution_config_types() {
        assert!(MeterType::Timer.uses_distribution_config());
        assert!(MeterType::DistributionSummary.uses_distribution_config());
        assert!(!MeterType::Counter.uses_distribution_config());
        assert!(!MeterType::LongTaskTimer.uses_distribution_config());
    }
}
