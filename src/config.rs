//! Declarative filter chain configuration
//!
//! Parses TOML documents describing an ordered list of filters and builds a
//! [`FilterChain`] from them. Filters are listed as `[[filters]]` tables
//! discriminated by `type`:
//!
//! ```toml
//! [[filters]]
//! type = "common_tags"
//! tags = [{ key = "env", value = "prod" }]
//!
//! [[filters]]
//! type = "maximum_allowable_tags"
//! name = "http.server.requests"
//! tag_key = "uri"
//! max_values = 100
//! on_max_reached = { type = "deny" }
//!
//! [[filters]]
//! type = "max_expected"
//! prefix = "http"
//! meter_type = "timer"
//! millis = 5000
//! ```
//!
//! Arbitrary predicates and replacement functions cannot be expressed in a
//! file; the configurable variants cover name-prefix admission and fixed
//! replacement values.

use crate::chain::FilterChain;
use crate::error::{FilterError, FilterResult};
use crate::filter::{
    MeterFilter, accept_all, accept_name_starts_with, common_tags, deny_all,
    deny_name_starts_with, deny_unless_name_starts_with, ignore_tags, max_expected_summary,
    max_expected_timer, maximum_allowable_metrics, maximum_allowable_tags, min_expected_summary,
    min_expected_timer, rename_tag, replace_tag_values,
};
use crate::meter::{MeterType, Tag};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FilterChainConfig {
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Filters in evaluation order
    #[serde(default)]
    pub filters: Vec<FilterRule>,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Default level handed to [`crate::telemetry::init`]
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A single tag in a `common_tags` rule
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TagEntry {
    pub key: String,
    pub value: String,
}

/// Histogram bound for `max_expected` / `min_expected` rules
///
/// Timers take `millis`, distribution summaries take `value`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExpectedBoundRule {
    pub prefix: String,
    pub meter_type: MeterType,
    pub millis: Option<u64>,
    pub value: Option<f64>,
}

impl ExpectedBoundRule {
    fn validate(&self, at: &str) -> FilterResult<()> {
        match self.meter_type {
            MeterType::Timer => match (self.millis, self.value) {
                (Some(0), _) => Err(FilterError::Config(format!(
                    "{}: timer bound must be greater than 0 millis",
                    at
                ))),
                (Some(_), None) => Ok(()),
                (None, _) => Err(FilterError::Config(format!(
                    "{}: timer bound requires 'millis'",
                    at
                ))),
                (Some(_), Some(_)) => Err(FilterError::Config(format!(
                    "{}: timer bound takes 'millis', not 'value'",
                    at
                ))),
            },
            MeterType::DistributionSummary => match (self.value, self.millis) {
                (Some(v), None) if v.is_finite() && v >= 0.0 => Ok(()),
                (Some(v), None) => Err(FilterError::Config(format!(
                    "{}: summary bound must be a finite, non-negative number, got {}",
                    at, v
                ))),
                (None, _) => Err(FilterError::Config(format!(
                    "{}: summary bound requires 'value'",
                    at
                ))),
                (Some(_), Some(_)) => Err(FilterError::Config(format!(
                    "{}: summary bound takes 'value', not 'millis'",
                    at
                ))),
            },
            other => Err(FilterError::Config(format!(
                "{}: expected-value bounds only apply to timers and distribution summaries, got {}",
                at,
                other.as_str()
            ))),
        }
    }

    /// Bound in the unit used for comparisons between rules of the same type
    fn magnitude(&self) -> f64 {
        match self.meter_type {
            MeterType::Timer => self.millis.unwrap_or_default() as f64,
            _ => self.value.unwrap_or_default(),
        }
    }
}

/// One entry of the `[[filters]]` list
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterRule {
    CommonTags {
        tags: Vec<TagEntry>,
    },
    RenameTag {
        prefix: String,
        from_key: String,
        to_key: String,
    },
    IgnoreTags {
        keys: Vec<String>,
    },
    ReplaceTagValues {
        tag_key: String,
        replacement: String,
        #[serde(default)]
        exceptions: Vec<String>,
    },
    Accept,
    Deny,
    AcceptNameStartsWith {
        prefix: String,
    },
    DenyNameStartsWith {
        prefix: String,
    },
    DenyUnlessNameStartsWith {
        prefix: String,
    },
    MaximumAllowableMetrics {
        max: usize,
    },
    MaximumAllowableTags {
        name: String,
        tag_key: String,
        max_values: usize,
        on_max_reached: Box<FilterRule>,
    },
    MaxExpected(ExpectedBoundRule),
    MinExpected(ExpectedBoundRule),
}

impl FilterRule {
    /// Rule name as written in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommonTags { .. } => "common_tags",
            Self::RenameTag { .. } => "rename_tag",
            Self::IgnoreTags { .. } => "ignore_tags",
            Self::ReplaceTagValues { .. } => "replace_tag_values",
            Self::Accept => "accept",
            Self::Deny => "deny",
            Self::AcceptNameStartsWith { .. } => "accept_name_starts_with",
            Self::DenyNameStartsWith { .. } => "deny_name_starts_with",
            Self::DenyUnlessNameStartsWith { .. } => "deny_unless_name_starts_with",
            Self::MaximumAllowableMetrics { .. } => "maximum_allowable_metrics",
            Self::MaximumAllowableTags { .. } => "maximum_allowable_tags",
            Self::MaxExpected(_) => "max_expected",
            Self::MinExpected(_) => "min_expected",
        }
    }

    fn collect_bounds<'a>(
        &'a self,
        max_bounds: &mut HashMap<(&'a str, MeterType), f64>,
        min_bounds: &mut HashMap<(&'a str, MeterType), f64>,
    ) {
        match self {
            Self::MaxExpected(b) => {
                max_bounds.insert((b.prefix.as_str(), b.meter_type), b.magnitude());
            }
            Self::MinExpected(b) => {
                min_bounds.insert((b.prefix.as_str(), b.meter_type), b.magnitude());
            }
            Self::MaximumAllowableTags { on_max_reached, .. } => {
                on_max_reached.collect_bounds(max_bounds, min_bounds);
            }
            _ => {}
        }
    }

    fn is_cardinality_limiter(&self) -> bool {
        matches!(
            self,
            Self::MaximumAllowableMetrics { .. } | Self::MaximumAllowableTags { .. }
        )
    }

    fn validate(&self, at: &str) -> FilterResult<()> {
        let require_key = |field: &str, value: &str| -> FilterResult<()> {
            if value.is_empty() {
                Err(FilterError::Config(format!(
                    "{}: {} must not be empty",
                    at, field
                )))
            } else {
                Ok(())
            }
        };

        match self {
            Self::CommonTags { tags } => {
                for tag in tags {
                    require_key("tag key", &tag.key)?;
                }
                Ok(())
            }
            Self::RenameTag {
                from_key, to_key, ..
            } => {
                require_key("from_key", from_key)?;
                require_key("to_key", to_key)
            }
            Self::IgnoreTags { keys } => {
                if keys.is_empty() {
                    return Err(FilterError::Config(format!(
                        "{}: ignore_tags needs at least one key",
                        at
                    )));
                }
                for key in keys {
                    require_key("ignored key", key)?;
                }
                Ok(())
            }
            Self::ReplaceTagValues { tag_key, .. } => require_key("tag_key", tag_key),
            Self::MaximumAllowableTags {
                name,
                tag_key,
                on_max_reached,
                ..
            } => {
                require_key("name", name)?;
                require_key("tag_key", tag_key)?;
                if on_max_reached.is_cardinality_limiter() {
                    return Err(FilterError::Config(format!(
                        "{}: on_max_reached cannot be another cardinality limiter ({})",
                        at,
                        on_max_reached.kind()
                    )));
                }
                on_max_reached.validate(&format!("{}.on_max_reached", at))
            }
            Self::MaxExpected(bound) | Self::MinExpected(bound) => bound.validate(at),
            Self::Accept
            | Self::Deny
            | Self::AcceptNameStartsWith { .. }
            | Self::DenyNameStartsWith { .. }
            | Self::DenyUnlessNameStartsWith { .. }
            | Self::MaximumAllowableMetrics { .. } => Ok(()),
        }
    }

    /// Construct the filter this rule describes
    ///
    /// Assumes the rule has been validated.
    fn build(&self) -> Arc<dyn MeterFilter> {
        match self {
            Self::CommonTags { tags } => Arc::new(common_tags(
                tags.iter()
                    .map(|t| Tag::of(t.key.clone(), t.value.clone()))
                    .collect::<Vec<_>>(),
            )),
            Self::RenameTag {
                prefix,
                from_key,
                to_key,
            } => Arc::new(rename_tag(prefix.clone(), from_key.clone(), to_key.clone())),
            Self::IgnoreTags { keys } => Arc::new(ignore_tags(keys.clone())),
            Self::ReplaceTagValues {
                tag_key,
                replacement,
                exceptions,
            } => {
                let replacement = replacement.clone();
                Arc::new(replace_tag_values(
                    tag_key.clone(),
                    move |_: &str| replacement.clone(),
                    exceptions.clone(),
                ))
            }
            Self::Accept => Arc::new(accept_all()),
            Self::Deny => Arc::new(deny_all()),
            Self::AcceptNameStartsWith { prefix } => {
                Arc::new(accept_name_starts_with(prefix.clone()))
            }
            Self::DenyNameStartsWith { prefix } => Arc::new(deny_name_starts_with(prefix.clone())),
            Self::DenyUnlessNameStartsWith { prefix } => {
                Arc::new(deny_unless_name_starts_with(prefix.clone()))
            }
            Self::MaximumAllowableMetrics { max } => Arc::new(maximum_allowable_metrics(*max)),
            Self::MaximumAllowableTags {
                name,
                tag_key,
                max_values,
                on_max_reached,
            } => Arc::new(maximum_allowable_tags(
                name.clone(),
                tag_key.clone(),
                *max_values,
                on_max_reached.build(),
            )),
            Self::MaxExpected(bound) => match bound.meter_type {
                MeterType::Timer => Arc::new(max_expected_timer(
                    bound.prefix.clone(),
                    Duration::from_millis(bound.millis.unwrap_or_default()),
                )),
                _ => Arc::new(max_expected_summary(
                    bound.prefix.clone(),
                    bound.value.unwrap_or_default(),
                )),
            },
            Self::MinExpected(bound) => match bound.meter_type {
                MeterType::Timer => Arc::new(min_expected_timer(
                    bound.prefix.clone(),
                    Duration::from_millis(bound.millis.unwrap_or_default()),
                )),
                _ => Arc::new(min_expected_summary(
                    bound.prefix.clone(),
                    bound.value.unwrap_or_default(),
                )),
            },
        }
    }
}

impl FilterChainConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> FilterResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            FilterError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self =
            toml::from_str(&content).map_err(|source| FilterError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: Validate parsed config
        config
            .validate()
            .map_err(|e| FilterError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Parse and validate configuration held in memory
    ///
    /// Same as `content.parse()`; parse errors report the path as `<string>`.
    pub fn from_toml_str(content: &str) -> FilterResult<Self> {
        content.parse()
    }

    /// Validate every rule, then check bound pairs across rules
    ///
    /// Called automatically by `from_file()` and `build()`.
    pub fn validate(&self) -> FilterResult<()> {
        for (index, rule) in self.filters.iter().enumerate() {
            rule.validate(&format!("filters[{}] ({})", index, rule.kind()))?;
        }

        // A max bound below a min bound for the same meters leaves no usable range.
        // Bounds nested under on_max_reached count too; they configure the same ids.
        let mut max_bounds: HashMap<(&str, MeterType), f64> = HashMap::new();
        let mut min_bounds: HashMap<(&str, MeterType), f64> = HashMap::new();
        for rule in &self.filters {
            rule.collect_bounds(&mut max_bounds, &mut min_bounds);
        }
        for ((prefix, meter_type), max) in &max_bounds {
            if let Some(min) = min_bounds.get(&(*prefix, *meter_type)) {
                if max < min {
                    return Err(FilterError::Config(format!(
                        "max_expected ({}) is below min_expected ({}) for {} meters with prefix '{}'",
                        max,
                        min,
                        meter_type.as_str(),
                        prefix
                    )));
                }
            }
        }

        Ok(())
    }

    /// Validate and build the chain, preserving rule order
    pub fn build(&self) -> FilterResult<FilterChain> {
        self.validate()?;

        let mut chain = FilterChain::new();
        for rule in &self.filters {
            chain.push_shared(rule.build());
        }

        tracing::info!(filters = chain.len(), "Built meter filter chain from config");
        Ok(chain)
    }
}

impl FromStr for FilterChainConfig {
    type Err = FilterError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Self =
            toml::from_str(toml_str).map_err(|source| FilterError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
