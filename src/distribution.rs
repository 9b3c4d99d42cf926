//! Distribution statistics configuration
//!
//! Histogram settings attached to timers and distribution summaries. Filters
//! only ever build partial overrides and merge them onto the config they were
//! handed; a field set on the override wins, everything else is inherited.

use std::time::Duration;

/// Immutable histogram configuration snapshot
///
/// Every field is optional. An unset field means "inherit from whatever this
/// config is merged onto".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistributionStatisticConfig {
    percentile_histogram: Option<bool>,
    percentiles: Option<Vec<f64>>,
    percentile_precision: Option<u32>,
    service_level_objectives: Option<Vec<f64>>,
    minimum_expected_value: Option<f64>,
    maximum_expected_value: Option<f64>,
    expiry: Option<Duration>,
    buffer_length: Option<u32>,
}

impl DistributionStatisticConfig {
    /// Config with no field set
    pub fn none() -> Self {
        Self::default()
    }

    pub fn builder() -> DistributionStatisticConfigBuilder {
        DistributionStatisticConfigBuilder::default()
    }

    /// Overlay `self` on `parent`
    ///
    /// Fields explicitly set on `self` take precedence; unset fields fall back
    /// to `parent`.
    pub fn merge(&self, parent: &DistributionStatisticConfig) -> DistributionStatisticConfig {
        DistributionStatisticConfig {
            percentile_histogram: self.percentile_histogram.or(parent.percentile_histogram),
            percentiles: self
                .percentiles
                .clone()
                .or_else(|| parent.percentiles.clone()),
            percentile_precision: self.percentile_precision.or(parent.percentile_precision),
            service_level_objectives: self
                .service_level_objectives
                .clone()
                .or_else(|| parent.service_level_objectives.clone()),
            minimum_expected_value: self
                .minimum_expected_value
                .or(parent.minimum_expected_value),
            maximum_expected_value: self
                .maximum_expected_value
                .or(parent.maximum_expected_value),
            expiry: self.expiry.or(parent.expiry),
            buffer_length: self.buffer_length.or(parent.buffer_length),
        }
    }

    pub fn percentile_histogram(&self) -> Option<bool> {
        self.percentile_histogram
    }

    pub fn percentiles(&self) -> Option<&[f64]> {
        self.percentiles.as_deref()
    }

    pub fn percentile_precision(&self) -> Option<u32> {
        self.percentile_precision
    }

    pub fn service_level_objectives(&self) -> Option<&[f64]> {
        self.service_level_objectives.as_deref()
    }

    /// Lower histogram bound (nanoseconds for timers)
    pub fn minimum_expected_value(&self) -> Option<f64> {
        self.minimum_expected_value
    }

    /// Upper histogram bound (nanoseconds for timers)
    pub fn maximum_expected_value(&self) -> Option<f64> {
        self.maximum_expected_value
    }

    pub fn expiry(&self) -> Option<Duration> {
        self.expiry
    }

    pub fn buffer_length(&self) -> Option<u32> {
        self.buffer_length
    }
}

/// Builder for partial [`DistributionStatisticConfig`] overrides
#[derive(Debug, Clone, Default)]
pub struct DistributionStatisticConfigBuilder {
    config: DistributionStatisticConfig,
}

impl DistributionStatisticConfigBuilder {
    pub fn percentile_histogram(mut self, enabled: bool) -> Self {
        self.config.percentile_histogram = Some(enabled);
        self
    }

    pub fn percentiles(mut self, percentiles: impl Into<Vec<f64>>) -> Self {
        self.config.percentiles = Some(percentiles.into());
        self
    }

    pub fn percentile_precision(mut self, precision: u32) -> Self {
        self.config.percentile_precision = Some(precision);
        self
    }

    pub fn service_level_objectives(mut self, slos: impl Into<Vec<f64>>) -> Self {
        self.config.service_level_objectives = Some(slos.into());
        self
    }

    pub fn minimum_expected_value(mut self, min: f64) -> Self {
        self.config.minimum_expected_value = Some(min);
        self
    }

    pub fn maximum_expected_value(mut self, max: f64) -> Self {
        self.config.maximum_expected_value = Some(max);
        self
    }

    pub fn expiry(mut self, expiry: Duration) -> Self {
        self.config.expiry = Some(expiry);
        self
    }

    pub fn buffer_length(mut self, length: u32) -> Self {
        self.config.buffer_length = Some(length);
        self
    }

    pub fn build(self) -> DistributionStatisticConfig {
        self.config
    }
}
