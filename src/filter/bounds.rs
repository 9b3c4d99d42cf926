//! Histogram bound filters
//!
//! Inject a minimum or maximum expected value into the distribution config of
//! timers or distribution summaries whose name starts with a prefix. Timer
//! bounds are expressed in nanoseconds.

use super::MeterFilter;
use crate::distribution::DistributionStatisticConfig;
use crate::meter::{MeterId, MeterType};
use std::time::Duration;

/// Merges a min or max expected value into matching meters' config
pub struct ExpectedBound {
    prefix: String,
    meter_type: MeterType,
    /// Partial config carrying only the bound; merged over the incoming config
    bound: DistributionStatisticConfig,
}

impl MeterFilter for ExpectedBound {
    fn configure(
        &self,
        id: &MeterId,
        config: DistributionStatisticConfig,
    ) -> DistributionStatisticConfig {
        if id.meter_type() == self.meter_type && id.name().starts_with(&self.prefix) {
            self.bound.merge(&config)
        } else {
            config
        }
    }
}

fn nanos(duration: Duration) -> f64 {
    duration.as_nanos() as f64
}

/// Maximum expected value for timers whose name starts with `prefix`
pub fn max_expected_timer(prefix: impl Into<String>, max: Duration) -> ExpectedBound {
    ExpectedBound {
        prefix: prefix.into(),
        meter_type: MeterType::Timer,
        bound: DistributionStatisticConfig::builder()
            .maximum_expected_value(nanos(max))
            .build(),
    }
}

/// Maximum expected value for distribution summaries whose name starts with `prefix`
pub fn max_expected_summary(prefix: impl Into<String>, max: f64) -> ExpectedBound {
    ExpectedBound {
        prefix: prefix.into(),
        meter_type: MeterType::DistributionSummary,
        bound: DistributionStatisticConfig::builder()
            .maximum_expected_value(max)
            .build(),
    }
}

/// Minimum expected value for timers whose name starts with `prefix`
pub fn min_expected_timer(prefix: impl Into<String>, min: Duration) -> ExpectedBound {
    ExpectedBound {
        prefix: prefix.into(),
        meter_type: MeterType::Timer,
        bound: DistributionStatisticConfig::builder()
            .minimum_expected_value(nanos(min))
            .build(),
    }
}

/// Minimum expected value for distribution summaries whose name starts with `prefix`
pub fn min_expected_summary(prefix: impl Into<String>, min: f64) -> ExpectedBound {
    ExpectedBound {
        prefix: prefix.into(),
        meter_type: MeterType::DistributionSummary,
        bound: DistributionStatisticConfig::builder()
            .minimum_expected_value(min)
            .build(),
    }
}
