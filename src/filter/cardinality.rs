//! Cardinality-limiting filters
//!
//! Both filters keep a private set of what they have observed so far. The set
//! is safe for concurrent insertion, but the "check size, insert, check size
//! again" sequence is not atomic as a whole: when many registrations race, the
//! effective cap can be overshot by up to the number of racing callers. The
//! limits are best-effort cost controls, not hard guarantees.

use super::{MeterFilter, MeterFilterReply};
use crate::distribution::DistributionStatisticConfig;
use crate::meter::MeterId;
use dashmap::DashSet;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Global cap on the number of distinct meter ids (name + tags)
///
/// Returned by [`maximum_allowable_metrics`].
///
/// # Tripped state
///
/// The size check runs *before* membership is consulted. As soon as one
/// overflowing id has been recorded, the set is larger than the cap and every
/// later call is denied, including ids that were admitted earlier. This is
/// long-standing behavior that callers may rely on; it is kept as is.
pub struct MaximumAllowableMetrics {
    max: usize,
    ids: DashSet<MeterId>,
    tripped: AtomicBool,
}

impl MaximumAllowableMetrics {
    /// Number of distinct ids recorded so far
    pub fn observed_len(&self) -> usize {
        self.ids.len()
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Whether the cap has been exceeded at least once
    pub fn is_tripped(&self) -> bool {
        self.ids.len() > self.max
    }

    fn deny(&self, id: &MeterId) -> MeterFilterReply {
        if !self.tripped.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                meter = id.name(),
                max = self.max,
                "Maximum allowable metrics exceeded, denying all further registrations"
            );
        } else {
            tracing::debug!(meter = id.name(), max = self.max, "Denied by metric cap");
        }
        MeterFilterReply::Deny
    }
}

impl MeterFilter for MaximumAllowableMetrics {
    fn accept(&self, id: &MeterId) -> MeterFilterReply {
        if self.ids.len() > self.max {
            return self.deny(id);
        }

        if !self.ids.contains(id) {
            self.ids.insert(id.clone());
        }

        if self.ids.len() > self.max {
            self.deny(id)
        } else {
            MeterFilterReply::Neutral
        }
    }
}

/// Limit the total number of distinct name/tag combinations to `max`
///
/// Useful for cost control against backends that bill per time series. The
/// filter does not rank meters; everything you intend to keep should fit under
/// the cap.
pub fn maximum_allowable_metrics(max: usize) -> MaximumAllowableMetrics {
    MaximumAllowableMetrics {
        max,
        ids: DashSet::new(),
        tripped: AtomicBool::new(false),
    }
}

/// Cap on distinct values of one tag for one meter name
///
/// Returned by [`maximum_allowable_tags`].
pub struct MaximumAllowableTags<F> {
    name: String,
    tag_key: String,
    max_values: usize,
    on_max_reached: F,
    observed: RwLock<BTreeSet<String>>,
    tripped: AtomicBool,
}

impl<F> MaximumAllowableTags<F> {
    /// Number of distinct tag values recorded so far
    pub fn observed_len(&self) -> usize {
        self.observed.read().len()
    }

    /// Recorded tag values in sorted order
    pub fn observed_values(&self) -> Vec<String> {
        self.observed.read().iter().cloned().collect()
    }

    fn over_limit(&self) -> bool {
        self.observed_len() > self.max_values
    }

    fn record(&self, value: &str) -> usize {
        {
            let observed = self.observed.read();
            if observed.contains(value) {
                return observed.len();
            }
        }
        let mut observed = self.observed.write();
        observed.insert(value.to_owned());
        observed.len()
    }
}

impl<F: MeterFilter> MeterFilter for MaximumAllowableTags<F> {
    fn accept(&self, id: &MeterId) -> MeterFilterReply {
        if id.name() != self.name {
            return MeterFilterReply::Neutral;
        }
        let Some(value) = id.tag(&self.tag_key) else {
            return MeterFilterReply::Neutral;
        };

        if self.record(value) > self.max_values {
            if !self.tripped.swap(true, Ordering::Relaxed) {
                tracing::warn!(
                    meter = %self.name,
                    tag_key = %self.tag_key,
                    max_values = self.max_values,
                    "Maximum allowable tag values exceeded, delegating to overflow filter"
                );
            }
            return self.on_max_reached.accept(id);
        }

        MeterFilterReply::Neutral
    }

    fn configure(
        &self,
        id: &MeterId,
        config: DistributionStatisticConfig,
    ) -> DistributionStatisticConfig {
        if self.over_limit() {
            self.on_max_reached.configure(id, config)
        } else {
            config
        }
    }
}

/// Bound the number of distinct values of `tag_key` on meters named `name`
///
/// Once more than `max_values` distinct values have been seen, admission and
/// histogram configuration are delegated to `on_max_reached` (often
/// [`deny_all`](super::deny_all)).
///
/// `name` is compared for exact equality, not as a prefix.
///
/// Only `accept` and `configure` are delegated. If the overflow behavior needs
/// to rewrite ids (say, collapsing the tag value), add `on_max_reached` to the
/// chain separately so its `map` runs.
pub fn maximum_allowable_tags<F: MeterFilter>(
    name: impl Into<String>,
    tag_key: impl Into<String>,
    max_values: usize,
    on_max_reached: F,
) -> MaximumAllowableTags<F> {
    MaximumAllowableTags {
        name: name.into(),
        tag_key: tag_key.into(),
        max_values,
        on_max_reached,
        observed: RwLock::new(BTreeSet::new()),
        tripped: AtomicBool::new(false),
    }
}
