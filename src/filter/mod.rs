//! Meter filters
//!
//! As a registry is asked to create a new meter, every filter in its chain gets
//! a chance to rewrite the meter's id, veto the meter entirely, and adjust the
//! histogram configuration of timers and distribution summaries.
//!
//! A filter is anything implementing [`MeterFilter`]. The constructors in this
//! module cover the common cases:
//!
//! - identity rewriting: [`common_tags`], [`rename_tag`], [`ignore_tags`],
//!   [`replace_tag_values`]
//! - admission: [`accept`], [`deny`], [`deny_unless`], [`accept_all`],
//!   [`deny_all`], [`deny_name_starts_with`]
//! - cardinality limits: [`maximum_allowable_metrics`], [`maximum_allowable_tags`]
//! - histogram bounds: [`max_expected_timer`], [`max_expected_summary`],
//!   [`min_expected_timer`], [`min_expected_summary`]
//!
//! Filters are shared across every registration attempt for the lifetime of
//! their chain, so they must be `Send + Sync`.

pub mod admission;
pub mod bounds;
pub mod cardinality;
pub mod mapping;

pub use admission::{
    NamePrefix, PredicateFilter, accept, accept_all, accept_name_starts_with, deny, deny_all,
    deny_name_starts_with, deny_unless, deny_unless_name_starts_with,
};
pub use bounds::{
    ExpectedBound, max_expected_summary, max_expected_timer, min_expected_summary,
    min_expected_timer,
};
pub use cardinality::{
    MaximumAllowableMetrics, MaximumAllowableTags, maximum_allowable_metrics,
    maximum_allowable_tags,
};
pub use mapping::{
    CommonTags, IgnoreTags, RenameTag, ReplaceTagValues, common_tags, ignore_tags, rename_tag,
    replace_tag_values,
};

use crate::distribution::DistributionStatisticConfig;
use crate::meter::MeterId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Admission decision returned by [`MeterFilter::accept`]
///
/// Within a chain the first reply that is not `Neutral` wins and the remaining
/// filters are not consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterFilterReply {
    /// Register the meter, skipping any later filters
    Accept,
    /// Replace the meter with a no-op, skipping any later filters
    Deny,
    /// No opinion; defer to the next filter
    Neutral,
}

impl MeterFilterReply {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Deny => "deny",
            Self::Neutral => "neutral",
        }
    }
}

/// Capability set of a meter filter
///
/// Every operation defaults to a pass-through, so an implementation only
/// overrides what it cares about.
///
/// # Contract
///
/// - `map` receives the id produced by the previous filter and must return an
///   id; it is never consulted for admission.
/// - `accept` sees the id after the whole chain's `map` pass.
/// - `configure` is only called for timers and distribution summaries and
///   must return a config. Returning something unrelated to the input (for
///   example a fresh empty config) silently discards upstream overrides.
///
/// Panics raised by caller-supplied closures inside a filter propagate to the
/// registering caller; nothing here catches them.
pub trait MeterFilter: Send + Sync {
    /// Rewrite the id (name or tags)
    fn map(&self, id: MeterId) -> MeterId {
        id
    }

    /// Decide whether a real meter should be registered for `id`
    fn accept(&self, _id: &MeterId) -> MeterFilterReply {
        MeterFilterReply::Neutral
    }

    /// Override parts of the histogram config for `id`
    fn configure(
        &self,
        _id: &MeterId,
        config: DistributionStatisticConfig,
    ) -> DistributionStatisticConfig {
        config
    }
}

impl<F: MeterFilter + ?Sized> MeterFilter for Arc<F> {
    fn map(&self, id: MeterId) -> MeterId {
        (**self).map(id)
    }

    fn accept(&self, id: &MeterId) -> MeterFilterReply {
        (**self).accept(id)
    }

    fn configure(
        &self,
        id: &MeterId,
        config: DistributionStatisticConfig,
    ) -> DistributionStatisticConfig {
        (**self).configure(id, config)
    }
}

impl<F: MeterFilter + ?Sized> MeterFilter for Box<F> {
    fn map(&self, id: MeterId) -> MeterId {
        (**self).map(id)
    }

    fn accept(&self, id: &MeterId) -> MeterFilterReply {
        (**self).accept(id)
    }

    fn configure(
        &self,
        id: &MeterId,
        config: DistributionStatisticConfig,
    ) -> DistributionStatisticConfig {
        (**self).configure(id, config)
    }
}

/// Filter whose `map` is a closure
pub struct MapFn<F>(F);

impl<F> MeterFilter for MapFn<F>
where
    F: Fn(MeterId) -> MeterId + Send + Sync,
{
    fn map(&self, id: MeterId) -> MeterId {
        (self.0)(id)
    }
}

/// Filter whose `accept` is a closure
pub struct AcceptFn<F>(F);

impl<F> MeterFilter for AcceptFn<F>
where
    F: Fn(&MeterId) -> MeterFilterReply + Send + Sync,
{
    fn accept(&self, id: &MeterId) -> MeterFilterReply {
        (self.0)(id)
    }
}

/// Filter whose `configure` is a closure
pub struct ConfigureFn<F>(F);

impl<F> MeterFilter for ConfigureFn<F>
where
    F: Fn(&MeterId, DistributionStatisticConfig) -> DistributionStatisticConfig + Send + Sync,
{
    fn configure(
        &self,
        id: &MeterId,
        config: DistributionStatisticConfig,
    ) -> DistributionStatisticConfig {
        (self.0)(id, config)
    }
}

/// Wrap a closure as a filter that only rewrites ids
pub fn map_fn<F>(f: F) -> MapFn<F>
where
    F: Fn(MeterId) -> MeterId + Send + Sync,
{
    MapFn(f)
}

/// Wrap a closure as a filter that only makes admission decisions
pub fn accept_fn<F>(f: F) -> AcceptFn<F>
where
    F: Fn(&MeterId) -> MeterFilterReply + Send + Sync,
{
    AcceptFn(f)
}

/// Wrap a closure as a filter that only adjusts histogram config
pub fn configure_fn<F>(f: F) -> ConfigureFn<F>
where
    F: Fn(&MeterId, DistributionStatisticConfig) -> DistributionStatisticConfig + Send + Sync,
{
    ConfigureFn(f)
}
