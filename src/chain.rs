//! Filter chain evaluation
//!
//! A [`FilterChain`] is the ordered list of filters a registry consults for
//! every new meter. Evaluation is three passes over the same list:
//!
//! 1. `map`: the id is folded through every filter in insertion order.
//! 2. `accept`: the mapped id is offered to each filter in order; the first
//!    reply that is not `Neutral` is final.
//! 3. `configure`: for timers and distribution summaries, the histogram
//!    config is folded through every filter in order. This pass never stops
//!    early.
//!
//! The result of a registration is computed once. Filters pushed onto the
//! chain afterwards have no effect on it.

use crate::distribution::DistributionStatisticConfig;
use crate::filter::{MeterFilter, MeterFilterReply};
use crate::meter::MeterId;
use std::fmt;
use std::sync::Arc;

/// Ordered filter list owned by a registry
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn MeterFilter>>,
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

/// Outcome of running a candidate meter through a chain
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// Id after the mapping pass
    pub id: MeterId,
    /// Admission decision for `id`
    pub reply: MeterFilterReply,
    /// Final histogram config; `None` for meter types without one
    pub config: Option<DistributionStatisticConfig>,
}

impl Registration {
    /// Whether the registry should materialize a real meter
    ///
    /// `Accept` and `Neutral` both record normally; only `Deny` yields a no-op.
    pub fn is_enabled(&self) -> bool {
        self.reply != MeterFilterReply::Deny
    }
}

impl FilterChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter, builder style
    pub fn with_filter<F: MeterFilter + 'static>(mut self, filter: F) -> Self {
        self.push(filter);
        self
    }

    /// Append a filter
    ///
    /// Only registrations evaluated after this call see the new filter.
    pub fn push<F: MeterFilter + 'static>(&mut self, filter: F) {
        self.filters.push(Arc::new(filter));
    }

    /// Append an already shared filter
    pub fn push_shared(&mut self, filter: Arc<dyn MeterFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run all three passes for a candidate meter
    ///
    /// `initial_config` is only folded through the chain when the mapped id's
    /// meter type carries a distribution config.
    pub fn register(
        &self,
        id: MeterId,
        initial_config: DistributionStatisticConfig,
    ) -> Registration {
        let id = self.map(id);
        let reply = self.accept(&id);

        let config = id
            .meter_type()
            .uses_distribution_config()
            .then(|| self.configure(&id, initial_config));

        if reply == MeterFilterReply::Deny {
            tracing::debug!(
                meter = id.name(),
                meter_type = id.meter_type().as_str(),
                reply = reply.as_str(),
                "Meter denied by filter chain"
            );
        } else {
            tracing::trace!(
                meter = id.name(),
                meter_type = id.meter_type().as_str(),
                reply = reply.as_str(),
                tags = id.tags().len(),
                "Meter admitted by filter chain"
            );
        }

        Registration { id, reply, config }
    }
}

impl MeterFilter for FilterChain {
    fn map(&self, id: MeterId) -> MeterId {
        self.filters.iter().fold(id, |id, filter| filter.map(id))
    }

    fn accept(&self, id: &MeterId) -> MeterFilterReply {
        self.filters
            .iter()
            .map(|filter| filter.accept(id))
            .find(|reply| *reply != MeterFilterReply::Neutral)
            .unwrap_or(MeterFilterReply::Neutral)
    }

    fn configure(
        &self,
        id: &MeterId,
        config: DistributionStatisticConfig,
    ) -> DistributionStatisticConfig {
        self.filters
            .iter()
            .fold(config, |config, filter| filter.configure(id, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{
        accept_all, accept_fn, common_tags, configure_fn, deny_all, deny_name_starts_with,
        max_expected_timer, min_expected_timer, rename_tag,
    };
    use crate::meter::MeterType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_empty_chain_is_neutral_pass_through() {
        let chain = FilterChain::new();
        let id = MeterId::new("http.requests", MeterType::Counter);

        let registration = chain.register(id.clone(), DistributionStatisticConfig::none());
        assert_eq!(registration.id, id);
        assert_eq!(registration.reply, MeterFilterReply::Neutral);
        assert!(registration.is_enabled());
        assert_eq!(registration.config, None);
    }

    #[test]
    fn test_map_pass_runs_in_insertion_order() {
        let chain = FilterChain::new()
            .with_filter(common_tags([("method", "GET")]))
            .with_filter(rename_tag("http", "method", "verb"));
        let id = MeterId::new("http.requests", MeterType::Counter);

        assert_eq!(chain.map(id).tag("verb"), Some("GET"));
    }

    #[test]
    fn test_accept_pass_sees_mapped_id() {
        let chain = FilterChain::new()
            .with_filter(crate::filter::map_fn(|id: MeterId| id.with_name("jvm.gc")))
            .with_filter(deny_name_starts_with("jvm"));

        let registration = chain.register(
            MeterId::new("app.logins", MeterType::Counter),
            DistributionStatisticConfig::none(),
        );
        assert_eq!(registration.reply, MeterFilterReply::Deny);
        assert!(!registration.is_enabled());
    }

    #[test]
    fn test_first_decisive_reply_short_circuits() {
        let later_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&later_calls);

        let chain = FilterChain::new()
            .with_filter(accept_all())
            .with_filter(deny_all())
            .with_filter(accept_fn(move |_: &MeterId| {
                counter.fetch_add(1, Ordering::SeqCst);
                MeterFilterReply::Neutral
            }));

        let id = MeterId::new("anything", MeterType::Gauge);
        assert_eq!(chain.accept(&id), MeterFilterReply::Accept);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_configure_pass_is_never_short_circuited() {
        let chain = FilterChain::new()
            .with_filter(deny_all())
            .with_filter(max_expected_timer("db", Duration::from_secs(2)))
            .with_filter(min_expected_timer("db", Duration::from_millis(1)));

        let registration = chain.register(
            MeterId::new("db.query", MeterType::Timer),
            DistributionStatisticConfig::none(),
        );
        assert_eq!(registration.reply, MeterFilterReply::Deny);

        let config = registration.config.expect("timers carry a config");
        assert_eq!(config.maximum_expected_value(), Some(2_000_000_000.0));
        assert_eq!(config.minimum_expected_value(), Some(1_000_000.0));
    }

    #[test]
    fn test_configure_sees_previous_override() {
        let chain = FilterChain::new()
            .with_filter(max_expected_timer("db", Duration::from_secs(2)))
            .with_filter(configure_fn(|_: &MeterId, config: DistributionStatisticConfig| {
                let doubled = config.maximum_expected_value().map(|v| v * 2.0);
                match doubled {
                    Some(v) => DistributionStatisticConfig::builder()
                        .maximum_expected_value(v)
                        .build()
                        .merge(&config),
                    None => config,
                }
            }));

        let config = chain.configure(
            &MeterId::new("db.query", MeterType::Timer),
            DistributionStatisticConfig::none(),
        );
        assert_eq!(config.maximum_expected_value(), Some(4_000_000_000.0));
    }

    #[test]
    fn test_filters_added_later_do_not_affect_past_registrations() {
        let mut chain = FilterChain::new();
        let before = chain.register(
            MeterId::new("cache.hits", MeterType::Counter),
            DistributionStatisticConfig::none(),
        );

        chain.push(deny_all());
        assert_eq!(before.reply, MeterFilterReply::Neutral);

        let after = chain.register(
            MeterId::new("cache.hits", MeterType::Counter),
            DistributionStatisticConfig::none(),
        );
        assert_eq!(after.reply, MeterFilterReply::Deny);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_chain_nests_as_a_filter() {
        let inner = FilterChain::new().with_filter(common_tags([("env", "prod")]));
        let outer = FilterChain::new()
            .with_filter(inner)
            .with_filter(common_tags([("region", "eu")]));

        let id = outer.map(MeterId::new("m", MeterType::Counter));
        let keys: Vec<&str> = id.tags().iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["env", "region"]);
    }
}
