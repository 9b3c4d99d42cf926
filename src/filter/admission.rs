//! Admission filters
//!
//! Predicate-driven `accept` implementations. None of them ever rewrites an id
//! or touches histogram config.

use super::{MeterFilter, MeterFilterReply};
use crate::meter::MeterId;

/// Replies `on_match` when the predicate holds, `otherwise` when it doesn't
pub struct PredicateFilter<P> {
    predicate: P,
    on_match: MeterFilterReply,
    otherwise: MeterFilterReply,
}

impl<P> MeterFilter for PredicateFilter<P>
where
    P: Fn(&MeterId) -> bool + Send + Sync,
{
    fn accept(&self, id: &MeterId) -> MeterFilterReply {
        if (self.predicate)(id) {
            self.on_match
        } else {
            self.otherwise
        }
    }
}

/// Replies `on_match` for meters whose name starts with `prefix`, `otherwise` for the rest
pub struct NamePrefix {
    prefix: String,
    on_match: MeterFilterReply,
    otherwise: MeterFilterReply,
}

impl NamePrefix {
    fn new(prefix: String, on_match: MeterFilterReply, otherwise: MeterFilterReply) -> Self {
        Self {
            prefix,
            on_match,
            otherwise,
        }
    }
}

impl MeterFilter for NamePrefix {
    fn accept(&self, id: &MeterId) -> MeterFilterReply {
        if id.name().starts_with(&self.prefix) {
            self.on_match
        } else {
            self.otherwise
        }
    }
}

/// `Accept` meters matching `predicate`, `Neutral` otherwise
///
/// Placed early in a chain this overrides any later deny for matching meters.
pub fn accept<P>(predicate: P) -> PredicateFilter<P>
where
    P: Fn(&MeterId) -> bool + Send + Sync,
{
    PredicateFilter {
        predicate,
        on_match: MeterFilterReply::Accept,
        otherwise: MeterFilterReply::Neutral,
    }
}

/// `Deny` meters matching `predicate`, `Neutral` otherwise
pub fn deny<P>(predicate: P) -> PredicateFilter<P>
where
    P: Fn(&MeterId) -> bool + Send + Sync,
{
    PredicateFilter {
        predicate,
        on_match: MeterFilterReply::Deny,
        otherwise: MeterFilterReply::Neutral,
    }
}

/// `Deny` every meter not matching `predicate`
///
/// Matching meters get `Neutral`, never `Accept`, so later filters still apply.
pub fn deny_unless<P>(predicate: P) -> PredicateFilter<P>
where
    P: Fn(&MeterId) -> bool + Send + Sync,
{
    PredicateFilter {
        predicate,
        on_match: MeterFilterReply::Neutral,
        otherwise: MeterFilterReply::Deny,
    }
}

/// Accept everything; typically used as an `on_max_reached` action
pub fn accept_all() -> impl MeterFilter {
    accept(|_: &MeterId| true)
}

/// Deny everything; typically used as an `on_max_reached` action
pub fn deny_all() -> impl MeterFilter {
    deny(|_: &MeterId| true)
}

/// Deny meters whose name starts with `prefix`
pub fn deny_name_starts_with(prefix: impl Into<String>) -> NamePrefix {
    NamePrefix::new(
        prefix.into(),
        MeterFilterReply::Deny,
        MeterFilterReply::Neutral,
    )
}

/// Accept meters whose name starts with `prefix`
pub fn accept_name_starts_with(prefix: impl Into<String>) -> NamePrefix {
    NamePrefix::new(
        prefix.into(),
        MeterFilterReply::Accept,
        MeterFilterReply::Neutral,
    )
}

/// Deny every meter whose name does not start with `prefix`
pub fn deny_unless_name_starts_with(prefix: impl Into<String>) -> NamePrefix {
    NamePrefix::new(
        prefix.into(),
        MeterFilterReply::Neutral,
        MeterFilterReply::Deny,
    )
}
