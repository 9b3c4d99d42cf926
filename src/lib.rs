//! meter-filter - Meter filter chains for metrics registries
//!
//! Before a registry materializes a new meter it runs the candidate id through
//! an ordered chain of filters that may rename or retag it, deny it, or adjust
//! the histogram configuration of timers and distribution summaries. This
//! crate provides the filter contract, the stock filters (including
//! cardinality limiters), and the chain evaluator.
//!
//! ```
//! use meter_filter::{
//!     DistributionStatisticConfig, FilterChain, MeterFilterReply, MeterId, MeterType, filter,
//! };
//!
//! let chain = FilterChain::new()
//!     .with_filter(filter::common_tags([("env", "prod")]))
//!     .with_filter(filter::deny_name_starts_with("jvm"));
//!
//! let registration = chain.register(
//!     MeterId::new("jvm.gc.pause", MeterType::Timer),
//!     DistributionStatisticConfig::none(),
//! );
//! assert_eq!(registration.reply, MeterFilterReply::Deny);
//! assert_eq!(registration.id.tag("env"), Some("prod"));
//! ```

pub mod chain;
pub mod config;
pub mod distribution;
pub mod error;
pub mod filter;
pub mod meter;
pub mod telemetry;

pub use chain::{FilterChain, Registration};
pub use distribution::DistributionStatisticConfig;
pub use error::{FilterError, FilterResult};
pub use filter::{MeterFilter, MeterFilterReply};
pub use meter::{MeterId, MeterType, Tag};
