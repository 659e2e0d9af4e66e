//! Resolve caching and purge dispatch for Wormhole.
//!
//! [`MokaUrlCache`] keeps resolved URLs in process and doubles as a purge
//! target. [`PurgeNotifier`] turns an id into every short code spelling that
//! reaches it and hands them to a [`Purger`](wormhole_core::Purger).

pub mod moka;
pub mod notifier;
pub mod purger;

pub use moka::{CacheConfig, MokaUrlCache};
pub use notifier::PurgeNotifier;
pub use purger::{FanoutPurger, NoopPurger};
