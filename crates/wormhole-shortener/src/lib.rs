//! The write side of the Wormhole URL shortener.
//!
//! [`ShortenerService`] validates and normalizes URLs, maps them to row ids
//! and renders those ids as short codes. [`Exporter`] dumps every active
//! mapping for offline use.

pub mod config;
pub mod error;
pub mod export;
pub mod gate;
pub mod normalize;
pub mod service;
pub mod shortener;
pub mod validate;

pub use config::{RateLimitSettings, ShortenerConfig};
pub use error::{ConfigLoadError, ExportError, Result, ShortenerError, ValidationError};
pub use export::{ExportLine, Exporter};
pub use gate::{FixedWindowGate, Gatekeeper, OpenGate, Requester};
pub use normalize::Normalizer;
pub use service::ShortenerService;
pub use shortener::{Shortened, Shortener};
pub use validate::ValidationPolicy;
