//! Core types and traits for the Wormhole URL shortener.
//!
//! This crate provides the short-code codec and the storage, cache and
//! purge contracts shared by the shortener and the redirector.

pub mod cache;
pub mod codec;
pub mod error;
pub mod hash;
pub mod purge;
pub mod repository;
pub mod shortcode;
pub mod urlparts;

pub use cache::UrlCache;
pub use codec::{expand_confusable_variants, CodecSettings, Encoding, IdCodec};
pub use error::{CacheError, ConfigError, DecodeError, StorageError};
pub use hash::UrlHash;
pub use purge::Purger;
pub use repository::{Acquired, InsertOutcome, ReadRepository, Repository, ShortcodeEntry};
pub use shortcode::{ShortCode, ShortUrlTemplate};
pub use urlparts::{convert_to_protocol, Protocol, UrlParts};
