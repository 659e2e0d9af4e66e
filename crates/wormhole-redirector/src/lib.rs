//! The read side of the Wormhole URL shortener.
//!
//! [`RedirectorService`] turns a short code back into its target URL. Put a
//! [`CachedRepository`] in front of the store to keep hot codes in memory.
//!
//! ```rust
//! use std::sync::Arc;
//! use wormhole_cache::MokaUrlCache;
//! use wormhole_core::{CodecSettings, IdCodec, Protocol, Repository};
//! use wormhole_redirector::{CachedRepository, RedirectorService};
//! use wormhole_storage::InMemoryRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryRepository::new();
//! store.get_or_create("http://example.org/").await?;
//!
//! let codec = Arc::new(IdCodec::new(CodecSettings::default())?);
//! let repository = CachedRepository::new(store, MokaUrlCache::new());
//! let service = RedirectorService::new(Arc::new(repository), codec);
//!
//! let url = service.resolve("3", Protocol::Https).await?;
//! assert_eq!(url.as_deref(), Some("https://example.org/"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod redirector;
pub mod repository;
pub mod service;

pub use error::{RedirectorError, Result};
pub use redirector::Redirector;
pub use repository::CachedRepository;
pub use service::RedirectorService;
