//! HTTP front end for Wormhole.
//!
//! Serves the JSON API for creating and managing short URLs, and the
//! `/{code}` redirect itself.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
