mod url;

pub use url::{
    ErrorResponse, ResolveResponse, ShortenResponse, UrlRequest, ValidateResponse,
};

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
