use crate::error::{AppError, Result};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, LOCATION};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::trace;
use wormhole_core::Protocol;

pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";
pub const CACHE_CONTROL_FOUND: &str = "public, max-age=2592000";
pub const CACHE_CONTROL_NOT_FOUND: &str = "public, max-age=900";

/// Scheme the client used, as reported by the proxy in front of us.
fn request_protocol(headers: &HeaderMap) -> Protocol {
    headers
        .get(FORWARDED_PROTO_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Protocol>().ok())
        .filter(|protocol| *protocol != Protocol::Relative)
        .unwrap_or(Protocol::Http)
}

/// `GET /{code}`: permanent redirect to the target.
///
/// Both outcomes are cacheable by shared caches; misses for a shorter time.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Response> {
    let protocol = request_protocol(&headers);

    let Some(url) = state.redirector().resolve(&code, protocol).await? else {
        trace!(code, "no redirect target");
        return Ok((
            StatusCode::NOT_FOUND,
            [
                (CACHE_CONTROL, CACHE_CONTROL_NOT_FOUND),
                (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            ],
            "short URL not found",
        )
            .into_response());
    };

    let location = HeaderValue::try_from(url).map_err(|_| AppError::InvalidTarget)?;
    Ok((
        StatusCode::MOVED_PERMANENTLY,
        [
            (LOCATION, location),
            (CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_FOUND)),
            (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")),
        ],
    )
        .into_response())
}
