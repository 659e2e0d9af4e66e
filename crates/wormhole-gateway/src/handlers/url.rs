use crate::error::Result;
use crate::model::{ResolveResponse, ShortenResponse, UrlRequest, ValidateResponse};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use tracing::info;
use wormhole_core::{Protocol, ShortCode};
use wormhole_shortener::{Requester, ShortenerError};

/// Header carrying the identity rate limits and block lists apply to.
pub const REQUESTER_HEADER: &str = "x-requester-id";

fn requester(headers: &HeaderMap) -> Requester {
    headers
        .get(REQUESTER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(Requester::new)
        .unwrap_or_else(Requester::anonymous)
}

pub async fn shorten_url_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UrlRequest>,
) -> Result<Json<ShortenResponse>> {
    let requester = requester(&headers);
    let shortened = state.shortener().shorten(&request.url, &requester).await?;
    info!(id = shortened.id, code = %shortened.code, %requester, "shortened url");

    Ok(Json(ShortenResponse {
        short_url: state.short_url(&shortened.code),
        short_url_alt: state.short_url(&shortened.alt_code),
        code: shortened.code.into_string(),
        alt_code: shortened.alt_code.into_string(),
    }))
}

pub async fn validate_url_handler(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<ValidateResponse>> {
    state.shortener().validate(&request.url)?;
    Ok(Json(ValidateResponse { valid: true }))
}

pub async fn get_url_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ResolveResponse>> {
    match state.redirector().resolve(&code, Protocol::Http).await? {
        Some(url) => Ok(Json(ResolveResponse { code, url })),
        None if state.shortener().is_deleted(&code).await? => {
            Err(ShortenerError::Deleted(ShortCode::new_unchecked(code)).into())
        }
        None => Err(ShortenerError::NotFound.into()),
    }
}

pub async fn delete_url_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode> {
    state.shortener().delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_url_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode> {
    state.shortener().restore(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
