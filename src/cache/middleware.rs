//! Response cache middleware for the cached listing routes.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::store::{CachedPage, PageStore};

const MAX_CACHED_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct PageCacheState {
    pub store: Arc<PageStore>,
}

/// Serve 200 GET responses from the page store while their TTL lasts.
pub async fn page_cache_layer(
    State(cache): State<PageCacheState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache_key(&request);
    if let Some(page) = cache.store.get(&key) {
        debug!(target = "brusio::cache", outcome = "hit", key = %key, "serving cached page");
        return build_response(page);
    }
    debug!(target = "brusio::cache", outcome = "miss", key = %key, "rendering page");

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_CACHED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let content_type = parts.headers.get(CONTENT_TYPE).cloned();
    cache.store.put(key, bytes.clone(), content_type);

    Response::from_parts(parts, Body::from(bytes))
}

fn cache_key(request: &Request<Body>) -> String {
    match request.uri().query() {
        Some(query) => format!("{}?{query}", request.uri().path()),
        None => request.uri().path().to_string(),
    }
}

fn build_response(page: CachedPage) -> Response {
    let mut response = Response::new(Body::from(page.body));
    if let Some(content_type) = page.content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}
