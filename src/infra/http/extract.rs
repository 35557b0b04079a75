//! The viewer extractor: resolves the session cookie to a signed-in user.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use crate::application::auth::SessionUser;
use crate::presentation::views::ChromeView;

use super::RouterState;

pub const SESSION_COOKIE: &str = "session";

/// Who is looking at the page. Extracted on every request; anonymous viewers
/// are represented rather than rejected, so public pages stay public.
pub struct Viewer {
    pub user: Option<SessionUser>,
    path_and_query: String,
}

impl Viewer {
    pub fn chrome(&self) -> ChromeView {
        ChromeView::for_viewer(self.user.as_ref())
    }

    /// The signed-in user, or a redirect to the login page that returns to
    /// the current location afterwards.
    pub fn require(&self) -> Result<&SessionUser, Response> {
        match &self.user {
            Some(user) => Ok(user),
            None => Err(login_redirect(&self.path_and_query)),
        }
    }
}

impl FromRequestParts<RouterState> for Viewer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &RouterState,
    ) -> Result<Self, Self::Rejection> {
        let user = session_token(parts).and_then(|token| state.auth.session(&token));
        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());
        Ok(Self {
            user,
            path_and_query,
        })
    }
}

pub fn session_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

pub fn login_redirect(next: &str) -> Response {
    Redirect::to(&format!("/auth/login/?next={}", encode_next(next))).into_response()
}

/// Percent-encode a path for use as the `next` query parameter.
fn encode_next(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(byte as char);
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

/// Only same-site paths are allowed as post-login destinations.
pub fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_parameter_is_percent_encoded() {
        assert_eq!(encode_next("/create/"), "/create/");
        assert_eq!(encode_next("/follow/?page=2"), "/follow/%3Fpage%3D2");
    }

    #[test]
    fn offsite_next_destinations_are_rejected() {
        assert_eq!(safe_next("/posts/3/"), "/posts/3/");
        assert_eq!(safe_next("https://elsewhere.example"), "/");
        assert_eq!(safe_next("//elsewhere.example"), "/");
        assert_eq!(safe_next(""), "/");
    }
}
