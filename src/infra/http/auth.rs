//! Signup, login, and logout. Sessions travel in an HttpOnly cookie.

use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::application::auth::AuthError;
use crate::application::error::error_response;
use crate::domain::forms::SignupDraft;
use crate::presentation::views::{
    FieldErrorView, LoginTemplate, SignupTemplate, field_error_views, render_template_response,
};

use super::extract::{SESSION_COOKIE, safe_next, session_token};
use super::{RouterState, Viewer};

fn redirect_with_session(location: &str, token: &str) -> Response {
    let mut response = Redirect::to(location).into_response();
    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

fn redirect_clearing_session(location: &str) -> Response {
    let mut response = Redirect::to(location).into_response();
    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

pub async fn signup_form(viewer: Viewer) -> Response {
    if viewer.user.is_some() {
        return Redirect::to("/").into_response();
    }
    render_template_response(
        SignupTemplate {
            chrome: viewer.chrome(),
            username: String::new(),
            errors: Vec::new(),
        },
        StatusCode::OK,
    )
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    username: String,
    password: String,
}

pub async fn signup(
    State(state): State<RouterState>,
    viewer: Viewer,
    axum::Form(form): axum::Form<SignupForm>,
) -> Response {
    let submitted_username = form.username.clone();
    let draft = match SignupDraft::validate(form.username, form.password) {
        Ok(draft) => draft,
        Err(errors) => {
            return render_template_response(
                SignupTemplate {
                    chrome: viewer.chrome(),
                    username: submitted_username,
                    errors: field_error_views(errors),
                },
                StatusCode::OK,
            );
        }
    };

    match state.auth.register(draft).await {
        Ok((_, token)) => redirect_with_session("/", &token),
        Err(AuthError::UsernameTaken) => render_template_response(
            SignupTemplate {
                chrome: viewer.chrome(),
                username: submitted_username,
                errors: vec![FieldErrorView {
                    field: "username",
                    message: "This username is already taken.",
                }],
            },
            StatusCode::OK,
        ),
        Err(err) => error_response(
            "infra::http::auth::signup",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            &err,
        ),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginQuery {
    next: Option<String>,
}

pub async fn login_form(viewer: Viewer, Query(query): Query<LoginQuery>) -> Response {
    render_template_response(
        LoginTemplate {
            chrome: viewer.chrome(),
            next: query.next.unwrap_or_default(),
            error: None,
        },
        StatusCode::OK,
    )
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: String,
}

pub async fn login(
    State(state): State<RouterState>,
    viewer: Viewer,
    axum::Form(form): axum::Form<LoginForm>,
) -> Response {
    match state.auth.login(&form.username, &form.password).await {
        Ok(token) => redirect_with_session(safe_next(&form.next), &token),
        Err(AuthError::InvalidCredentials) => render_template_response(
            LoginTemplate {
                chrome: viewer.chrome(),
                next: form.next,
                error: Some("Invalid username or password.".to_string()),
            },
            StatusCode::OK,
        ),
        Err(err) => error_response(
            "infra::http::auth::login",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            &err,
        ),
    }
}

pub async fn logout(
    State(state): State<RouterState>,
    request: axum::http::Request<axum::body::Body>,
) -> Response {
    let (parts, _) = request.into_parts();
    if let Some(token) = session_token(&parts) {
        state.auth.logout(&token);
    }
    redirect_clearing_session("/")
}
