//! The HTTP surface: routing, middleware wiring, and handlers.

mod auth;
mod extract;
mod middleware;
mod posts;
mod public;
mod social;

pub use extract::Viewer;

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Response,
    routing::{get, post},
};

use crate::application::auth::AuthService;
use crate::application::content::ContentService;
use crate::application::error::error_response;
use crate::application::feed::{FeedError, FeedService};
use crate::application::social::FollowService;
use crate::cache::{PageCacheState, page_cache_layer};
use crate::infra::db::SqliteRepositories;
use crate::infra::uploads::UploadStorage;
use crate::presentation::views::{ChromeView, render_not_found_response};

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct RouterState {
    pub feed: Arc<FeedService>,
    pub content: Arc<ContentService>,
    pub social: Arc<FollowService>,
    pub auth: AuthService,
    pub uploads: Arc<UploadStorage>,
    pub cache: Option<PageCacheState>,
    pub max_request_bytes: usize,
}

impl RouterState {
    pub fn new(
        db: SqliteRepositories,
        posts_per_page: NonZeroU32,
        uploads: Arc<UploadStorage>,
        cache: Option<PageCacheState>,
        max_request_bytes: usize,
    ) -> Self {
        let repos = Arc::new(db);
        let feed = Arc::new(FeedService::new(
            repos.clone(),
            repos.clone(),
            repos.clone(),
            repos.clone(),
            repos.clone(),
            posts_per_page,
        ));
        let content = Arc::new(ContentService::new(
            repos.clone(),
            repos.clone(),
            repos.clone(),
        ));
        let social = Arc::new(FollowService::new(repos.clone(), repos.clone()));
        let auth = AuthService::new(repos);

        Self {
            feed,
            content,
            social,
            auth,
            uploads,
            cache,
            max_request_bytes,
        }
    }
}

pub fn build_router(state: RouterState) -> Router {
    // Only the home listing is served from the page cache; every other page
    // depends on the viewer or must reflect writes immediately.
    let home = Router::new().route("/", get(public::index));
    let home = match state.cache.clone() {
        Some(cache_state) => home.layer(from_fn_with_state(cache_state, page_cache_layer)),
        None => home,
    };

    let max_request_bytes = state.max_request_bytes;

    home.route("/group/{slug}/", get(public::group_index))
        .route("/profile/{username}/", get(public::profile))
        .route("/posts/{post_id}/", get(public::post_detail))
        .route(
            "/create/",
            get(posts::create_post_form).post(posts::create_post),
        )
        .route(
            "/posts/{post_id}/edit/",
            get(posts::edit_post_form).post(posts::edit_post),
        )
        .route("/posts/{post_id}/comment/", post(posts::add_comment))
        .route("/follow/", get(social::follow_index))
        .route("/profile/{username}/follow/", get(social::profile_follow))
        .route(
            "/profile/{username}/unfollow/",
            get(social::profile_unfollow),
        )
        .route("/auth/signup/", get(auth::signup_form).post(auth::signup))
        .route("/auth/login/", get(auth::login_form).post(auth::login))
        .route("/auth/logout/", get(auth::logout).post(auth::logout))
        .route("/media/{*path}", get(public::serve_upload))
        .fallback(public::fallback)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(axum::middleware::from_fn(log_responses))
        .layer(axum::middleware::from_fn(set_request_context))
}

/// Map a feed error to a page response: unknown resources get the not-found
/// page, everything else an opaque 500.
fn feed_error_to_response(source: &'static str, err: FeedError, chrome: ChromeView) -> Response {
    match err {
        FeedError::UnknownGroup | FeedError::UnknownAuthor | FeedError::UnknownPost => {
            render_not_found_response(chrome)
        }
        FeedError::Repo(err) => error_response(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            &err,
        ),
    }
}
