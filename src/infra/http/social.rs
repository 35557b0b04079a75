//! The follow graph over HTTP: the followed-authors feed and the
//! follow/unfollow actions.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::application::error::error_response;
use crate::application::social::SocialError;
use crate::presentation::views::{
    FollowTemplate, render_not_found_response, render_template_response, split_page,
};

use super::public::PageQuery;
use super::{RouterState, Viewer, feed_error_to_response};

pub async fn follow_index(
    State(state): State<RouterState>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Response {
    let user = match viewer.require() {
        Ok(user) => user.clone(),
        Err(redirect) => return redirect,
    };

    match state.feed.followed_page(user.id, query.number()).await {
        Ok(page) => {
            let (posts, pager) = split_page(page, "/follow/");
            render_template_response(
                FollowTemplate {
                    chrome: viewer.chrome(),
                    posts,
                    pager,
                },
                StatusCode::OK,
            )
        }
        Err(err) => {
            feed_error_to_response("infra::http::social::follow_index", err, viewer.chrome())
        }
    }
}

pub async fn profile_follow(
    State(state): State<RouterState>,
    viewer: Viewer,
    Path(username): Path<String>,
) -> Response {
    let user = match viewer.require() {
        Ok(user) => user.clone(),
        Err(redirect) => return redirect,
    };

    match state.social.follow(user.id, &username).await {
        Ok(()) => Redirect::to(&format!("/profile/{username}/")).into_response(),
        Err(SocialError::UnknownAuthor) => render_not_found_response(viewer.chrome()),
        Err(err) => error_response(
            "infra::http::social::profile_follow",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            &err,
        ),
    }
}

pub async fn profile_unfollow(
    State(state): State<RouterState>,
    viewer: Viewer,
    Path(username): Path<String>,
) -> Response {
    let user = match viewer.require() {
        Ok(user) => user.clone(),
        Err(redirect) => return redirect,
    };

    match state.social.unfollow(user.id, &username).await {
        Ok(()) => Redirect::to(&format!("/profile/{username}/")).into_response(),
        Err(SocialError::UnknownAuthor) | Err(SocialError::NotFollowing) => {
            render_not_found_response(viewer.chrome())
        }
        Err(err) => error_response(
            "infra::http::social::profile_unfollow",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            &err,
        ),
    }
}
