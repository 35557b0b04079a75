//! The read-only pages: listings, profiles, post detail, and stored media.

use std::io::ErrorKind;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{
        StatusCode,
        header::{CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::error;

use crate::application::error::ErrorReport;
use crate::application::pagination::requested_page;
use crate::infra::uploads::UploadStorageError;
use crate::presentation::views::{
    GroupTemplate, IndexTemplate, PostDetailTemplate, ProfileTemplate, render_not_found_response,
    render_template_response, split_page,
};

use super::{RouterState, Viewer, feed_error_to_response};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    pub(super) fn number(&self) -> u32 {
        requested_page(self.page.as_deref())
    }
}

pub async fn index(
    State(state): State<RouterState>,
    viewer: Viewer,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.home_page(query.number()).await {
        Ok(page) => {
            let (posts, pager) = split_page(page, "/");
            render_template_response(
                IndexTemplate {
                    chrome: viewer.chrome(),
                    posts,
                    pager,
                },
                StatusCode::OK,
            )
        }
        Err(err) => feed_error_to_response("infra::http::public::index", err, viewer.chrome()),
    }
}

pub async fn group_index(
    State(state): State<RouterState>,
    viewer: Viewer,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    match state.feed.group_page(&slug, query.number()).await {
        Ok((group, page)) => {
            let (posts, pager) = split_page(page, format!("/group/{slug}/"));
            render_template_response(
                GroupTemplate {
                    chrome: viewer.chrome(),
                    group: group.into(),
                    posts,
                    pager,
                },
                StatusCode::OK,
            )
        }
        Err(err) => {
            feed_error_to_response("infra::http::public::group_index", err, viewer.chrome())
        }
    }
}

pub async fn profile(
    State(state): State<RouterState>,
    viewer: Viewer,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let viewer_id = viewer.user.as_ref().map(|user| user.id);
    match state
        .feed
        .author_page(&username, query.number(), viewer_id)
        .await
    {
        Ok(feed) => {
            let is_self = viewer_id == Some(feed.author.id);
            let (posts, pager) = split_page(feed.page, format!("/profile/{username}/"));
            render_template_response(
                ProfileTemplate {
                    chrome: viewer.chrome(),
                    author: feed.author.username,
                    posts_count: feed.posts_count,
                    following: feed.following,
                    show_follow_controls: viewer_id.is_some() && !is_self,
                    posts,
                    pager,
                },
                StatusCode::OK,
            )
        }
        Err(err) => feed_error_to_response("infra::http::public::profile", err, viewer.chrome()),
    }
}

pub async fn post_detail(
    State(state): State<RouterState>,
    viewer: Viewer,
    Path(post_id): Path<String>,
) -> Response {
    let Ok(post_id) = post_id.parse::<i64>() else {
        return render_not_found_response(viewer.chrome());
    };

    match state.feed.post_detail(post_id).await {
        Ok(detail) => {
            let viewer_id = viewer.user.as_ref().map(|user| user.id);
            let can_edit = viewer_id == Some(detail.post.author_id);
            render_template_response(
                PostDetailTemplate {
                    chrome: viewer.chrome(),
                    post: detail.post.into(),
                    posts_count: detail.author_posts_count,
                    comments: detail.comments.into_iter().map(Into::into).collect(),
                    can_comment: viewer_id.is_some(),
                    can_edit,
                },
                StatusCode::OK,
            )
        }
        Err(err) => {
            feed_error_to_response("infra::http::public::post_detail", err, viewer.chrome())
        }
    }
}

pub async fn serve_upload(
    State(state): State<RouterState>,
    viewer: Viewer,
    Path(path): Path<String>,
) -> Response {
    const SOURCE: &str = "infra::http::public::serve_upload";

    match state.uploads.read(&path).await {
        Ok(bytes) => build_upload_response(&path, bytes),
        Err(UploadStorageError::InvalidPath) => render_not_found_response(viewer.chrome()),
        Err(UploadStorageError::Io(err)) if err.kind() == ErrorKind::NotFound => {
            render_not_found_response(viewer.chrome())
        }
        Err(err) => {
            error!(
                target = SOURCE,
                path = %path,
                error = %err,
                "failed to read stored upload"
            );
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            let mut response = (status, "Failed to read uploaded file").into_response();
            ErrorReport::from_error(SOURCE, status, &err).attach(&mut response);
            response
        }
    }
}

fn build_upload_response(path: &str, bytes: Bytes) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let length = bytes.len();

    let mut response = Response::new(Body::from(bytes));
    if let Ok(content_type) = mime.as_ref().parse() {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    if let Ok(content_length) = length.to_string().parse() {
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, content_length);
    }
    response
}

pub async fn fallback(viewer: Viewer) -> Response {
    render_not_found_response(viewer.chrome())
}
