//! Authoring handlers: the post form (create and edit) and comments.
//!
//! The post form is multipart because of the optional image. Validation runs
//! before the image is written to storage, so a rejected form never leaves a
//! stray file behind.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;

use crate::application::content::{ContentError, EditAccess, EditOutcome};
use crate::application::error::error_response;
use crate::domain::forms::{CommentDraft, FieldErrors, PostDraft};
use crate::presentation::views::{
    ChromeView, PostFormTemplate, field_error_views, group_options, render_not_found_response,
    render_template_response,
};

use super::{RouterState, Viewer};

/// The raw fields of a submitted post form, before validation.
#[derive(Default)]
struct PostSubmission {
    text: String,
    group: String,
    image: Option<(String, Bytes)>,
}

impl PostSubmission {
    fn group_id(&self, errors: &mut FieldErrors) -> Option<i64> {
        let raw = self.group.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push("group", "Choose a valid group.");
                None
            }
        }
    }
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostSubmission, Response> {
    const SOURCE: &str = "infra::http::posts::read_post_form";

    let mut submission = PostSubmission::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err(error_response(
                    SOURCE,
                    StatusCode::BAD_REQUEST,
                    "Malformed form submission",
                    &err,
                ));
            }
        };

        match field.name() {
            Some("text") => match field.text().await {
                Ok(value) => submission.text = value,
                Err(err) => {
                    return Err(error_response(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "Malformed form submission",
                        &err,
                    ));
                }
            },
            Some("group") => match field.text().await {
                Ok(value) => submission.group = value,
                Err(err) => {
                    return Err(error_response(
                        SOURCE,
                        StatusCode::BAD_REQUEST,
                        "Malformed form submission",
                        &err,
                    ));
                }
            },
            Some("image") => {
                let file_name = field.file_name().map(str::to_owned);
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        return Err(error_response(
                            SOURCE,
                            StatusCode::BAD_REQUEST,
                            "Malformed form submission",
                            &err,
                        ));
                    }
                };
                // A file input submitted empty still produces a field.
                if let Some(name) = file_name
                    && !name.is_empty()
                    && !bytes.is_empty()
                {
                    submission.image = Some((name, bytes));
                }
            }
            _ => {}
        }
    }
    Ok(submission)
}

async fn render_form(
    state: &RouterState,
    chrome: ChromeView,
    is_edit: bool,
    action: String,
    text: String,
    selected_group: Option<i64>,
    errors: FieldErrors,
) -> Response {
    let groups = match state.content.group_choices().await {
        Ok(groups) => groups,
        Err(err) => {
            return error_response(
                "infra::http::posts::render_form",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                &err,
            );
        }
    };

    render_template_response(
        PostFormTemplate {
            chrome,
            is_edit,
            action,
            text,
            groups: group_options(groups, selected_group),
            errors: field_error_views(errors),
        },
        StatusCode::OK,
    )
}

pub async fn create_post_form(State(state): State<RouterState>, viewer: Viewer) -> Response {
    if let Err(redirect) = viewer.require() {
        return redirect;
    }
    render_form(
        &state,
        viewer.chrome(),
        false,
        "/create/".to_string(),
        String::new(),
        None,
        FieldErrors::default(),
    )
    .await
}

pub async fn create_post(
    State(state): State<RouterState>,
    viewer: Viewer,
    multipart: Multipart,
) -> Response {
    let user = match viewer.require() {
        Ok(user) => user.clone(),
        Err(redirect) => return redirect,
    };

    let submission = match read_post_form(multipart).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    let mut errors = FieldErrors::default();
    let group_id = submission.group_id(&mut errors);
    let draft = match PostDraft::validate(submission.text.clone(), group_id, None) {
        Ok(draft) if errors.is_empty() => draft,
        other => {
            if let Err(draft_errors) = other {
                for error in draft_errors.into_vec() {
                    errors.push(error.field, error.message);
                }
            }
            return render_form(
                &state,
                viewer.chrome(),
                false,
                "/create/".to_string(),
                submission.text.clone(),
                group_id,
                errors,
            )
            .await;
        }
    };

    let draft = match store_image(&state, &submission, draft).await {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match state.content.create_post(user.id, draft).await {
        Ok(_) => Redirect::to(&format!("/profile/{}/", user.username)).into_response(),
        Err(err) => error_response(
            "infra::http::posts::create_post",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            &err,
        ),
    }
}

pub async fn edit_post_form(
    State(state): State<RouterState>,
    viewer: Viewer,
    Path(post_id): Path<String>,
) -> Response {
    let user = match viewer.require() {
        Ok(user) => user.clone(),
        Err(redirect) => return redirect,
    };
    let Ok(post_id) = post_id.parse::<i64>() else {
        return render_not_found_response(viewer.chrome());
    };

    match state.content.editable_post(user.id, post_id).await {
        Ok(EditAccess::Owned(post)) => {
            let selected = post.group.as_ref().map(|group| group.id);
            render_form(
                &state,
                viewer.chrome(),
                true,
                format!("/posts/{post_id}/edit/"),
                post.text,
                selected,
                FieldErrors::default(),
            )
            .await
        }
        Ok(EditAccess::NotOwner) => {
            Redirect::to(&format!("/posts/{post_id}/")).into_response()
        }
        Err(ContentError::UnknownPost) => render_not_found_response(viewer.chrome()),
        Err(err) => error_response(
            "infra::http::posts::edit_post_form",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            &err,
        ),
    }
}

pub async fn edit_post(
    State(state): State<RouterState>,
    viewer: Viewer,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Response {
    let user = match viewer.require() {
        Ok(user) => user.clone(),
        Err(redirect) => return redirect,
    };
    let Ok(post_id) = post_id.parse::<i64>() else {
        return render_not_found_response(viewer.chrome());
    };

    let submission = match read_post_form(multipart).await {
        Ok(submission) => submission,
        Err(response) => return response,
    };

    let mut errors = FieldErrors::default();
    let group_id = submission.group_id(&mut errors);
    let draft = match PostDraft::validate(submission.text.clone(), group_id, None) {
        Ok(draft) if errors.is_empty() => draft,
        other => {
            if let Err(draft_errors) = other {
                for error in draft_errors.into_vec() {
                    errors.push(error.field, error.message);
                }
            }
            return render_form(
                &state,
                viewer.chrome(),
                true,
                format!("/posts/{post_id}/edit/"),
                submission.text.clone(),
                group_id,
                errors,
            )
            .await;
        }
    };

    // Ownership is settled before the image touches storage; a rejected
    // submission must not leave a stray file behind.
    match state.content.editable_post(user.id, post_id).await {
        Ok(EditAccess::Owned(_)) => {}
        Ok(EditAccess::NotOwner) => {
            return Redirect::to(&format!("/posts/{post_id}/")).into_response();
        }
        Err(ContentError::UnknownPost) => return render_not_found_response(viewer.chrome()),
        Err(err) => {
            return error_response(
                "infra::http::posts::edit_post",
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                &err,
            );
        }
    }

    let draft = match store_image(&state, &submission, draft).await {
        Ok(draft) => draft,
        Err(response) => return response,
    };

    match state.content.edit_post(user.id, post_id, draft).await {
        Ok(EditOutcome::Saved) | Ok(EditOutcome::NotOwner) => {
            Redirect::to(&format!("/posts/{post_id}/")).into_response()
        }
        Err(ContentError::UnknownPost) => render_not_found_response(viewer.chrome()),
        Err(err) => error_response(
            "infra::http::posts::edit_post",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            &err,
        ),
    }
}

async fn store_image(
    state: &RouterState,
    submission: &PostSubmission,
    draft: PostDraft,
) -> Result<PostDraft, Response> {
    let image_path = match &submission.image {
        Some((name, bytes)) => match state.uploads.store(name, bytes.clone()).await {
            Ok(path) => Some(path),
            Err(err) => {
                return Err(error_response(
                    "infra::http::posts::store_image",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store uploaded image",
                    &err,
                ));
            }
        },
        None => None,
    };
    Ok(PostDraft {
        image_path,
        ..draft
    })
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    text: String,
}

pub async fn add_comment(
    State(state): State<RouterState>,
    viewer: Viewer,
    Path(post_id): Path<String>,
    axum::Form(form): axum::Form<CommentForm>,
) -> Response {
    let user = match viewer.require() {
        Ok(user) => user.clone(),
        Err(redirect) => return redirect,
    };
    let Ok(post_id) = post_id.parse::<i64>() else {
        return render_not_found_response(viewer.chrome());
    };

    let draft = match CommentDraft::validate(form.text) {
        Ok(draft) => draft,
        Err(_) => {
            // An empty comment writes nothing and lands back on the post.
            warn!(
                target = "brusio::http::posts",
                post_id, "empty comment ignored"
            );
            return Redirect::to(&format!("/posts/{post_id}/")).into_response();
        }
    };

    match state.content.add_comment(user.id, post_id, draft).await {
        Ok(_) => Redirect::to(&format!("/posts/{post_id}/")).into_response(),
        Err(ContentError::UnknownPost) => render_not_found_response(viewer.chrome()),
        Err(err) => error_response(
            "infra::http::posts::add_comment",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Something went wrong",
            &err,
        ),
    }
}
