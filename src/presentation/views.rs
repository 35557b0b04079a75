//! Typed view models and their askama templates.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use time::{
    OffsetDateTime,
    format_description::{FormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::application::auth::SessionUser;
use crate::application::error::ErrorReport;
use crate::application::pagination::Page;
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord};
use crate::domain::forms::{FieldError, FieldErrors};

const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year] [hour]:[minute]");

fn human_date(value: OffsetDateTime) -> String {
    value.format(HUMAN_DATE_FORMAT).unwrap_or_default()
}

fn iso_date(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_default()
}

/// Layout-level state shared by every page: who is signed in, if anyone.
#[derive(Clone, Default)]
pub struct ChromeView {
    pub viewer: Option<ViewerView>,
}

impl ChromeView {
    pub fn for_viewer(viewer: Option<&SessionUser>) -> Self {
        Self {
            viewer: viewer.map(|user| ViewerView {
                username: user.username.clone(),
            }),
        }
    }
}

#[derive(Clone)]
pub struct ViewerView {
    pub username: String,
}

#[derive(Clone)]
pub struct GroupBadge {
    pub slug: String,
    pub title: String,
}

#[derive(Clone)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub iso_date: String,
    pub published: String,
    pub group: Option<GroupBadge>,
    pub image: Option<String>,
}

impl From<PostRecord> for PostCard {
    fn from(record: PostRecord) -> Self {
        Self {
            id: record.id,
            text: record.text,
            author: record.author_username,
            iso_date: iso_date(record.pub_date),
            published: human_date(record.pub_date),
            group: record.group.map(|group| GroupBadge {
                slug: group.slug,
                title: group.title,
            }),
            image: record.image_path,
        }
    }
}

#[derive(Clone)]
pub struct CommentView {
    pub author: String,
    pub created: String,
    pub text: String,
}

impl From<CommentRecord> for CommentView {
    fn from(record: CommentRecord) -> Self {
        Self {
            author: record.author_username,
            created: human_date(record.created),
            text: record.text,
        }
    }
}

#[derive(Clone)]
pub struct PagerView {
    pub number: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous: u32,
    pub next: u32,
    pub base_path: String,
}

/// Split a post page into the cards to render and the pager beneath them.
pub fn split_page(page: Page<PostRecord>, base_path: impl Into<String>) -> (Vec<PostCard>, PagerView) {
    let pager = PagerView {
        number: page.number,
        total_pages: page.total_pages,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
        previous: page.previous_number(),
        next: page.next_number(),
        base_path: base_path.into(),
    };
    let cards = page.items.into_iter().map(PostCard::from).collect();
    (cards, pager)
}

#[derive(Clone)]
pub struct GroupView {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl From<GroupRecord> for GroupView {
    fn from(record: GroupRecord) -> Self {
        Self {
            title: record.title,
            slug: record.slug,
            description: record.description,
        }
    }
}

#[derive(Clone)]
pub struct GroupOption {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

pub fn group_options(groups: Vec<GroupRecord>, selected: Option<i64>) -> Vec<GroupOption> {
    groups
        .into_iter()
        .map(|group| GroupOption {
            selected: selected == Some(group.id),
            id: group.id,
            title: group.title,
        })
        .collect()
}

#[derive(Clone)]
pub struct FieldErrorView {
    pub field: &'static str,
    pub message: &'static str,
}

pub fn field_error_views(errors: FieldErrors) -> Vec<FieldErrorView> {
    errors
        .into_vec()
        .into_iter()
        .map(|FieldError { field, message }| FieldErrorView { field, message })
        .collect()
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub chrome: ChromeView,
    pub posts: Vec<PostCard>,
    pub pager: PagerView,
}

#[derive(Template)]
#[template(path = "group_list.html")]
pub struct GroupTemplate {
    pub chrome: ChromeView,
    pub group: GroupView,
    pub posts: Vec<PostCard>,
    pub pager: PagerView,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub chrome: ChromeView,
    pub author: String,
    pub posts_count: u64,
    pub following: bool,
    pub show_follow_controls: bool,
    pub posts: Vec<PostCard>,
    pub pager: PagerView,
}

#[derive(Template)]
#[template(path = "post_detail.html")]
pub struct PostDetailTemplate {
    pub chrome: ChromeView,
    pub post: PostCard,
    pub posts_count: u64,
    pub comments: Vec<CommentView>,
    pub can_comment: bool,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "create_post.html")]
pub struct PostFormTemplate {
    pub chrome: ChromeView,
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupOption>,
    pub errors: Vec<FieldErrorView>,
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate {
    pub chrome: ChromeView,
    pub posts: Vec<PostCard>,
    pub pager: PagerView,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub chrome: ChromeView,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub chrome: ChromeView,
    pub username: String,
    pub errors: Vec<FieldErrorView>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub chrome: ChromeView,
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            let mut response = (status, "Template rendering failed").into_response();
            ErrorReport::from_error("presentation::views::render_template_response", status, &err)
                .attach(&mut response);
            response
        }
    }
}

/// The dedicated not-found page, used for unknown resources and the router
/// fallback alike.
pub fn render_not_found_response(chrome: ChromeView) -> Response {
    let mut response =
        render_template_response(NotFoundTemplate { chrome }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}
