//! Persistent records of the content store.

use time::OffsetDateTime;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// The group a post belongs to, as carried on the post itself.
///
/// A post references a group, it never owns it. The reference is cleared
/// when the group is deleted.
#[derive(Debug, Clone)]
pub struct GroupRef {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct PostRecord {
    pub id: i64,
    pub text: String,
    /// Creation timestamp; immutable after insert.
    pub pub_date: OffsetDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub group: Option<GroupRef>,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub created: OffsetDateTime,
}
