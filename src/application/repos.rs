//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint")]
    Duplicate,
    #[error("resource not found")]
    NotFound,
    #[error("integrity error: {message}")]
    Integrity { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// The filter predicate of a post listing. Ordering and page size are the
/// same for every scope; only the predicate differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(i64),
    FollowedBy(i64),
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<UserRecord>, RepoError>;
    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        created_at: OffsetDateTime,
    ) -> Result<UserRecord, RepoError>;
    /// Deleting a user cascade-deletes their posts, comments, and follow
    /// edges at the schema level.
    async fn delete_user(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait GroupsRepo: Send + Sync {
    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>, RepoError>;
    async fn list_groups(&self) -> Result<Vec<GroupRecord>, RepoError>;
    async fn insert_group(
        &self,
        title: &str,
        slug: &str,
        description: &str,
    ) -> Result<GroupRecord, RepoError>;
    /// Deleting a group clears the reference on its posts; the posts stay.
    async fn delete_group(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts in the scope, ordered by `pub_date` descending with `id`
    /// descending as the tie-breaker.
    async fn list_posts(
        &self,
        scope: PostScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PostRecord>, RepoError>;
    async fn count_posts(&self, scope: PostScope) -> Result<u64, RepoError>;
    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;
    async fn insert_post(
        &self,
        author_id: i64,
        text: &str,
        group_id: Option<i64>,
        image_path: Option<&str>,
        pub_date: OffsetDateTime,
    ) -> Result<i64, RepoError>;
    /// Updates text, group, and image; `pub_date` and author are immutable.
    async fn update_post(
        &self,
        id: i64,
        text: &str,
        group_id: Option<i64>,
        image_path: Option<&str>,
    ) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments of a post, ordered by `created` ascending, then `id`.
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError>;
    async fn insert_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
        created: OffsetDateTime,
    ) -> Result<i64, RepoError>;
}

#[async_trait]
pub trait FollowsRepo: Send + Sync {
    async fn follow_exists(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError>;
    async fn insert_follow(&self, user_id: i64, author_id: i64) -> Result<(), RepoError>;
    /// Returns whether an edge was actually deleted.
    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError>;
}
