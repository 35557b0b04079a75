//! Post and comment authoring: the mutating half of the content store,
//! with the ownership rules applied before any write.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::repos::{CommentsRepo, GroupsRepo, PostsRepo, RepoError};
use crate::domain::entities::{GroupRecord, PostRecord};
use crate::domain::forms::{CommentDraft, PostDraft};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("unknown post")]
    UnknownPost,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Whether the acting user may edit a post.
#[derive(Debug)]
pub enum EditAccess {
    Owned(PostRecord),
    NotOwner,
}

/// Result of an edit attempt. A non-owner attempt is an outcome, not an
/// error: the caller redirects to the post without mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Saved,
    NotOwner,
}

#[derive(Clone)]
pub struct ContentService {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
}

impl ContentService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
    ) -> Self {
        Self {
            posts,
            comments,
            groups,
        }
    }

    /// Groups offered in the post form's select box.
    pub async fn group_choices(&self) -> Result<Vec<GroupRecord>, ContentError> {
        Ok(self.groups.list_groups().await?)
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        draft: PostDraft,
    ) -> Result<i64, ContentError> {
        let post_id = self
            .posts
            .insert_post(
                author_id,
                &draft.text,
                draft.group_id,
                draft.image_path.as_deref(),
                OffsetDateTime::now_utc(),
            )
            .await?;
        info!(
            target = "brusio::content",
            post_id,
            author_id,
            "post created"
        );
        Ok(post_id)
    }

    /// Fetch a post for the edit form, with the ownership check applied.
    pub async fn editable_post(
        &self,
        actor_id: i64,
        post_id: i64,
    ) -> Result<EditAccess, ContentError> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or(ContentError::UnknownPost)?;
        if post.author_id != actor_id {
            return Ok(EditAccess::NotOwner);
        }
        Ok(EditAccess::Owned(post))
    }

    /// Apply an edit. The image is replaced only when the draft carries a
    /// new one; `pub_date` and author never change.
    pub async fn edit_post(
        &self,
        actor_id: i64,
        post_id: i64,
        draft: PostDraft,
    ) -> Result<EditOutcome, ContentError> {
        let post = match self.editable_post(actor_id, post_id).await? {
            EditAccess::Owned(post) => post,
            EditAccess::NotOwner => return Ok(EditOutcome::NotOwner),
        };

        let image_path = draft.image_path.or(post.image_path);
        self.posts
            .update_post(post.id, &draft.text, draft.group_id, image_path.as_deref())
            .await?;
        info!(target = "brusio::content", post_id, "post edited");
        Ok(EditOutcome::Saved)
    }

    pub async fn add_comment(
        &self,
        author_id: i64,
        post_id: i64,
        draft: CommentDraft,
    ) -> Result<i64, ContentError> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or(ContentError::UnknownPost)?;
        let comment_id = self
            .comments
            .insert_comment(post.id, author_id, &draft.text, OffsetDateTime::now_utc())
            .await?;
        info!(
            target = "brusio::content",
            post_id, comment_id, "comment added"
        );
        Ok(comment_id)
    }
}
