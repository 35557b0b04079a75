//! Feed composition: every paginated post listing on the site.

use std::num::NonZeroU32;
use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{self, Page};
use crate::application::repos::{
    CommentsRepo, FollowsRepo, GroupsRepo, PostScope, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{CommentRecord, GroupRecord, PostRecord, UserRecord};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group")]
    UnknownGroup,
    #[error("unknown author")]
    UnknownAuthor,
    #[error("unknown post")]
    UnknownPost,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// An author's listing page together with the profile header data.
#[derive(Debug, Clone)]
pub struct AuthorFeed {
    pub author: UserRecord,
    pub page: Page<PostRecord>,
    pub posts_count: u64,
    /// Whether the viewer follows this author; always false for anonymous
    /// viewers.
    pub following: bool,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: PostRecord,
    pub comments: Vec<CommentRecord>,
    pub author_posts_count: u64,
}

/// Builds the paginated, ordered post listings. Page size and ordering are
/// identical across all contexts; only the filter predicate differs.
#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
    posts_per_page: NonZeroU32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        comments: Arc<dyn CommentsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        follows: Arc<dyn FollowsRepo>,
        posts_per_page: NonZeroU32,
    ) -> Self {
        Self {
            posts,
            comments,
            groups,
            users,
            follows,
            posts_per_page,
        }
    }

    pub async fn home_page(&self, requested: u32) -> Result<Page<PostRecord>, FeedError> {
        self.scoped_page(PostScope::All, requested).await
    }

    pub async fn group_page(
        &self,
        slug: &str,
        requested: u32,
    ) -> Result<(GroupRecord, Page<PostRecord>), FeedError> {
        let group = self
            .groups
            .find_group_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;
        let page = self.scoped_page(PostScope::Group(group.id), requested).await?;
        Ok((group, page))
    }

    pub async fn author_page(
        &self,
        username: &str,
        requested: u32,
        viewer: Option<i64>,
    ) -> Result<AuthorFeed, FeedError> {
        let author = self
            .users
            .find_user_by_username(username)
            .await?
            .ok_or(FeedError::UnknownAuthor)?;

        let page = self
            .scoped_page(PostScope::Author(author.id), requested)
            .await?;
        let posts_count = page.total_items;

        let following = match viewer {
            Some(viewer_id) => self.follows.follow_exists(viewer_id, author.id).await?,
            None => false,
        };

        Ok(AuthorFeed {
            author,
            page,
            posts_count,
            following,
        })
    }

    pub async fn followed_page(
        &self,
        viewer_id: i64,
        requested: u32,
    ) -> Result<Page<PostRecord>, FeedError> {
        self.scoped_page(PostScope::FollowedBy(viewer_id), requested)
            .await
    }

    pub async fn post_detail(&self, post_id: i64) -> Result<PostDetail, FeedError> {
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .ok_or(FeedError::UnknownPost)?;
        let comments = self.comments.list_comments(post.id).await?;
        let author_posts_count = self
            .posts
            .count_posts(PostScope::Author(post.author_id))
            .await?;

        Ok(PostDetail {
            post,
            comments,
            author_posts_count,
        })
    }

    async fn scoped_page(
        &self,
        scope: PostScope,
        requested: u32,
    ) -> Result<Page<PostRecord>, FeedError> {
        let per_page = self.posts_per_page;
        let total_items = self.posts.count_posts(scope).await?;
        let number = pagination::clamp_page(requested, total_items, per_page);
        let items = self
            .posts
            .list_posts(scope, per_page.get(), pagination::offset(number, per_page))
            .await?;

        Ok(Page {
            items,
            number,
            per_page: per_page.get(),
            total_items,
            total_pages: pagination::total_pages(total_items, per_page),
        })
    }
}
