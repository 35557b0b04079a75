use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CommentsRepo, RepoError};
use crate::domain::entities::CommentRecord;

use super::SqliteRepositories;
use super::types::CommentRow;
use super::util::map_sqlx_error;

#[async_trait]
impl CommentsRepo for SqliteRepositories {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            "SELECT c.id, c.post_id, c.author_id, u.username AS author_username, \
                    c.text, c.created \
             FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = ? \
             ORDER BY c.created ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn insert_comment(
        &self,
        post_id: i64,
        author_id: i64,
        text: &str,
        created: OffsetDateTime,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO comments (post_id, author_id, text, created) \
             VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(created)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
