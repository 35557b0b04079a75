use async_trait::async_trait;

use crate::application::repos::{FollowsRepo, RepoError};

use super::SqliteRepositories;
use super::util::map_sqlx_error;

#[async_trait]
impl FollowsRepo for SqliteRepositories {
    async fn follow_exists(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM follows WHERE user_id = ? AND author_id = ?",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(count > 0)
    }

    async fn insert_follow(&self, user_id: i64, author_id: i64) -> Result<(), RepoError> {
        sqlx::query("INSERT INTO follows (user_id, author_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(author_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn delete_follow(&self, user_id: i64, author_id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
