use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use time::OffsetDateTime;

use crate::application::repos::{PostScope, PostsRepo, RepoError};
use crate::domain::entities::PostRecord;

use super::SqliteRepositories;
use super::types::PostRow;
use super::util::map_sqlx_error;

const POST_COLUMNS: &str = "p.id, p.text, p.pub_date, p.author_id, \
     u.username AS author_username, p.group_id, g.slug AS group_slug, \
     g.title AS group_title, p.image_path";

const POST_JOINS: &str = " FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN groups g ON g.id = p.group_id \
     WHERE 1=1 ";

fn apply_scope(qb: &mut QueryBuilder<'_, Sqlite>, scope: PostScope) {
    match scope {
        PostScope::All => {}
        PostScope::Group(group_id) => {
            qb.push(" AND p.group_id = ");
            qb.push_bind(group_id);
        }
        PostScope::Author(author_id) => {
            qb.push(" AND p.author_id = ");
            qb.push_bind(author_id);
        }
        PostScope::FollowedBy(user_id) => {
            qb.push(" AND p.author_id IN (SELECT author_id FROM follows WHERE user_id = ");
            qb.push_bind(user_id);
            qb.push(")");
        }
    }
}

#[async_trait]
impl PostsRepo for SqliteRepositories {
    async fn list_posts(
        &self,
        scope: PostScope,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(POST_JOINS);
        apply_scope(&mut qb, scope);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(i64::from(limit));
        qb.push(" OFFSET ");
        qb.push_bind(i64::from(offset));

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn count_posts(&self, scope: PostScope) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*)");
        qb.push(POST_JOINS);
        apply_scope(&mut qb, scope);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(POST_JOINS);
        qb.push(" AND p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn insert_post(
        &self,
        author_id: i64,
        text: &str,
        group_id: Option<i64>,
        image_path: Option<&str>,
        pub_date: OffsetDateTime,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image_path) \
             VALUES (?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(text)
        .bind(pub_date)
        .bind(author_id)
        .bind(group_id)
        .bind(image_path)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn update_post(
        &self,
        id: i64,
        text: &str,
        group_id: Option<i64>,
        image_path: Option<&str>,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE posts SET text = ?, group_id = ?, image_path = ? WHERE id = ?",
        )
        .bind(text)
        .bind(group_id)
        .bind(image_path)
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
