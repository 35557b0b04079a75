//! The follow graph: directed edges from a reader to an author.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::application::repos::{FollowsRepo, RepoError, UsersRepo};

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("unknown author")]
    UnknownAuthor,
    #[error("not following this author")]
    NotFollowing,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FollowService {
    users: Arc<dyn UsersRepo>,
    follows: Arc<dyn FollowsRepo>,
}

impl FollowService {
    pub fn new(users: Arc<dyn UsersRepo>, follows: Arc<dyn FollowsRepo>) -> Self {
        Self { users, follows }
    }

    /// Create a follow edge. Following yourself or an author you already
    /// follow is a no-op; the edge set never gains duplicates.
    pub async fn follow(&self, actor_id: i64, target_username: &str) -> Result<(), SocialError> {
        let author = self
            .users
            .find_user_by_username(target_username)
            .await?
            .ok_or(SocialError::UnknownAuthor)?;

        if author.id == actor_id {
            debug!(target = "brusio::social", actor_id, "self-follow ignored");
            return Ok(());
        }
        if self.follows.follow_exists(actor_id, author.id).await? {
            return Ok(());
        }

        // A concurrent request may win the insert between the check and the
        // write; the unique constraint then reports a duplicate, which is
        // the edge we wanted anyway.
        match self.follows.insert_follow(actor_id, author.id).await {
            Ok(()) | Err(RepoError::Duplicate) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a follow edge. Strict semantics: removing an edge that does
    /// not exist is an error, not a no-op.
    pub async fn unfollow(&self, actor_id: i64, target_username: &str) -> Result<(), SocialError> {
        let author = self
            .users
            .find_user_by_username(target_username)
            .await?
            .ok_or(SocialError::UnknownAuthor)?;

        if self.follows.delete_follow(actor_id, author.id).await? {
            Ok(())
        } else {
            Err(SocialError::NotFollowing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use crate::domain::entities::UserRecord;

    struct OneAuthor;

    #[async_trait]
    impl UsersRepo for OneAuthor {
        async fn find_user_by_username(
            &self,
            username: &str,
        ) -> Result<Option<UserRecord>, RepoError> {
            Ok((username == "lena").then(|| UserRecord {
                id: 7,
                username: "lena".to_string(),
                password_hash: "x$unusable".to_string(),
                created_at: OffsetDateTime::UNIX_EPOCH,
            }))
        }

        async fn insert_user(
            &self,
            _username: &str,
            _password_hash: &str,
            _created_at: OffsetDateTime,
        ) -> Result<UserRecord, RepoError> {
            Err(RepoError::Persistence("not used".to_string()))
        }

        async fn delete_user(&self, _id: i64) -> Result<(), RepoError> {
            Err(RepoError::Persistence("not used".to_string()))
        }
    }

    /// No edge at check time, but the insert reports a duplicate: the shape
    /// of two concurrent follow requests where this one loses the write.
    struct LosesTheInsertRace;

    #[async_trait]
    impl FollowsRepo for LosesTheInsertRace {
        async fn follow_exists(&self, _user_id: i64, _author_id: i64) -> Result<bool, RepoError> {
            Ok(false)
        }

        async fn insert_follow(&self, _user_id: i64, _author_id: i64) -> Result<(), RepoError> {
            Err(RepoError::Duplicate)
        }

        async fn delete_follow(&self, _user_id: i64, _author_id: i64) -> Result<bool, RepoError> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn losing_the_insert_race_is_still_a_no_op() {
        let service = FollowService::new(Arc::new(OneAuthor), Arc::new(LosesTheInsertRace));
        service
            .follow(3, "lena")
            .await
            .expect("duplicate edge must resolve as a no-op");
    }
}
