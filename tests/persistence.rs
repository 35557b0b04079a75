//! Repository-level tests for the deletion policies and ordering rules the
//! schema is responsible for.

use time::OffsetDateTime;

use brusio::application::repos::{
    CommentsRepo, FollowsRepo, GroupsRepo, PostScope, PostsRepo, RepoError, UsersRepo,
};
use brusio::domain::entities::UserRecord;
use brusio::infra::db::SqliteRepositories;

async fn repositories() -> SqliteRepositories {
    let pool = SqliteRepositories::connect("sqlite::memory:", 1)
        .await
        .expect("connect to in-memory database");
    SqliteRepositories::run_migrations(&pool)
        .await
        .expect("apply migrations");
    SqliteRepositories::new(pool)
}

async fn insert_user(db: &SqliteRepositories, username: &str) -> UserRecord {
    db.insert_user(username, "x$unusable", OffsetDateTime::now_utc())
        .await
        .expect("insert user")
}

#[tokio::test]
async fn deleting_a_user_removes_their_posts_comments_and_follows() {
    let db = repositories().await;
    let author = insert_user(&db, "lena").await;
    let reader = insert_user(&db, "margot").await;

    let post_id = db
        .insert_post(author.id, "soon gone", None, None, OffsetDateTime::now_utc())
        .await
        .expect("insert post");
    db.insert_comment(post_id, reader.id, "a reply", OffsetDateTime::now_utc())
        .await
        .expect("insert comment");
    db.insert_follow(reader.id, author.id)
        .await
        .expect("insert follow");

    db.delete_user(author.id).await.expect("delete user");

    assert!(db.find_post(post_id).await.expect("query").is_none());
    assert_eq!(db.count_posts(PostScope::All).await.expect("count"), 0);
    assert!(db.list_comments(post_id).await.expect("query").is_empty());
    assert!(
        !db.follow_exists(reader.id, author.id)
            .await
            .expect("query follows")
    );
}

#[tokio::test]
async fn deleting_a_commenter_keeps_the_post() {
    let db = repositories().await;
    let author = insert_user(&db, "lena").await;
    let reader = insert_user(&db, "margot").await;

    let post_id = db
        .insert_post(author.id, "stays put", None, None, OffsetDateTime::now_utc())
        .await
        .expect("insert post");
    db.insert_comment(post_id, reader.id, "fleeting", OffsetDateTime::now_utc())
        .await
        .expect("insert comment");

    db.delete_user(reader.id).await.expect("delete user");

    assert!(db.find_post(post_id).await.expect("query").is_some());
    assert!(db.list_comments(post_id).await.expect("query").is_empty());
}

#[tokio::test]
async fn deleting_a_group_detaches_its_posts_without_deleting_them() {
    let db = repositories().await;
    let author = insert_user(&db, "lena").await;
    let group = db
        .insert_group("Harbour", "harbour", "")
        .await
        .expect("insert group");
    let post_id = db
        .insert_post(
            author.id,
            "keeps living",
            Some(group.id),
            None,
            OffsetDateTime::now_utc(),
        )
        .await
        .expect("insert post");

    db.delete_group(group.id).await.expect("delete group");

    let post = db
        .find_post(post_id)
        .await
        .expect("query")
        .expect("post survives");
    assert!(post.group.is_none());
    assert_eq!(post.text, "keeps living");
}

#[tokio::test]
async fn duplicate_follow_edges_are_rejected_by_the_schema() {
    let db = repositories().await;
    let author = insert_user(&db, "lena").await;
    let reader = insert_user(&db, "margot").await;

    db.insert_follow(reader.id, author.id)
        .await
        .expect("insert follow");
    let err = db
        .insert_follow(reader.id, author.id)
        .await
        .expect_err("second edge must fail");
    assert!(matches!(err, RepoError::Duplicate));
}

#[tokio::test]
async fn duplicate_usernames_are_rejected_by_the_schema() {
    let db = repositories().await;
    insert_user(&db, "lena").await;

    let err = db
        .insert_user("lena", "y$other", OffsetDateTime::now_utc())
        .await
        .expect_err("duplicate username must fail");
    assert!(matches!(err, RepoError::Duplicate));
}

#[tokio::test]
async fn comments_come_back_oldest_first() {
    let db = repositories().await;
    let author = insert_user(&db, "lena").await;
    let post_id = db
        .insert_post(author.id, "discussed", None, None, OffsetDateTime::now_utc())
        .await
        .expect("insert post");

    let base = OffsetDateTime::now_utc();
    for (text, offset) in [("first", 0), ("second", 1), ("third", 2)] {
        db.insert_comment(post_id, author.id, text, base + time::Duration::seconds(offset))
            .await
            .expect("insert comment");
    }

    let comments = db.list_comments(post_id).await.expect("list comments");
    let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["first", "second", "third"]);
}

#[tokio::test]
async fn post_listings_are_newest_first_with_id_as_tiebreak() {
    let db = repositories().await;
    let author = insert_user(&db, "lena").await;

    let same_instant = OffsetDateTime::now_utc();
    for text in ["older insert", "newer insert"] {
        db.insert_post(author.id, text, None, None, same_instant)
            .await
            .expect("insert post");
    }

    let posts = db
        .list_posts(PostScope::All, 10, 0)
        .await
        .expect("list posts");
    let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, ["newer insert", "older insert"]);
}

#[tokio::test]
async fn followed_scope_only_returns_followed_authors() {
    let db = repositories().await;
    let followed = insert_user(&db, "lena").await;
    let stranger = insert_user(&db, "noah").await;
    let reader = insert_user(&db, "margot").await;

    db.insert_post(
        followed.id,
        "from lena",
        None,
        None,
        OffsetDateTime::now_utc(),
    )
    .await
    .expect("insert post");
    db.insert_post(
        stranger.id,
        "from noah",
        None,
        None,
        OffsetDateTime::now_utc(),
    )
    .await
    .expect("insert post");
    db.insert_follow(reader.id, followed.id)
        .await
        .expect("insert follow");

    let posts = db
        .list_posts(PostScope::FollowedBy(reader.id), 10, 0)
        .await
        .expect("list posts");
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].text, "from lena");
    assert_eq!(
        db.count_posts(PostScope::FollowedBy(reader.id))
            .await
            .expect("count"),
        1
    );
}
