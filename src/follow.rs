use crate::orm::follows;
use sea_orm::sea_query::OnConflict;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, PaginatorTrait};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed,
    AlreadyFollowing,
    /// Following yourself is silently ignored.
    SelfFollow,
}

pub async fn is_following<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<bool, DbErr> {
    Ok(follows::Entity::find()
        .filter(follows::Column::UserId.eq(user_id))
        .filter(follows::Column::AuthorId.eq(author_id))
        .one(db)
        .await?
        .is_some())
}

/// Subscribes `user_id` to `author_id`. Never creates a second row for a pair,
/// including when two requests race: the insert yields to the unique index.
pub async fn follow<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<FollowOutcome, DbErr> {
    if user_id == author_id {
        return Ok(FollowOutcome::SelfFollow);
    }
    if is_following(db, user_id, author_id).await? {
        return Ok(FollowOutcome::AlreadyFollowing);
    }

    let inserted = follows::Entity::insert(follows::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([follows::Column::UserId, follows::Column::AuthorId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    if inserted > 0 {
        log::debug!("follow: user {} now follows {}", user_id, author_id);
        Ok(FollowOutcome::Followed)
    } else {
        Ok(FollowOutcome::AlreadyFollowing)
    }
}

/// Removes the subscription if there is one.
pub async fn unfollow<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    author_id: i32,
) -> Result<u64, DbErr> {
    let res = follows::Entity::delete_many()
        .filter(follows::Column::UserId.eq(user_id))
        .filter(follows::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn count_followers<C: ConnectionTrait>(db: &C, author_id: i32) -> Result<u64, DbErr> {
    follows::Entity::find()
        .filter(follows::Column::AuthorId.eq(author_id))
        .count(db)
        .await
}

pub async fn count_following<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<u64, DbErr> {
    follows::Entity::find()
        .filter(follows::Column::UserId.eq(user_id))
        .count(db)
        .await
}
