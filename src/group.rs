use crate::orm::{groups, posts};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, TransactionTrait};

pub struct NewGroup<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
}

pub async fn create_group<C: ConnectionTrait>(
    db: &C,
    group: NewGroup<'_>,
) -> Result<groups::Model, DbErr> {
    groups::ActiveModel {
        title: Set(group.title.trim().to_owned()),
        slug: Set(group.slug.trim().to_owned()),
        description: Set(group
            .description
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn get_group_by_slug<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<Option<groups::Model>, DbErr> {
    groups::Entity::find()
        .filter(groups::Column::Slug.eq(slug))
        .one(db)
        .await
}

pub async fn get_group_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<groups::Model>, DbErr> {
    groups::Entity::find_by_id(id).one(db).await
}

/// All groups by title, for the post form's group selector.
pub async fn list_groups<C: ConnectionTrait>(db: &C) -> Result<Vec<groups::Model>, DbErr> {
    groups::Entity::find()
        .order_by_asc(groups::Column::Title)
        .order_by_asc(groups::Column::Id)
        .all(db)
        .await
}

/// Deletes a group. Its posts survive with no group.
pub async fn delete_group(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    posts::Entity::update_many()
        .col_expr(posts::Column::GroupId, Expr::value(Option::<i32>::None))
        .filter(posts::Column::GroupId.eq(id))
        .exec(&txn)
        .await?;
    let res = groups::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(res.rows_affected > 0)
}
