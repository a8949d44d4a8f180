//! Post listings. Every timeline is newest first, ties broken by id so that
//! pages never overlap or skip a post.

use crate::group::get_group_by_slug;
use crate::orm::{follows, groups, posts};
use crate::pagination::{fetch_page, Page, POSTS_PER_PAGE};
use crate::post::{attach_relations, PostForTemplate};
use crate::user::{get_profile_by_username, Profile};
use sea_orm::sea_query::Query;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, Select};

fn newest_first(select: Select<posts::Entity>) -> Select<posts::Entity> {
    select
        .order_by_desc(posts::Column::PubDate)
        .order_by_desc(posts::Column::Id)
}

/// Every post.
pub fn global() -> Select<posts::Entity> {
    newest_first(posts::Entity::find())
}

pub fn by_group(group_id: i32) -> Select<posts::Entity> {
    newest_first(posts::Entity::find().filter(posts::Column::GroupId.eq(group_id)))
}

pub fn by_author(user_id: i32) -> Select<posts::Entity> {
    newest_first(posts::Entity::find().filter(posts::Column::UserId.eq(user_id)))
}

/// Posts by anyone `user_id` follows.
pub fn followed_by(user_id: i32) -> Select<posts::Entity> {
    let authors = Query::select()
        .column(follows::Column::AuthorId)
        .from(follows::Entity)
        .and_where(follows::Column::UserId.eq(user_id))
        .to_owned();
    newest_first(posts::Entity::find().filter(posts::Column::UserId.in_subquery(authors)))
}

/// The group's timeline, or `None` for an unknown slug.
pub async fn for_group<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<Option<(groups::Model, Select<posts::Entity>)>, DbErr> {
    Ok(get_group_by_slug(db, slug)
        .await?
        .map(|group| {
            let select = by_group(group.id);
            (group, select)
        }))
}

/// The author's timeline, or `None` for an unknown username.
pub async fn for_author<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<(Profile, Select<posts::Entity>)>, DbErr> {
    Ok(get_profile_by_username(db, username)
        .await?
        .map(|author| {
            let select = by_author(author.id);
            (author, select)
        }))
}

/// One page of a timeline, joined for rendering.
pub async fn page<C: ConnectionTrait>(
    db: &C,
    select: Select<posts::Entity>,
    requested: u64,
) -> Result<Page<PostForTemplate>, DbErr> {
    let page = fetch_page(db, select, POSTS_PER_PAGE, requested).await?;
    let item_count = page.item_count;
    let number = page.number;
    let page_count = page.page_count;
    let items = attach_relations(db, page.items).await?;

    Ok(Page {
        items,
        number,
        page_count,
        item_count,
    })
}
