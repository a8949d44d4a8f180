use crate::filesystem::get_file_url;
use crate::orm::{comments, groups, posts, users};
use crate::user::Profile;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, PaginatorTrait,
    TransactionTrait,
};
use std::collections::HashMap;

/// The group a post is filed under, as shown next to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupRef {
    pub id: i32,
    pub title: String,
    pub slug: String,
}

impl GroupRef {
    pub fn url(&self) -> String {
        format!("/group/{}/", self.slug)
    }
}

impl From<groups::Model> for GroupRef {
    fn from(group: groups::Model) -> Self {
        Self {
            id: group.id,
            title: group.title,
            slug: group.slug,
        }
    }
}

/// A post joined with its author and group.
#[derive(Clone, Debug)]
pub struct PostForTemplate {
    pub id: i32,
    pub text: String,
    pub pub_date: NaiveDateTime,
    pub image: Option<String>,
    pub author: Profile,
    pub group: Option<GroupRef>,
}

impl PostForTemplate {
    pub fn url(&self) -> String {
        format!("/{}/{}/", self.author.username, self.id)
    }

    pub fn edit_url(&self) -> String {
        format!("/{}/{}/edit/", self.author.username, self.id)
    }

    pub fn comment_url(&self) -> String {
        format!("/{}/{}/comment/", self.author.username, self.id)
    }

    pub fn delete_url(&self) -> String {
        format!("/{}/{}/delete/", self.author.username, self.id)
    }

    pub fn image_url(&self) -> Option<String> {
        self.image.as_deref().map(get_file_url)
    }

    pub fn pub_date_string(&self) -> String {
        self.pub_date.format("%d %b %Y %H:%M").to_string()
    }
}

/// Fields of a post that passed validation.
#[derive(Clone, Debug, Default)]
pub struct PostFields {
    pub text: String,
    pub group_id: Option<i32>,
}

/// Joins authors and groups onto `models`, keeping their order.
/// Relations are loaded with one query each, not per post.
pub async fn attach_relations<C: ConnectionTrait>(
    db: &C,
    models: Vec<posts::Model>,
) -> Result<Vec<PostForTemplate>, DbErr> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let mut user_ids: Vec<i32> = models.iter().map(|p| p.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let mut group_ids: Vec<i32> = models.iter().filter_map(|p| p.group_id).collect();
    group_ids.sort_unstable();
    group_ids.dedup();

    let authors: HashMap<i32, Profile> = users::Entity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, Profile::from(u)))
        .collect();

    let groups: HashMap<i32, GroupRef> = if group_ids.is_empty() {
        HashMap::new()
    } else {
        groups::Entity::find()
            .filter(groups::Column::Id.is_in(group_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, GroupRef::from(g)))
            .collect()
    };

    Ok(models
        .into_iter()
        .filter_map(|post| {
            let author = match authors.get(&post.user_id) {
                Some(author) => author.to_owned(),
                None => {
                    log::warn!("attach_relations: post {} has no author", post.id);
                    return None;
                }
            };
            Some(PostForTemplate {
                group: post.group_id.and_then(|id| groups.get(&id).cloned()),
                id: post.id,
                text: post.text,
                pub_date: post.pub_date,
                image: post.image,
                author,
            })
        })
        .collect())
}

pub async fn create_post<C: ConnectionTrait>(
    db: &C,
    author_id: i32,
    fields: PostFields,
    image: Option<String>,
) -> Result<posts::Model, DbErr> {
    posts::ActiveModel {
        text: Set(fields.text),
        pub_date: Set(Utc::now().naive_utc()),
        user_id: Set(author_id),
        group_id: Set(fields.group_id),
        image: Set(image),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// How an edit treats the stored image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(String),
}

/// Rewrites the editable fields. `pub_date` and the author never change.
pub async fn update_post<C: ConnectionTrait>(
    db: &C,
    id: i32,
    fields: PostFields,
    image: ImageChange,
) -> Result<posts::Model, DbErr> {
    let mut post = posts::ActiveModel {
        id: Unchanged(id),
        text: Set(fields.text),
        group_id: Set(fields.group_id),
        ..Default::default()
    };
    match image {
        ImageChange::Keep => {}
        ImageChange::Clear => post.image = Set(None),
        ImageChange::Replace(path) => post.image = Set(Some(path)),
    }
    post.update(db).await
}

/// Finds a post only if it was written by `username`.
pub async fn get_post_by_author<C: ConnectionTrait>(
    db: &C,
    username: &str,
    id: i32,
) -> Result<Option<posts::Model>, DbErr> {
    posts::Entity::find_by_id(id)
        .inner_join(users::Entity)
        .filter(users::Column::Username.eq(username))
        .one(db)
        .await
}

pub async fn get_post_for_template<C: ConnectionTrait>(
    db: &C,
    username: &str,
    id: i32,
) -> Result<Option<PostForTemplate>, DbErr> {
    match get_post_by_author(db, username, id).await? {
        Some(post) => Ok(attach_relations(db, vec![post]).await?.pop()),
        None => Ok(None),
    }
}

pub async fn count_posts_by_author<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<u64, DbErr> {
    posts::Entity::find()
        .filter(posts::Column::UserId.eq(user_id))
        .count(db)
        .await
}

/// Deletes a post and its comments.
pub async fn delete_post(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    comments::Entity::delete_many()
        .filter(comments::Column::PostId.eq(id))
        .exec(&txn)
        .await?;
    let res = posts::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(res.rows_affected > 0)
}
