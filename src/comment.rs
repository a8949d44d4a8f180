use crate::orm::{comments, users};
use crate::user::Profile;
use chrono::{NaiveDateTime, Utc};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

#[derive(Clone, Debug)]
pub struct CommentForTemplate {
    pub id: i32,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub author: Profile,
}

impl CommentForTemplate {
    pub fn created_at_string(&self) -> String {
        self.created_at.format("%d %b %Y %H:%M").to_string()
    }
}

/// Author and post come from the session and the URL, never from the form.
pub async fn create_comment<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
    author_id: i32,
    text: String,
) -> Result<comments::Model, DbErr> {
    comments::ActiveModel {
        post_id: Set(post_id),
        user_id: Set(author_id),
        text: Set(text),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Comments on a post, newest first.
pub async fn get_comments_for_post<C: ConnectionTrait>(
    db: &C,
    post_id: i32,
) -> Result<Vec<CommentForTemplate>, DbErr> {
    let rows = comments::Entity::find()
        .find_also_related(users::Entity)
        .filter(comments::Column::PostId.eq(post_id))
        .order_by_desc(comments::Column::CreatedAt)
        .order_by_desc(comments::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(comment, user)| match user {
            Some(user) => Some(CommentForTemplate {
                id: comment.id,
                text: comment.text,
                created_at: comment.created_at,
                author: Profile::from(user),
            }),
            None => {
                log::warn!("get_comments_for_post: comment {} has no author", comment.id);
                None
            }
        })
        .collect())
}
