use crate::form::{FormErrors, SignupFormInput};
use crate::orm::{comments, follows, posts, users};
use actix_web::web;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sea_orm::sea_query::Query;
use sea_orm::{
    entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult,
    TransactionTrait,
};

/// A mini struct for holding only what information we need about a client.
#[derive(Clone, Debug, FromQueryResult)]
pub struct ClientUser {
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub is_staff: bool,
}

/// Public facing user information.
#[derive(Clone, Debug, PartialEq, Eq, FromQueryResult)]
pub struct Profile {
    pub id: i32,
    pub username: String,
    pub display_name: String,
}

impl Profile {
    /// Display name, or the username when none was given.
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }

    pub fn url(&self) -> String {
        format!("/{}/", self.username)
    }
}

impl From<users::Model> for Profile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            display_name: user.display_name,
        }
    }
}

/// First path segments the router claims before profiles. A user with one of
/// these names would have an unreachable profile.
pub const RESERVED_USERNAMES: &[&str] = &["admin", "auth", "follow", "group", "media", "new"];

pub fn is_reserved_username(username: &str) -> bool {
    RESERVED_USERNAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(username))
}

#[derive(Debug)]
pub enum CreateUserError {
    Invalid(FormErrors),
    UsernameTaken,
    Hash(String),
    Db(DbErr),
}

impl From<DbErr> for CreateUserError {
    fn from(err: DbErr) -> Self {
        Self::Db(err)
    }
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub display_name: &'a str,
    pub password: &'a str,
    pub is_staff: bool,
}

pub async fn get_client_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<ClientUser>, DbErr> {
    users::Entity::find_by_id(id)
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Username)
        .column(users::Column::DisplayName)
        .column(users::Column::IsStaff)
        .into_model::<ClientUser>()
        .one(db)
        .await
}

pub async fn get_profile_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<Profile>, DbErr> {
    users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Username)
        .column(users::Column::DisplayName)
        .filter(users::Column::Username.eq(username))
        .into_model::<Profile>()
        .one(db)
        .await
}

pub async fn create_user(
    db: &DatabaseConnection,
    argon2: &Argon2<'static>,
    new_user: NewUser<'_>,
) -> Result<users::Model, CreateUserError> {
    let username = new_user.username.trim();
    if get_profile_by_username(db, username).await?.is_some() {
        return Err(CreateUserError::UsernameTaken);
    }

    let password_hash = hash_password(argon2, new_user.password.to_owned())
        .await
        .map_err(CreateUserError::Hash)?;

    let user = users::ActiveModel {
        username: Set(username.to_owned()),
        display_name: Set(new_user.display_name.trim().to_owned()),
        password: Set(password_hash),
        is_staff: Set(new_user.is_staff),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    log::info!("create_user: created user {} ({})", user.username, user.id);
    Ok(user)
}

/// Creates a staff account. The username and password get the same checks as sign-up.
pub async fn create_staff_user(
    db: &DatabaseConnection,
    argon2: &Argon2<'static>,
    username: &str,
    password: &str,
) -> Result<users::Model, CreateUserError> {
    SignupFormInput {
        username: username.to_owned(),
        display_name: String::new(),
        password1: password.to_owned(),
        password2: password.to_owned(),
    }
    .validate()
    .map_err(CreateUserError::Invalid)?;

    create_user(
        db,
        argon2,
        NewUser {
            username,
            display_name: "",
            password,
            is_staff: true,
        },
    )
    .await
}

pub async fn hash_password(argon2: &Argon2<'static>, password: String) -> Result<String, String> {
    let argon2 = argon2.clone();
    web::block(move || {
        argon2
            .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
            .map(|hash| hash.to_string())
            .map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| e.to_string())?
}

/// Returns the client when the username exists and the password matches its hash.
pub async fn authenticate(
    db: &DatabaseConnection,
    argon2: &Argon2<'static>,
    username: &str,
    password: &str,
) -> Result<Option<ClientUser>, DbErr> {
    let user = match users::Entity::find()
        .filter(users::Column::Username.eq(username.trim()))
        .one(db)
        .await?
    {
        Some(user) => user,
        None => return Ok(None),
    };

    let argon2 = argon2.clone();
    let stored = user.password.to_owned();
    let password = password.to_owned();
    let verified = web::block(move || match PasswordHash::new(&stored) {
        Ok(parsed) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            log::error!("authenticate: unparseable password hash: {}", e);
            false
        }
    })
    .await
    .unwrap_or(false);

    if !verified {
        return Ok(None);
    }

    Ok(Some(ClientUser {
        id: user.id,
        username: user.username,
        display_name: user.display_name,
        is_staff: user.is_staff,
    }))
}

/// Deletes a user with everything that depends on them: their posts and the
/// comments on those posts, their own comments, and follows in both directions.
pub async fn delete_user(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    let authored_posts = Query::select()
        .column(posts::Column::Id)
        .from(posts::Entity)
        .and_where(posts::Column::UserId.eq(id))
        .to_owned();
    comments::Entity::delete_many()
        .filter(
            Condition::any()
                .add(comments::Column::UserId.eq(id))
                .add(comments::Column::PostId.in_subquery(authored_posts)),
        )
        .exec(&txn)
        .await?;
    posts::Entity::delete_many()
        .filter(posts::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    follows::Entity::delete_many()
        .filter(
            Condition::any()
                .add(follows::Column::UserId.eq(id))
                .add(follows::Column::AuthorId.eq(id)),
        )
        .exec(&txn)
        .await?;
    let res = users::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    Ok(res.rows_affected > 0)
}
