#![allow(dead_code)]

use actix_web::cookie::Key;
use actix_web::web::Data;
use argon2::{Algorithm, Argon2, Params, Version};
use rublog::cache::ManualClock;
use rublog::config::Config;
use rublog::db::create_schema;
use rublog::group::{create_group, NewGroup};
use rublog::orm::{groups, posts, users};
use rublog::post::{create_post, PostFields};
use rublog::user::{create_user, NewUser};
use rublog::MainData;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use tempfile::TempDir;

pub const PASSWORD: &str = "correct horse battery";

/// A 2x1 GIF.
pub const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

const BOUNDARY: &str = "----rublog-test-boundary";

/// Application state over a fresh in-memory database and media directory.
pub struct TestEnv {
    pub data: Data<MainData>,
    pub clock: Arc<ManualClock>,
    pub key: Key,
    pub media: TempDir,
}

impl TestEnv {
    pub async fn new() -> Self {
        let media = tempfile::tempdir().expect("media dir");

        // One connection, or every pooled connection would get its own empty database.
        let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.expect("sqlite");
        create_schema(&db).await.expect("schema");

        let config = Config {
            database_url: "sqlite::memory:".to_owned(),
            bind_address: "127.0.0.1:0".to_owned(),
            media_dir: media.path().to_owned(),
            cache_ttl: chrono::Duration::seconds(20),
            max_upload_size: 1024 * 1024,
            secret_key: None,
            session_secure: false,
            db_max_connections: 1,
            sql_logging: false,
        };

        let clock = Arc::new(ManualClock::default());
        let argon2 = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(8, 1, 1, None).expect("argon2 params"),
        );
        let data = MainData::new(config, db, clock.clone()).with_argon2(argon2);
        data.media.init().expect("media init");

        Self {
            data: Data::new(data),
            clock,
            key: Key::generate(),
            media,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.data.db
    }

    async fn create_user(&self, username: &str, is_staff: bool) -> users::Model {
        create_user(
            self.db(),
            &self.data.argon2,
            NewUser {
                username,
                display_name: "",
                password: PASSWORD,
                is_staff,
            },
        )
        .await
        .expect("create user")
    }

    pub async fn user(&self, username: &str) -> users::Model {
        self.create_user(username, false).await
    }

    pub async fn staff(&self, username: &str) -> users::Model {
        self.create_user(username, true).await
    }

    pub async fn group(&self, slug: &str) -> groups::Model {
        create_group(
            self.db(),
            NewGroup {
                title: &format!("Group {}", slug),
                slug,
                description: None,
            },
        )
        .await
        .expect("create group")
    }

    pub async fn post(&self, author: &users::Model, text: &str, group_id: Option<i32>) -> posts::Model {
        create_post(
            self.db(),
            author.id,
            PostFields {
                text: text.to_owned(),
                group_id,
            },
            None,
        )
        .await
        .expect("create post")
    }
}

/// Part of a multipart body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

/// Content type header and body of a `multipart/form-data` request.
pub fn multipart(parts: &[Part<'_>]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}

pub fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location")
        .to_owned()
}

/// Starts the full application for `$env`.
macro_rules! init_app {
    ($env:expr) => {
        actix_web::test::init_service(rublog::web::build_app($env.data.clone(), $env.key.clone()))
            .await
    };
}

/// Logs `$username` in through the login form and returns the session cookie.
macro_rules! login {
    ($app:expr, $username:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(&[("username", $username), ("password", crate::common::PASSWORD)])
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        resp.response()
            .cookies()
            .find(|c| c.name() == "id")
            .expect("session cookie")
            .into_owned()
    }};
}

/// GETs `$uri`, optionally with a session cookie, and returns status and body.
macro_rules! get_page {
    ($app:expr, $uri:expr) => {{
        let req = actix_web::test::TestRequest::get().uri($uri).to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        let status = resp.status();
        let body = actix_web::test::read_body(resp).await;
        (status, String::from_utf8(body.to_vec()).expect("utf-8 body"))
    }};
    ($app:expr, $uri:expr, $cookie:expr) => {{
        let req = actix_web::test::TestRequest::get()
            .uri($uri)
            .cookie($cookie.clone())
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        let status = resp.status();
        let body = actix_web::test::read_body(resp).await;
        (status, String::from_utf8(body.to_vec()).expect("utf-8 body"))
    }};
}

pub(crate) use {get_page, init_app, login};
