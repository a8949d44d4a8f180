mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use common::{get_page, init_app, login, multipart, Part, TestEnv, SMALL_GIF};
use rublog::orm::{comments, posts, users};
use rublog::user::{create_staff_user, CreateUserError};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[actix_rt::test]
async fn test_write_routes_require_login() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let post = env.post(&alice, "hello", None).await;
    let app = init_app!(env);

    let edit = format!("/alice/{}/edit/", post.id);
    let comment = format!("/alice/{}/comment/?from=feed", post.id);
    let cases = [
        ("/new/".to_owned(), "/auth/login/?next=%2Fnew%2F".to_owned()),
        (edit.clone(), format!("/auth/login/?next=%2Falice%2F{}%2Fedit%2F", post.id)),
        (
            comment,
            format!("/auth/login/?next=%2Falice%2F{}%2Fcomment%2F%3Ffrom%3Dfeed", post.id),
        ),
        ("/follow/".to_owned(), "/auth/login/?next=%2Ffollow%2F".to_owned()),
    ];

    for (uri, expected) in cases {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
        assert_eq!(common::location(&resp), expected);
    }
}

#[actix_rt::test]
async fn test_anonymous_writes_change_nothing() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let post = env.post(&alice, "hello", None).await;
    let app = init_app!(env);

    let (content_type, body) = multipart(&[
        Part::Text("text", "sneaky"),
        Part::File {
            name: "image",
            filename: "small.gif",
            content_type: "image/gif",
            data: SMALL_GIF,
        },
    ]);
    let edit = format!("/alice/{}/edit/", post.id);
    let requests = [
        (
            test::TestRequest::post()
                .uri("/new/")
                .insert_header((header::CONTENT_TYPE, content_type.clone()))
                .set_payload(body.clone()),
            "/auth/login/?next=%2Fnew%2F".to_owned(),
        ),
        (
            test::TestRequest::post()
                .uri(&edit)
                .insert_header((header::CONTENT_TYPE, content_type))
                .set_payload(body),
            format!("/auth/login/?next=%2Falice%2F{}%2Fedit%2F", post.id),
        ),
        (
            test::TestRequest::post()
                .uri(&format!("/alice/{}/comment/", post.id))
                .set_form(&[("text", "sneaky")]),
            format!("/auth/login/?next=%2Falice%2F{}%2Fcomment%2F", post.id),
        ),
        (
            test::TestRequest::post().uri("/alice/follow/"),
            "/auth/login/?next=%2Falice%2Ffollow%2F".to_owned(),
        ),
    ];

    for (req, expected) in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", expected);
        assert_eq!(common::location(&resp), expected);
    }

    assert_eq!(posts::Entity::find().count(env.db()).await.unwrap(), 1);
    assert_eq!(comments::Entity::find().count(env.db()).await.unwrap(), 0);
    let unchanged = posts::Entity::find_by_id(post.id).one(env.db()).await.unwrap().unwrap();
    assert_eq!(unchanged.text, "hello");
    assert_eq!(unchanged.image, None);
    assert!(std::fs::read_dir(env.media.path().join("posts"))
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(true));
}

#[actix_rt::test]
async fn test_login_follows_next() {
    let env = TestEnv::new().await;
    env.user("alice").await;
    let app = init_app!(env);

    let (status, body) = get_page!(app, "/auth/login/?next=%2Fnew%2F");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("name=\"next\""));

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form(&[
            ("username", "alice"),
            ("password", common::PASSWORD),
            ("next", "/new/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location(&resp), "/new/");

    // Off-site targets fall back to the index.
    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form(&[
            ("username", "alice"),
            ("password", common::PASSWORD),
            ("next", "https://example.com/"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(common::location(&resp), "/");
}

#[actix_rt::test]
async fn test_login_rejects_bad_password() {
    let env = TestEnv::new().await;
    env.user("alice").await;
    let app = init_app!(env);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form(&[("username", "alice"), ("password", "wrong password")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.response().cookies().all(|c| c.name() != "id"));
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("Please enter a correct username and password"));
}

#[actix_rt::test]
async fn test_signup_logs_in() {
    let env = TestEnv::new().await;
    env.user("alice").await;
    let app = init_app!(env);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form(&[
            ("username", "bob"),
            ("display_name", "Bobby"),
            ("password1", "a long enough password"),
            ("password2", "a long enough password"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "id")
        .expect("session cookie")
        .into_owned();

    let (status, _) = get_page!(app, "/new/", cookie);
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_page!(app, "/bob/");
    assert!(body.contains("Bobby"));

    // Taken and reserved names are refused.
    for username in ["alice", "new"] {
        let req = test::TestRequest::post()
            .uri("/auth/signup/")
            .set_form(&[
                ("username", username),
                ("password1", "a long enough password"),
                ("password2", "a long enough password"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", username);
    }
    let count = users::Entity::find()
        .filter(users::Column::Username.is_in(["alice", "new"]))
        .count(env.db())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[actix_rt::test]
async fn test_logout() {
    let env = TestEnv::new().await;
    env.user("alice").await;
    let app = init_app!(env);
    let cookie = login!(app, "alice");

    let req = test::TestRequest::get()
        .uri("/auth/logout/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    let removal = resp
        .response()
        .cookies()
        .find(|c| c.name() == "id")
        .expect("removal cookie")
        .into_owned();

    let req = test::TestRequest::get().uri("/new/").cookie(removal).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_rt::test]
async fn test_not_found_page() {
    let env = TestEnv::new().await;
    let app = init_app!(env);

    let (status, body) = get_page!(app, "/some/where/else");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Page not found"));
    assert!(body.contains("else"));
}

#[actix_rt::test]
async fn test_staff_accounts_get_signup_checks() {
    let env = TestEnv::new().await;

    for (username, password, field) in [
        ("follow", common::PASSWORD, "username"),
        ("no spaces", common::PASSWORD, "username"),
        ("moderator", "short", "password1"),
    ] {
        match create_staff_user(env.db(), &env.data.argon2, username, password).await {
            Err(CreateUserError::Invalid(errors)) => {
                assert!(!errors.get(field).is_empty(), "{}", username)
            }
            other => panic!("{} was not rejected: {:?}", username, other.map(|u| u.id)),
        }
    }
    assert_eq!(users::Entity::find().count(env.db()).await.unwrap(), 0);

    let staff = create_staff_user(env.db(), &env.data.argon2, "moderator", common::PASSWORD)
        .await
        .unwrap();
    assert!(staff.is_staff);
    assert!(matches!(
        create_staff_user(env.db(), &env.data.argon2, "moderator", common::PASSWORD).await,
        Err(CreateUserError::UsernameTaken)
    ));
}
