mod common;

use actix_web::{http::StatusCode, test};
use common::{get_page, init_app, login, TestEnv};
use rublog::follow::follow;
use rublog::orm::posts;
use rublog::timeline;
use sea_orm::{ActiveModelTrait, Set};

#[actix_rt::test]
async fn test_global_timeline_pages() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let mut ids = Vec::new();
    for n in 0..13 {
        ids.push(env.post(&alice, &format!("post number {}", n), None).await.id);
    }
    ids.reverse();

    let first = timeline::page(env.db(), timeline::global(), 1).await.unwrap();
    assert_eq!(first.item_count, 13);
    assert_eq!(first.page_count, 2);
    assert!(first.has_next());
    assert!(!first.has_previous());
    let first_ids: Vec<i32> = first.items.iter().map(|p| p.id).collect();
    assert_eq!(first_ids, ids[..10]);

    let second = timeline::page(env.db(), timeline::global(), 2).await.unwrap();
    let second_ids: Vec<i32> = second.items.iter().map(|p| p.id).collect();
    assert_eq!(second_ids, ids[10..]);
    assert!(!second.has_next());
    assert!(second.has_previous());
    assert_eq!(second.items[0].author.username, "alice");

    // Past the end is the last page.
    let past = timeline::page(env.db(), timeline::global(), 40).await.unwrap();
    assert_eq!(past.number, 2);
    assert_eq!(past.items.len(), 3);
}

#[actix_rt::test]
async fn test_empty_timeline_has_one_page() {
    let env = TestEnv::new().await;
    let page = timeline::page(env.db(), timeline::global(), 3).await.unwrap();
    assert_eq!(page.number, 1);
    assert_eq!(page.page_count, 1);
    assert!(page.is_empty());

    let app = init_app!(env);
    let (status, body) = get_page!(app, "/?page=nope");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Nothing has been posted yet."));
}

#[actix_rt::test]
async fn test_lenient_page_parameter() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    for n in 0..11 {
        env.post(&alice, &format!("entry-{:02}", n), None).await;
    }
    let app = init_app!(env);

    for uri in ["/", "/?page=1", "/?page=0", "/?page=-4", "/?page=abc"] {
        let (status, body) = get_page!(app, uri);
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert!(body.contains("entry-10"), "{}", uri);
        assert!(!body.contains("entry-00"), "{}", uri);
        assert!(body.contains("rel=\"next\""), "{}", uri);
        assert!(!body.contains("rel=\"prev\""), "{}", uri);
    }

    let (status, body) = get_page!(app, "/?page=999");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("entry-00"));
    assert!(!body.contains("entry-10"));
    assert!(body.contains("rel=\"prev\""));
    assert!(!body.contains("rel=\"next\""));
}

#[actix_rt::test]
async fn test_group_timeline() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let cats = env.group("cats").await;
    let dogs = env.group("dogs").await;
    env.post(&alice, "a cat post", Some(cats.id)).await;
    env.post(&alice, "a dog post", Some(dogs.id)).await;
    env.post(&alice, "an ungrouped post", None).await;
    let app = init_app!(env);

    let (status, body) = get_page!(app, "/group/cats/");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("a cat post"));
    assert!(!body.contains("a dog post"));
    assert!(!body.contains("an ungrouped post"));

    let (status, body) = get_page!(app, "/group/birds/");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("group") && body.contains("birds"));
}

#[actix_rt::test]
async fn test_author_timeline() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    env.post(&alice, "written by alice", None).await;
    env.post(&bob, "written by bob", None).await;
    let app = init_app!(env);

    let (status, body) = get_page!(app, "/alice/");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("written by alice"));
    assert!(!body.contains("written by bob"));
    assert!(body.contains("Posts: 1"));

    let (status, _) = get_page!(app, "/nobody/");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_followed_timeline() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let bob = env.user("bob").await;
    let carol = env.user("carol").await;
    env.post(&bob, "bob was here", None).await;
    env.post(&carol, "carol was here", None).await;

    let app = init_app!(env);
    let cookie = login!(app, "alice");

    let (status, body) = get_page!(app, "/follow/", cookie);
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("bob was here"));

    follow(env.db(), alice.id, bob.id).await.unwrap();
    let (_, body) = get_page!(app, "/follow/", cookie);
    assert!(body.contains("bob was here"));
    assert!(!body.contains("carol was here"));

    let req = test::TestRequest::get().uri("/follow/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location(&resp), "/auth/login/?next=%2Ffollow%2F");
}

#[actix_rt::test]
async fn test_same_pub_date_orders_by_id() {
    let env = TestEnv::new().await;
    let alice = env.user("alice").await;
    let pub_date = chrono::Utc::now().naive_utc();
    let mut ids = Vec::new();
    for n in 0..12 {
        let post = posts::ActiveModel {
            text: Set(format!("simultaneous {}", n)),
            pub_date: Set(pub_date),
            user_id: Set(alice.id),
            ..Default::default()
        }
        .insert(env.db())
        .await
        .unwrap();
        ids.push(post.id);
    }
    ids.reverse();

    let first = timeline::page(env.db(), timeline::global(), 1).await.unwrap();
    let second = timeline::page(env.db(), timeline::global(), 2).await.unwrap();
    let first_ids: Vec<i32> = first.items.iter().map(|p| p.id).collect();
    let second_ids: Vec<i32> = second.items.iter().map(|p| p.id).collect();

    assert_eq!(first_ids, ids[..10]);
    assert_eq!(second_ids, ids[10..]);
    assert!(first_ids.iter().all(|id| !second_ids.contains(id)));
}
