use crate::error::AppError;
use crate::follow::{count_followers, count_following, is_following};
use crate::middleware::ClientCtx;
use crate::pagination::{requested_page, Page, Paginator};
use crate::post::PostForTemplate;
use crate::timeline;
use crate::user::Profile;
use crate::MainData;
use actix_web::web::{Data, Path};
use actix_web::{get, HttpRequest, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_profile);
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate<'a> {
    pub client: ClientCtx,
    pub author: &'a Profile,
    pub page: &'a Page<PostForTemplate>,
    pub paginator: Paginator,
    /// Whether the viewer follows this author. Always false for guests and the author.
    pub following: bool,
    pub is_self: bool,
    pub follower_count: u64,
    pub following_count: u64,
}

/// An author's posts, newest first.
#[get("/{username}/")]
async fn view_profile(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
    path: Path<String>,
) -> Result<impl Responder, AppError> {
    let (author, select) = timeline::for_author(&data.db, &path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let page = timeline::page(&data.db, select, requested_page(req.query_string())).await?;

    let is_self = client.get_id() == Some(author.id);
    let following = match client.get_id() {
        Some(viewer) if !is_self => is_following(&data.db, viewer, author.id).await?,
        _ => false,
    };
    let follower_count = count_followers(&data.db, author.id).await?;
    let following_count = count_following(&data.db, author.id).await?;

    Ok(ProfileTemplate {
        client,
        paginator: page.paginator(&author.url()),
        author: &author,
        page: &page,
        following,
        is_self,
        follower_count,
        following_count,
    }
    .to_response())
}
