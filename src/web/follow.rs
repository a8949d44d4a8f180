use crate::error::{redirect, AppError};
use crate::follow::{follow, unfollow, FollowOutcome};
use crate::middleware::ClientCtx;
use crate::pagination::{requested_page, Page, Paginator};
use crate::post::PostForTemplate;
use crate::timeline;
use crate::user::get_profile_by_username;
use crate::MainData;
use actix_web::web::{Data, Path};
use actix_web::{get, route, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_follow_index)
        .service(follow_author)
        .service(unfollow_author);
}

#[derive(Template)]
#[template(path = "follow.html")]
pub struct FollowTemplate<'a> {
    pub client: ClientCtx,
    pub page: &'a Page<PostForTemplate>,
    pub paginator: Paginator,
}

/// Posts by the authors the viewer follows.
#[get("/follow/")]
async fn view_follow_index(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
) -> Result<impl Responder, AppError> {
    let user = client.require_user(&req)?;
    let page = timeline::page(
        &data.db,
        timeline::followed_by(user.id),
        requested_page(req.query_string()),
    )
    .await?;

    Ok(FollowTemplate {
        client,
        paginator: page.paginator("/follow/"),
        page: &page,
    }
    .to_response())
}

#[route("/{username}/follow/", method = "GET", method = "POST")]
async fn follow_author(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
    path: Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = client.require_user(&req)?;
    let author = get_profile_by_username(&data.db, &path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;

    if follow(&data.db, user.id, author.id).await? == FollowOutcome::SelfFollow {
        log::debug!("follow_author: {} tried to follow themselves", user.username);
    }

    Ok(redirect(author.url()))
}

#[route("/{username}/unfollow/", method = "GET", method = "POST")]
async fn unfollow_author(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
    path: Path<String>,
) -> Result<HttpResponse, AppError> {
    let user = client.require_user(&req)?;
    let author = get_profile_by_username(&data.db, &path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;

    unfollow(&data.db, user.id, author.id).await?;

    Ok(redirect(author.url()))
}
