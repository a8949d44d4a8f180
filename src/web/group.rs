use crate::error::AppError;
use crate::middleware::ClientCtx;
use crate::orm::groups;
use crate::pagination::{requested_page, Page, Paginator};
use crate::post::PostForTemplate;
use crate::timeline;
use crate::MainData;
use actix_web::web::{Data, Path};
use actix_web::{get, HttpRequest, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_group);
}

#[derive(Template)]
#[template(path = "group.html")]
pub struct GroupTemplate<'a> {
    pub client: ClientCtx,
    pub group: &'a groups::Model,
    pub page: &'a Page<PostForTemplate>,
    pub paginator: Paginator,
}

#[get("/group/{slug}/")]
async fn view_group(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
    path: Path<String>,
) -> Result<impl Responder, AppError> {
    let (group, select) = timeline::for_group(&data.db, &path.into_inner())
        .await?
        .ok_or(AppError::NotFound)?;
    let page = timeline::page(&data.db, select, requested_page(req.query_string())).await?;

    let base_url = format!("/group/{}/", group.slug);
    Ok(GroupTemplate {
        client,
        group: &group,
        paginator: page.paginator(&base_url),
        page: &page,
    }
    .to_response())
}
