use super::html_response;
use crate::cache::page_key;
use crate::error::AppError;
use crate::middleware::ClientCtx;
use crate::pagination::{requested_page, Page, Paginator};
use crate::post::PostForTemplate;
use crate::timeline;
use crate::MainData;
use actix_web::web::{Bytes, Data};
use actix_web::{get, HttpRequest, HttpResponse};
use askama_actix::Template;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub client: ClientCtx,
    pub page: &'a Page<PostForTemplate>,
    pub paginator: Paginator,
}

/// Global timeline. Rendered pages are cached per page number and viewer.
///
/// Entries are only ever stored under a page that exists, so out of range
/// `?page=` values share the entry of the page they clamp to.
#[get("/")]
async fn view_index(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
) -> Result<HttpResponse, AppError> {
    let viewer = client.get_id();
    let requested = requested_page(req.query_string());
    let key = page_key("/", requested, viewer);

    if let Some(body) = data.cache.get(&key) {
        log::trace!("view_index: cache hit {}", key);
        return Ok(html_response(body));
    }

    let page = timeline::page(&data.db, timeline::global(), requested).await?;
    let key = page_key("/", page.number, viewer);
    if let Some(body) = data.cache.get(&key) {
        log::trace!("view_index: cache hit {} for page {}", key, requested);
        return Ok(html_response(body));
    }

    let body = Bytes::from(
        IndexTemplate {
            paginator: page.paginator("/"),
            client,
            page: &page,
        }
        .render()?,
    );
    data.cache.put(key, body.clone());

    Ok(html_response(body))
}
