use crate::error::{redirect, AppError};
use crate::middleware::ClientCtx;
use crate::MainData;
use actix_web::web::Data;
use actix_web::{post, HttpRequest, HttpResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(clear_cache);
}

/// Drops every cached page. Staff only.
#[post("/admin/cache/clear/")]
async fn clear_cache(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
) -> Result<HttpResponse, AppError> {
    let user = client.require_user(&req)?;
    if !user.is_staff {
        log::warn!("clear_cache: refused for {}", user.username);
        return Err(AppError::Forbidden);
    }

    data.cache.clear();
    Ok(redirect("/"))
}
