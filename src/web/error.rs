use crate::middleware::ClientCtx;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::ServiceResponse;
use actix_web::http::{header, header::HeaderValue};
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::Result;
use askama_actix::Template;

#[derive(Template)]
#[template(path = "misc/404.html")]
struct NotFoundTemplate {
    client: ClientCtx,
    path: String,
}

#[derive(Template)]
#[template(path = "misc/500.html")]
struct ServerErrorTemplate {
    client: ClientCtx,
}

/// Swaps the body of an error response for `document`.
fn error_document<B>(res: ServiceResponse<B>, document: String) -> Result<ErrorHandlerResponse<B>> {
    let body = BoxBody::new(document);
    let mut res: ServiceResponse<EitherBody<B>> =
        res.map_body(|_, _| EitherBody::<B, BoxBody>::right(body));

    // Headers must be manually set because Actix-Web renders no content by default.
    let headers = res.response_mut().headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    // Proxies love to cache error pages permanently. Explicitly say not to do that.
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    Ok(ErrorHandlerResponse::Response(res))
}

/// Not-found page. Shows the path that was asked for.
pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    let document = NotFoundTemplate {
        client: ClientCtx::from_http_request(res.request()),
        path: res.request().path().to_owned(),
    }
    .to_string();
    error_document(res, document)
}

/// Server error page. The cause was logged where it happened and is not shown.
pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    let document = ServerErrorTemplate {
        client: ClientCtx::from_http_request(res.request()),
    }
    .to_string();
    error_document(res, document)
}
