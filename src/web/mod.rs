pub mod admin;
pub mod auth;
pub mod error;
pub mod follow;
pub mod group;
pub mod index;
pub mod post;
pub mod profile;

use crate::filesystem::MEDIA_URL;
use crate::middleware::ClientCtx;
use crate::MainData;
use actix_files::Files;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::body::MessageBody;
use actix_web::cookie::Key;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::web::{Bytes, Data};
use actix_web::{App, Error, HttpResponse};

/// Configures the web app
///
/// Fixed prefixes are registered before the `/{username}/` routes that would
/// otherwise swallow them.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    index::configure(conf);
    follow::configure(conf);
    auth::configure(conf);
    admin::configure(conf);
    group::configure(conf);
    post::configure(conf);
    profile::configure(conf);
}

/// The complete application with its middleware stack, used by the server
/// and by integration tests alike.
pub fn build_app(
    data: Data<MainData>,
    secret_key: Key,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let media_root = data.media.root().to_owned();
    let cookie_secure = data.config.session_secure;

    // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
    App::new()
        .app_data(data)
        .wrap(
            ErrorHandlers::new()
                .handler(StatusCode::NOT_FOUND, error::render_404)
                .handler(StatusCode::INTERNAL_SERVER_ERROR, error::render_500),
        )
        .wrap(ClientCtx::default())
        .wrap(
            SessionMiddleware::builder(CookieSessionStore::default(), secret_key)
                .cookie_secure(cookie_secure)
                .build(),
        )
        .wrap(Logger::new("%a %r %s %Dms"))
        .service(Files::new(MEDIA_URL, media_root))
        .configure(configure)
}

/// An already rendered HTML document.
pub fn html_response(body: impl Into<Bytes>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body.into())
}
