use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use sea_orm::DbErr;

pub const LOGIN_URL: &str = "/auth/login/";

/// Failures a handler can return. Validation problems are not errors; forms
/// are re-rendered with their messages instead.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Not found.")]
    NotFound,
    /// Carries the path and query the caller asked for, so login can send them back.
    #[display(fmt = "You must be logged in to do that.")]
    LoginRequired { next: String },
    #[display(fmt = "You do not have permission to do that.")]
    Forbidden,
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "Internal server error.")]
    Internal(String),
}

impl AppError {
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        log::error!("{}: {}", context, err);
        Self::Internal(context.to_owned())
    }
}

/// `/auth/login/?next=<path>`
pub fn login_redirect_url(next: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{}?{}", LOGIN_URL, query)
}

/// Plain `302 Found` to `location`.
pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, location.as_ref()))
        .finish()
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::LoginRequired { .. } => StatusCode::FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::LoginRequired { next } => redirect(login_redirect_url(next)),
            // Internal detail stays in the log.
            _ => HttpResponse::build(self.status_code())
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
        }
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        Self::internal("database error", err)
    }
}

impl From<askama::Error> for AppError {
    fn from(err: askama::Error) -> Self {
        Self::internal("template error", err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal("io error", err)
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        Self::internal("blocking task error", err)
    }
}
