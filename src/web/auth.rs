use crate::error::{redirect, AppError};
use crate::form::{FormErrors, SignupFormInput, USERNAME_TAKEN};
use crate::middleware::ClientCtx;
use crate::session::SESSION_USER_ID;
use crate::user::{authenticate, create_user, CreateUserError, NewUser};
use crate::MainData;
use actix_session::Session;
use actix_web::web::{Data, Form};
use actix_web::{get, post, HttpRequest, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_login)
        .service(post_login)
        .service(view_logout)
        .service(view_signup)
        .service(post_signup);
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub client: ClientCtx,
    pub username: &'a str,
    pub next: &'a str,
    pub error: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate<'a> {
    pub client: ClientCtx,
    pub username: &'a str,
    pub display_name: &'a str,
    pub errors: &'a FormErrors,
}

#[derive(Deserialize)]
pub struct FormData {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    next: String,
}

#[derive(Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

/// Where to go after logging in. Only paths on this site are followed.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(next) if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') => {
            next
        }
        _ => "/",
    }
}

fn login_user(session: &Session, user_id: i32) -> Result<(), AppError> {
    session.renew();
    session
        .insert(SESSION_USER_ID, user_id)
        .map_err(|e| AppError::internal("login_user: session insert", e))
}

#[get("/auth/login/")]
async fn view_login(client: ClientCtx, req: HttpRequest) -> impl Responder {
    let next = actix_web::web::Query::<NextQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().next)
        .unwrap_or_default();

    LoginTemplate {
        client,
        username: "",
        next: &next,
        error: None,
    }
    .to_response()
}

#[post("/auth/login/")]
async fn post_login(
    client: ClientCtx,
    data: Data<MainData>,
    session: Session,
    form: Form<FormData>,
) -> Result<HttpResponse, AppError> {
    match authenticate(&data.db, &data.argon2, &form.username, &form.password).await? {
        Some(user) => {
            log::debug!("post_login: {} logged in", user.username);
            login_user(&session, user.id)?;
            Ok(redirect(safe_next(Some(form.next.as_str()))))
        }
        None => Ok(LoginTemplate {
            client,
            username: form.username.trim(),
            next: &form.next,
            error: Some("Please enter a correct username and password. Note that both fields may be case-sensitive."),
        }
        .to_response()),
    }
}

#[get("/auth/logout/")]
async fn view_logout(session: Session) -> HttpResponse {
    session.purge();
    redirect("/")
}

#[get("/auth/signup/")]
async fn view_signup(client: ClientCtx) -> impl Responder {
    SignupTemplate {
        client,
        username: "",
        display_name: "",
        errors: &FormErrors::default(),
    }
    .to_response()
}

#[post("/auth/signup/")]
async fn post_signup(
    client: ClientCtx,
    data: Data<MainData>,
    session: Session,
    form: Form<SignupFormInput>,
) -> Result<HttpResponse, AppError> {
    let render = |client: ClientCtx, errors: &FormErrors| {
        SignupTemplate {
            client,
            username: form.username.trim(),
            display_name: form.display_name.trim(),
            errors,
        }
        .to_response()
    };

    if let Err(errors) = form.validate() {
        return Ok(render(client, &errors));
    }

    let new_user = NewUser {
        username: &form.username,
        display_name: &form.display_name,
        password: &form.password1,
        is_staff: false,
    };
    match create_user(&data.db, &data.argon2, new_user).await {
        Ok(user) => {
            login_user(&session, user.id)?;
            Ok(redirect("/"))
        }
        Err(CreateUserError::Invalid(errors)) => Ok(render(client, &errors)),
        Err(CreateUserError::UsernameTaken) => {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN);
            Ok(render(client, &errors))
        }
        Err(CreateUserError::Hash(e)) => Err(AppError::internal("post_signup: hash", e)),
        Err(CreateUserError::Db(e)) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/new/")), "/new/");
        assert_eq!(safe_next(Some("/alice/3/comment/?x=1")), "/alice/3/comment/?x=1");
        assert_eq!(safe_next(Some("")), "/");
        assert_eq!(safe_next(None), "/");
        assert_eq!(safe_next(Some("https://example.com/")), "/");
        assert_eq!(safe_next(Some("//example.com/")), "/");
        assert_eq!(safe_next(Some("/\\example.com")), "/");
    }
}
