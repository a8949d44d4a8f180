use crate::comment::{create_comment, get_comments_for_post, CommentForTemplate};
use crate::error::{redirect, AppError};
use crate::form::{check_group, CommentFormInput, PostFormInput, PostFormState, ValidPostForm};
use crate::group::list_groups;
use crate::middleware::ClientCtx;
use crate::orm::groups;
use crate::post::{
    count_posts_by_author, create_post, delete_post, get_post_for_template, update_post,
    ImageChange, PostForTemplate,
};
use crate::MainData;
use actix_multipart::Multipart;
use actix_web::http::Method;
use actix_web::web::{Data, Form, Path};
use actix_web::{get, post, route, HttpRequest, HttpResponse};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(new_post)
        .service(create_post_form)
        .service(edit_post)
        .service(update_post_form)
        .service(add_comment)
        .service(destroy_post)
        .service(view_post);
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate<'a> {
    pub client: ClientCtx,
    pub post: &'a PostForTemplate,
    pub author_post_count: u64,
    pub comments: &'a [CommentForTemplate],
    pub can_update: bool,
}

/// Shared by creation and editing. `post` is the post being edited.
#[derive(Template)]
#[template(path = "new.html")]
pub struct PostFormTemplate<'a> {
    pub client: ClientCtx,
    pub form: &'a PostFormState,
    pub groups: &'a [groups::Model],
    pub post: Option<&'a PostForTemplate>,
}

impl PostFormTemplate<'_> {
    pub fn action(&self) -> String {
        match self.post {
            Some(post) => post.edit_url(),
            None => "/new/".to_owned(),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.post.is_some()
    }
}

async fn render_form(
    client: ClientCtx,
    data: &MainData,
    form: &PostFormState,
    post: Option<&PostForTemplate>,
) -> Result<HttpResponse, AppError> {
    let groups = list_groups(&data.db).await?;
    Ok(PostFormTemplate {
        client,
        form,
        groups: &groups,
        post,
    }
    .to_response())
}

/// Validates a submitted post form, including that the group exists.
async fn read_post_form(
    data: &MainData,
    multipart: Multipart,
) -> Result<Result<ValidPostForm, PostFormState>, AppError> {
    let input = PostFormInput::from_multipart(multipart, data.config.max_upload_size).await?;
    let raw_text = input.text.to_owned();
    match input.validate() {
        Ok(form) => Ok(check_group(&data.db, form, &raw_text).await?),
        Err(state) => Ok(Err(state)),
    }
}

async fn find_post(data: &MainData, path: Path<(String, i32)>) -> Result<PostForTemplate, AppError> {
    let (username, post_id) = path.into_inner();
    get_post_for_template(&data.db, &username, post_id)
        .await?
        .ok_or(AppError::NotFound)
}

#[get("/{username}/{post_id:\\d+}/")]
async fn view_post(
    client: ClientCtx,
    data: Data<MainData>,
    path: Path<(String, i32)>,
) -> Result<HttpResponse, AppError> {
    let post = find_post(&data, path).await?;
    let author_post_count = count_posts_by_author(&data.db, post.author.id).await?;
    let comments = get_comments_for_post(&data.db, post.id).await?;

    Ok(PostTemplate {
        can_update: client.can_update_post(&post),
        client,
        post: &post,
        author_post_count,
        comments: &comments,
    }
    .to_response())
}

#[get("/new/")]
async fn new_post(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
) -> Result<HttpResponse, AppError> {
    client.require_user(&req)?;
    render_form(client, &data, &PostFormState::default(), None).await
}

#[post("/new/")]
async fn create_post_form(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
    multipart: Multipart,
) -> Result<HttpResponse, AppError> {
    let user = client.require_user(&req)?;

    let form = match read_post_form(&data, multipart).await? {
        Ok(form) => form,
        Err(state) => return render_form(client, &data, &state, None).await,
    };

    // The file goes to disk first so no row ever points at a missing image.
    let image = match form.image {
        Some(image) => Some(data.media.save_post_image(image).await?),
        None => None,
    };
    let post = create_post(&data.db, user.id, form.fields, image).await?;
    log::debug!("create_post_form: {} created post {}", user.username, post.id);

    Ok(redirect(format!("/{}/", user.username)))
}

#[get("/{username}/{post_id:\\d+}/edit/")]
async fn edit_post(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
    path: Path<(String, i32)>,
) -> Result<HttpResponse, AppError> {
    client.require_user(&req)?;
    let post = find_post(&data, path).await?;
    if !client.can_update_post(&post) {
        return Ok(redirect(post.url()));
    }

    let form = PostFormState {
        text: post.text.to_owned(),
        group: post.group.as_ref().map(|g| g.id),
        ..Default::default()
    };
    render_form(client, &data, &form, Some(&post)).await
}

#[post("/{username}/{post_id:\\d+}/edit/")]
async fn update_post_form(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
    path: Path<(String, i32)>,
    multipart: Multipart,
) -> Result<HttpResponse, AppError> {
    client.require_user(&req)?;
    let post = find_post(&data, path).await?;
    if !client.can_update_post(&post) {
        return Ok(redirect(post.url()));
    }

    let form = match read_post_form(&data, multipart).await? {
        Ok(form) => form,
        Err(state) => return render_form(client, &data, &state, Some(&post)).await,
    };

    let image = match form.image {
        Some(image) => ImageChange::Replace(data.media.save_post_image(image).await?),
        None if form.image_clear => ImageChange::Clear,
        None => ImageChange::Keep,
    };
    update_post(&data.db, post.id, form.fields, image).await?;

    Ok(redirect(post.url()))
}

/// Both methods end on the post page. Only a valid POST creates a comment.
#[route("/{username}/{post_id:\\d+}/comment/", method = "GET", method = "POST")]
async fn add_comment(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
    path: Path<(String, i32)>,
    form: Option<Form<CommentFormInput>>,
) -> Result<HttpResponse, AppError> {
    let user = client.require_user(&req)?;
    let post = find_post(&data, path).await?;

    if req.method() == Method::POST {
        match form.map(|f| f.into_inner()).unwrap_or_default().validate() {
            Ok(text) => {
                create_comment(&data.db, post.id, user.id, text).await?;
            }
            Err(errors) => {
                log::debug!("add_comment: rejected comment on {}: {:?}", post.id, errors);
            }
        }
    }

    Ok(redirect(post.url()))
}

#[post("/{username}/{post_id:\\d+}/delete/")]
async fn destroy_post(
    client: ClientCtx,
    req: HttpRequest,
    data: Data<MainData>,
    path: Path<(String, i32)>,
) -> Result<HttpResponse, AppError> {
    client.require_user(&req)?;
    let post = find_post(&data, path).await?;
    if !client.can_update_post(&post) {
        return Ok(redirect(post.url()));
    }

    delete_post(&data.db, post.id).await?;
    Ok(redirect(post.author.url()))
}
