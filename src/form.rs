//! Form validation. Validators are pure: they look at submitted values only.
//! Checks that need the database (the group exists) run afterwards.

use crate::error::AppError;
use crate::group::get_group_by_id;
use crate::image::{check_image, ValidImage};
use crate::post::PostFields;
use crate::user::is_reserved_username;
use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use sea_orm::{ConnectionTrait, DbErr};
use serde::Deserialize;
use std::collections::BTreeMap;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";
pub const NOT_AN_IMAGE: &str = "Uploaded file is corrupted or not an image.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";
pub const CLEAR_AND_UPLOAD: &str = "Please either submit a file or check the clear checkbox, not both.";
pub const USERNAME_INVALID: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const USERNAME_TOO_LONG: &str = "Ensure this value has at most 150 characters.";
pub const USERNAME_RESERVED: &str = "This username is not available.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const PASSWORD_TOO_SHORT: &str = "This password is too short. It must contain at least 8 characters.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";

const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;

/// Messages per field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages for one field, empty when it is valid.
    pub fn get(&self, field: &str) -> Vec<String> {
        self.fields.get(field).cloned().unwrap_or_default()
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A file part of a multipart form.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Raw post form values as submitted.
#[derive(Clone, Debug, Default)]
pub struct PostFormInput {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<UploadedFile>,
    pub image_clear: bool,
}

/// What the post form template shows: current values and any errors.
#[derive(Clone, Debug, Default)]
pub struct PostFormState {
    pub text: String,
    pub group: Option<i32>,
    pub errors: FormErrors,
}

impl PostFormState {
    pub fn is_selected(&self, group_id: &i32) -> bool {
        self.group == Some(*group_id)
    }
}

#[derive(Debug)]
pub struct ValidPostForm {
    pub fields: PostFields,
    pub image: Option<ValidImage>,
    pub image_clear: bool,
}

impl PostFormInput {
    pub fn validate(self) -> Result<ValidPostForm, PostFormState> {
        let mut errors = FormErrors::default();

        let text = self.text.trim().to_owned();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let group_id = match self.group.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("group", INVALID_GROUP);
                    None
                }
            },
        };

        let image = match self.image {
            Some(file) if file.data.is_empty() && file.filename.is_empty() => None,
            Some(file) if file.data.is_empty() => {
                errors.add("image", EMPTY_FILE);
                None
            }
            Some(file) => match check_image(file.data) {
                Ok(image) => Some(image),
                Err(e) => {
                    log::debug!("PostFormInput::validate: rejected {:?}: {:?}", file.filename, e);
                    errors.add("image", NOT_AN_IMAGE);
                    None
                }
            },
            None => None,
        };

        if image.is_some() && self.image_clear {
            errors.add("image", CLEAR_AND_UPLOAD);
        }

        if !errors.is_empty() {
            return Err(PostFormState {
                text: self.text,
                group: group_id,
                errors,
            });
        }

        Ok(ValidPostForm {
            fields: PostFields { text, group_id },
            image,
            image_clear: self.image_clear,
        })
    }

    /// Reads the `text`, `group`, `image` and `image-clear` parts of a multipart body.
    /// Unknown parts are drained and ignored.
    pub async fn from_multipart(mut multipart: Multipart, max_upload: usize) -> Result<Self, AppError> {
        let mut input = Self::default();

        while let Some(mut field) = multipart
            .try_next()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed form data: {}", e)))?
        {
            let disposition = field.content_disposition();
            let name = disposition.get_name().unwrap_or_default().to_owned();
            let filename = disposition.get_filename().map(str::to_owned);

            let mut buf: Vec<u8> = Vec::new();
            while let Some(chunk) = field.next().await {
                let bytes = chunk.map_err(|e| {
                    log::warn!("from_multipart: read error: {}", e);
                    AppError::BadRequest("Error reading upload data.".to_owned())
                })?;
                if buf.len() + bytes.len() > max_upload {
                    return Err(AppError::BadRequest("Upload is too large.".to_owned()));
                }
                buf.extend_from_slice(&bytes);
            }

            match name.as_str() {
                "text" => input.text = String::from_utf8_lossy(&buf).into_owned(),
                "group" => input.group = Some(String::from_utf8_lossy(&buf).into_owned()),
                "image" => {
                    input.image = Some(UploadedFile {
                        filename: filename.unwrap_or_default(),
                        data: buf,
                    })
                }
                "image-clear" => input.image_clear = true,
                _ => {}
            }
        }

        Ok(input)
    }
}

/// Rejects a group id that does not exist.
pub async fn check_group<C: ConnectionTrait>(
    db: &C,
    form: ValidPostForm,
    raw_text: &str,
) -> Result<Result<ValidPostForm, PostFormState>, DbErr> {
    match form.fields.group_id {
        Some(id) if get_group_by_id(db, id).await?.is_none() => {
            let mut errors = FormErrors::default();
            errors.add("group", INVALID_GROUP);
            Ok(Err(PostFormState {
                text: raw_text.to_owned(),
                group: None,
                errors,
            }))
        }
        _ => Ok(Ok(form)),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentFormInput {
    #[serde(default)]
    pub text: String,
}

impl CommentFormInput {
    /// The trimmed comment text.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            let mut errors = FormErrors::default();
            errors.add("text", REQUIRED);
            return Err(errors);
        }
        Ok(text.to_owned())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupFormInput {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupFormInput {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX_LEN {
            errors.add("username", USERNAME_TOO_LONG);
        } else if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.add("username", USERNAME_INVALID);
        } else if is_reserved_username(username) {
            errors.add("username", USERNAME_RESERVED);
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add("password1", PASSWORD_TOO_SHORT);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", PASSWORD_MISMATCH);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
