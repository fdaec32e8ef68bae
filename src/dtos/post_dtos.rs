use actix_multipart::{Multipart, MultipartError};
use futures::StreamExt;
use serde::Serialize;

use super::{add_error, FieldErrors, REQUIRED};
use crate::models::group::Group;
use crate::models::post::Post;
use crate::services::media::{validate_image, ImageKind, MAX_IMAGE_BYTES};

/// A file part of the multipart body.
#[derive(Debug)]
pub struct ImageUpload {
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Raw post form as submitted (or as prefilled for editing).
#[derive(Debug, Default, Serialize)]
pub struct PostForm {
    pub text: String,
    /// Selected group id, empty for "no group"
    pub group: String,
    #[serde(skip)]
    pub image: Option<ImageUpload>,
    /// Current image when editing
    pub current_image: Option<String>,
    #[serde(skip)]
    pub clear_image: bool,
}

/// A post form that passed validation.
#[derive(Debug)]
pub struct CleanPost<'a> {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<(ImageKind, &'a [u8])>,
    pub clear_image: bool,
}

impl PostForm {
    pub fn for_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group.as_ref().map(|g| g.id.to_string()).unwrap_or_default(),
            image: None,
            current_image: post.image.clone(),
            clear_image: false,
        }
    }

    /// Reads `text`, `group`, `image` and `image-clear` from a multipart body.
    /// Unknown parts are drained and ignored.
    pub async fn from_multipart(mut payload: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(item) = payload.next().await {
            let mut field = item?;
            let name = field.name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(|m| m.to_string());

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                // keep one byte past the limit so validation can report it
                if bytes.len() <= MAX_IMAGE_BYTES {
                    bytes.extend_from_slice(&chunk);
                }
            }

            match name.as_str() {
                "text" => form.text = String::from_utf8_lossy(&bytes).into_owned(),
                "group" => form.group = String::from_utf8_lossy(&bytes).trim().to_string(),
                "image-clear" => form.clear_image = !bytes.is_empty(),
                // browsers send an empty part when no file was picked
                "image" if !bytes.is_empty() => {
                    form.image = Some(ImageUpload {
                        content_type,
                        bytes,
                    })
                }
                _ => {}
            }
        }

        Ok(form)
    }

    pub fn validate(&self, groups: &[Group]) -> Result<CleanPost<'_>, FieldErrors> {
        let mut errors = FieldErrors::new();

        let text = self.text.trim();
        if text.is_empty() {
            add_error(&mut errors, "text", REQUIRED);
        }

        let group_id = if self.group.is_empty() {
            None
        } else {
            match self.group.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    add_error(
                        &mut errors,
                        "group",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                    None
                }
            }
        };

        let image = match &self.image {
            Some(upload) => match validate_image(upload.content_type.as_deref(), &upload.bytes) {
                Ok(kind) => Some((kind, upload.bytes.as_slice())),
                Err(message) => {
                    add_error(&mut errors, "image", message);
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(CleanPost {
            text: text.to_string(),
            group_id,
            image,
            clear_image: self.clear_image,
        })
    }
}
