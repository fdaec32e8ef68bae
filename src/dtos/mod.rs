pub mod auth_dtos;
pub mod comment_dtos;
pub mod post_dtos;
// short aliases: `crate::dtos::auth`, `crate::dtos::post`
pub use auth_dtos as auth;
pub use comment_dtos as comment;
pub use post_dtos as post;

use std::collections::BTreeMap;

/// Validation messages keyed by form field, rendered next to each input.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

pub const REQUIRED: &str = "This field is required.";

pub(crate) fn add_error(errors: &mut FieldErrors, field: &'static str, message: impl Into<String>) {
    errors.entry(field).or_default().push(message.into());
}
