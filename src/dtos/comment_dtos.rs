use serde::{Deserialize, Serialize};

use super::{add_error, FieldErrors, REQUIRED};

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    /// Returns the trimmed comment text.
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let text = self.text.trim();
        if text.is_empty() {
            let mut errors = FieldErrors::new();
            add_error(&mut errors, "text", REQUIRED);
            return Err(errors);
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comment_is_rejected() {
        let form = CommentForm { text: "  \n ".into() };
        assert!(form.validate().unwrap_err().contains_key("text"));
    }

    #[test]
    fn comment_is_trimmed() {
        let form = CommentForm { text: " nice post ".into() };
        assert_eq!(form.validate().unwrap(), "nice post");
    }
}
