use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{add_error, FieldErrors, REQUIRED};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));

const USERNAME_MAX: usize = 150;
const PASSWORD_MIN: usize = 8;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SignupIn {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoginIn {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

impl SignupIn {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = self.username.trim();

        if username.is_empty() {
            add_error(&mut errors, "username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX {
            add_error(
                &mut errors,
                "username",
                format!("Ensure this value has at most {USERNAME_MAX} characters."),
            );
        } else if !USERNAME_RE.is_match(username) {
            add_error(
                &mut errors,
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        if self.password1.is_empty() {
            add_error(&mut errors, "password1", REQUIRED);
        } else {
            if self.password1.chars().count() < PASSWORD_MIN {
                add_error(
                    &mut errors,
                    "password1",
                    format!("This password is too short. It must contain at least {PASSWORD_MIN} characters."),
                );
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                add_error(&mut errors, "password1", "This password is entirely numeric.");
            }
        }

        if self.password2.is_empty() {
            add_error(&mut errors, "password2", REQUIRED);
        } else if self.password1 != self.password2 {
            add_error(&mut errors, "password2", "The two password fields didn't match.");
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl LoginIn {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            add_error(&mut errors, "username", REQUIRED);
        }
        if self.password.is_empty() {
            add_error(&mut errors, "password", REQUIRED);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Only same-site absolute paths are followed after login.
/// Browsers drop tabs and newlines from URLs, so `/\t/host` would turn into
/// `//host`; any control character makes the target unsafe.
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| {
        n.starts_with('/')
            && !n.starts_with("//")
            && !n.contains('\\')
            && !n.chars().any(|c| c.is_ascii_control())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, p1: &str, p2: &str) -> SignupIn {
        SignupIn {
            username: username.into(),
            password1: p1.into(),
            password2: p2.into(),
        }
    }

    #[test]
    fn signup_accepts_a_normal_user() {
        assert!(signup("kirill.s", "s3cret-pass", "s3cret-pass").validate().is_ok());
    }

    #[test]
    fn signup_reports_every_field() {
        let errors = signup("bad name!", "123", "456").validate().unwrap_err();
        assert!(errors.contains_key("username"));
        assert_eq!(errors["password1"].len(), 2);
        assert!(errors["password2"][0].contains("didn't match"));
    }

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next(Some("/create/")), Some("/create/"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\t/evil.example")), None);
        assert_eq!(safe_next(Some("/\n/evil.example")), None);
        assert_eq!(safe_next(Some("/\r\n/evil.example")), None);
        assert_eq!(safe_next(None), None);
    }
}
