use actix_web::cookie::{time, Cookie, SameSite};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{info, warn};
use rand::rngs::OsRng;
use thiserror::Error;

use crate::config::AppConfig;
use crate::dtos::auth::{LoginIn, SignupIn};
use crate::models::user::{JwtClaims, NewUser, User};
use crate::repositories::{RepoError, Repository};

pub const SESSION_COOKIE: &str = "postboard_session";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("a user with that username already exists")]
    UsernameTaken,
    #[error("invalid token")]
    InvalidToken,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Password hashing and the signed session cookie.
#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    cookie_secure: bool,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            session_ttl: Duration::hours(config.session_ttl_hours),
            cookie_secure: config.cookie_secure,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                warn!("stored password hash is unreadable: {}", e);
                false
            }
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.session_ttl).timestamp() as usize,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn decode_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(data.claims)
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.session_ttl.num_seconds()))
            .finish()
    }

    pub fn expired_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .finish();
        cookie.make_removal();
        cookie
    }

    /// Creates the account and returns it; the caller logs the user in.
    pub async fn register(&self, repo: &dyn Repository, input: &SignupIn) -> Result<User, AuthError> {
        let password_hash = self.hash_password(&input.password1)?;
        let user = repo
            .create_user(NewUser {
                username: input.username.trim().to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepoError::Conflict(_) => AuthError::UsernameTaken,
                other => AuthError::Repo(other),
            })?;
        info!("registered user {} (id {})", user.username, user.id);
        Ok(user)
    }

    pub async fn login(&self, repo: &dyn Repository, input: &LoginIn) -> Result<User, AuthError> {
        let user = repo
            .find_user_by_username(input.username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !self.verify_password(&input.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }
}
