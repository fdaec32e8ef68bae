use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use deadpool_postgres::{Config, Pool, PoolConfig, Runtime};
use tokio_postgres::NoTls;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => bail!("unknown STORAGE backend {other:?} (expected postgres or memory)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub storage: StorageBackend,
    pub posts_per_page: u64,
    pub index_cache_ttl: Duration,
    pub media_root: PathBuf,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
}

impl AppConfig {
    /// Local defaults: in-memory storage and a throwaway signing key.
    pub fn development(media_root: impl Into<PathBuf>) -> Self {
        Self {
            port: 8080,
            storage: StorageBackend::Memory,
            posts_per_page: 10,
            index_cache_ttl: Duration::from_secs(20),
            media_root: media_root.into(),
            jwt_secret: "development-only-secret".to_string(),
            session_ttl_hours: 24 * 14,
            cookie_secure: false,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: env_or("PORT", 8080)?,
            storage: env_or("STORAGE", StorageBackend::Postgres)?,
            posts_per_page: env_or("POSTS_PER_PAGE", 10)?,
            index_cache_ttl: Duration::from_secs(env_or("INDEX_CACHE_SECONDS", 20)?),
            media_root: PathBuf::from(env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".into())),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET not set")?,
            session_ttl_hours: env_or("SESSION_TTL_HOURS", 24 * 14)?,
            cookie_secure: env_or("COOKIE_SECURE", false)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {key}={raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}

pub fn get_pg_pool() -> Result<Pool> {
    let mut cfg = Config::new();
    cfg.host = Some(env::var("PG_HOST").context("PG_HOST not set")?);
    cfg.user = Some(env::var("PG_USER").context("PG_USER not set")?);
    cfg.password = env::var("PG_PASS").ok();
    cfg.dbname = Some(env::var("PG_DB").context("PG_DB not set")?);
    cfg.port = env::var("PG_PORT").ok().and_then(|p| p.parse().ok());

    let mut pool_cfg = PoolConfig::default();
    pool_cfg.max_size = env_or("PG_POOL_SIZE", 16usize)?;
    cfg.pool = Some(pool_cfg);

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .context("failed to create postgres pool")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!(" Postgres ".parse::<StorageBackend>().unwrap(), StorageBackend::Postgres);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }
}
