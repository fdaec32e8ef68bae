pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod templates;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::repositories::Repository;
use crate::services::media::MediaStorage;
use crate::services::page_cache::PageCache;
use crate::services::paginator::Paginator;

/// Shared by every worker; cloned into each `App`.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub paginator: Paginator,
    pub page_cache: PageCache,
    pub media: MediaStorage,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>, config: &AppConfig) -> Self {
        Self {
            repo,
            paginator: Paginator::new(config.posts_per_page),
            page_cache: PageCache::new(config.index_cache_ttl),
            media: MediaStorage::new(config.media_root.clone()),
        }
    }
}
