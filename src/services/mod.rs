pub mod auth_services;
pub mod feed_services;
pub mod media;
pub mod page_cache;
pub mod paginator;
