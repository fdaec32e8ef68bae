pub mod auth_extractor;
pub mod error_pages;
