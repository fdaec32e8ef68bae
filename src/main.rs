use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use log::{info, warn};

use postboard::config::{self, AppConfig, StorageBackend};
use postboard::middleware::error_pages::error_pages;
use postboard::repositories::memory::MemoryRepository;
use postboard::repositories::postgres::PgRepository;
use postboard::repositories::Repository;
use postboard::services::auth_services::AuthService;
use postboard::{handlers, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()?;

    let repo: Arc<dyn Repository> = match config.storage {
        StorageBackend::Postgres => {
            let pool = config::get_pg_pool()?;
            let repo = PgRepository::new(pool);
            repo.migrate().await.context("failed to apply migrations")?;
            Arc::new(repo)
        }
        StorageBackend::Memory => {
            warn!("STORAGE=memory: all data is lost on restart");
            Arc::new(MemoryRepository::new())
        }
    };

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("failed to create media root {}", config.media_root.display()))?;

    let state = web::Data::new(AppState::new(repo, &config));
    let auth_data = web::Data::new(AuthService::new(&config));

    info!(
        "Starting server on 0.0.0.0:{} ({:?} storage, {} posts per page, media in {})",
        config.port,
        config.storage,
        config.posts_per_page,
        config.media_root.display()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(error_pages())
            .wrap(Logger::default())
            .app_data(state.clone())
            .app_data(auth_data.clone())
            .configure(handlers::configure)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await?;

    Ok(())
}
