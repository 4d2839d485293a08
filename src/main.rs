use std::sync::Arc;

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use product_catalog::{
    db::postgres::create_pool,
    graceful_shutdown::shutdown_signal,
    middlewares::cors::cors,
    repositories::{
        memory::MemoryProductRepo,
        product::ProductRepository,
        sqlx_repo::SqlxProductRepo,
    },
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let product_repo: Arc<dyn ProductRepository> = if config.uses_database() {
        match create_pool(&config.database_url).await {
            Ok(pool) => Arc::new(SqlxProductRepo::new(pool)),
            Err(e) => {
                tracing::error!("Database startup failed: {:#}", e);
                std::process::exit(1);
            }
        }
    } else {
        tracing::warn!("No database configured, products are kept in memory");
        Arc::new(MemoryProductRepo::new())
    };

    let app_state = web::Data::new(AppState::new(&config, product_repo));

    app_state.product_handler.uploads.ensure_dir().await?;

    let server_addr = config.server_addr();
    let client_origin = config.client_origin.clone();
    let upload_limit = config.max_upload_bytes;

    tracing::info!(
        "🚀 Starting {} v{} on {}",
        config.name,
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(cors(&client_origin))
            .wrap(NormalizePath::trim())
            .wrap(TracingLogger::default())
            .configure(|cfg| configure_routes(cfg, upload_limit))
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}

/// Human-readable logs by default, JSON lines when `APP_ENV=production`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let production = std::env::var("APP_ENV")
        .map(|v| v.eq_ignore_ascii_case("production"))
        .unwrap_or(false);

    if production {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
