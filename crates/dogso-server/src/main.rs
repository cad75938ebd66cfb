mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use dogso_api::auth::{AppState, AppStateInner, Settings};
use dogso_api::router::build_router;
use dogso_api::thumbnail::HttpThumbnails;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dogso_server=debug,dogso_api=debug,dogso_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = dogso_db::Database::open(&config.db_path)?;
    for (slug, name) in &config.channels {
        let channel = db.ensure_channel(name, slug, None)?;
        info!("Channel '{}' ready (id {})", channel.slug, channel.id);
    }
    if db.get_channel_by_slug(&config.default_channel)?.is_none() {
        anyhow::bail!(
            "DOGSO_DEFAULT_CHANNEL '{}' does not exist; add it to DOGSO_CHANNELS",
            config.default_channel
        );
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        thumbnails: Arc::new(HttpThumbnails::new(config.thumbnail_timeout)?),
        settings: Settings {
            default_channel: config.default_channel.clone(),
            upload_dir: config.upload_dir.clone(),
            trust_proxy: config.trust_proxy,
        },
    });

    let cors = match &config.frontend_url {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(HeaderValue::from_str(origin)?))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::permissive(),
    };

    let app = build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("DOGSO API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    // Connect info feeds the anonymous-reaction origin.
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
