use axum::{http::Method, Extension};
use club_registry::{auth::SessionStore, config::Config, connect_to_db};
use envconfig::Envconfig;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "club_registry=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::init_from_env()?;
    let db = connect_to_db(config.credentials())?;
    let sessions = SessionStore::new(config.session_ttl());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_origin(Any);
    let app = club_registry::app()
        .layer(Extension(db))
        .layer(Extension(sessions))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    tracing::info!(%addr, "listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
