use axum::Router;
use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod executor;
pub mod guard;
pub mod models;
pub mod pg;
pub mod profile;
pub mod statement;
pub mod store;
pub mod validate;

#[cfg(test)]
mod mock;

pub type Db = Arc<executor::Executor<pg::RolePools>>;

pub fn connect_to_db(credentials: profile::CredentialTable) -> anyhow::Result<Db> {
    let pools = pg::RolePools::connect(&credentials)?;
    Ok(Arc::new(executor::Executor::new(credentials, pools)))
}

pub fn app() -> Router {
    Router::new().nest("/api", api::app())
}
