use crate::{error::AppResult, executor::Mutation, store, Db};
use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;

pub mod auth;
pub mod club;
pub mod dashboard;
pub mod event;
pub mod member;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub rows_affected: usize,
}

impl From<Mutation> for MutationResponse {
    fn from(mutation: Mutation) -> Self {
        Self {
            rows_affected: mutation.rows_affected(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    database: String,
}

async fn health(Extension(db): Extension<Db>) -> AppResult<Json<HealthResponse>> {
    let database = store::dashboard::ping(&db).await?;
    Ok(Json(HealthResponse { database }))
}

pub fn app() -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::app())
        .nest("/club", club::app())
        .nest("/event", event::app())
        .nest("/member", member::app())
        .nest("/dashboard", dashboard::app())
}
