use super::MutationResponse;
use crate::{
    auth::ExtractAuth,
    error::AppResult,
    models::{Department, NewMember},
    store::members,
    Db,
};
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};

async fn departments(Extension(db): Extension<Db>) -> AppResult<Json<Vec<Department>>> {
    Ok(Json(members::list_departments(&db, None).await?))
}

async fn register(
    Extension(db): Extension<Db>,
    ExtractAuth { identity, .. }: ExtractAuth,
    Json(req): Json<NewMember>,
) -> AppResult<Json<MutationResponse>> {
    let mutation = members::register_member(&db, Some(&identity), req).await?;
    Ok(Json(mutation.into()))
}

pub fn app() -> Router {
    Router::new()
        .route("/departments", get(departments))
        .route("/register", post(register))
}
