use crate::{
    auth::MaybeAuth,
    error::AppResult,
    models::{ChangeLogEntry, Totals},
    store::dashboard,
    Db,
};
use axum::{extract::Query, routing::get, Extension, Json, Router};
use serde::Deserialize;

#[derive(Deserialize)]
struct ChangesQuery {
    limit: Option<u32>,
}

async fn totals(
    Extension(db): Extension<Db>,
    MaybeAuth(identity): MaybeAuth,
) -> AppResult<Json<Totals>> {
    Ok(Json(dashboard::totals(&db, identity.map(|i| i.role)).await?))
}

async fn changes(
    Extension(db): Extension<Db>,
    MaybeAuth(identity): MaybeAuth,
    Query(query): Query<ChangesQuery>,
) -> AppResult<Json<Vec<ChangeLogEntry>>> {
    Ok(Json(
        dashboard::recent_changes(&db, identity.map(|i| i.role), query.limit).await?,
    ))
}

pub fn app() -> Router {
    Router::new()
        .route("/totals", get(totals))
        .route("/changes", get(changes))
}
