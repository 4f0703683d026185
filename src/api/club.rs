use super::MutationResponse;
use crate::{
    auth::{ExtractAuth, MaybeAuth},
    error::AppResult,
    models::{Club, ClubStats, ClubUpdate},
    store::{clubs, dashboard},
    Db,
};
use axum::{
    extract::{Path, Query},
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct ListQuery {
    search: Option<String>,
}

async fn list(
    Extension(db): Extension<Db>,
    MaybeAuth(identity): MaybeAuth,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Club>>> {
    Ok(Json(
        clubs::list_clubs(&db, identity.as_ref(), query.search.as_deref()).await?,
    ))
}

async fn stats(
    Extension(db): Extension<Db>,
    MaybeAuth(identity): MaybeAuth,
) -> AppResult<Json<Vec<ClubStats>>> {
    Ok(Json(
        dashboard::club_stats(&db, identity.map(|i| i.role)).await?,
    ))
}

async fn update(
    Extension(db): Extension<Db>,
    Path(club_name): Path<String>,
    ExtractAuth { identity, .. }: ExtractAuth,
    Json(req): Json<ClubUpdate>,
) -> AppResult<Json<MutationResponse>> {
    let mutation = clubs::update_club(&db, Some(&identity), &club_name, req).await?;
    Ok(Json(mutation.into()))
}

pub fn app() -> Router {
    Router::new()
        .route("/list", get(list))
        .route("/stats", get(stats))
        .route("/:club_name", put(update))
}
