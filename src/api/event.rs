use super::MutationResponse;
use crate::{
    auth::{ExtractAuth, MaybeAuth},
    error::AppResult,
    models::{Event, NewEvent},
    store::events,
    Db,
};
use axum::{
    extract::Path,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse {
    event_id: i32,
}

async fn list(
    Extension(db): Extension<Db>,
    MaybeAuth(identity): MaybeAuth,
) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(events::list_events(&db, identity.map(|i| i.role)).await?))
}

async fn upcoming(
    Extension(db): Extension<Db>,
    MaybeAuth(identity): MaybeAuth,
) -> AppResult<Json<Vec<Event>>> {
    Ok(Json(
        events::upcoming_events(&db, identity.map(|i| i.role)).await?,
    ))
}

async fn create(
    Extension(db): Extension<Db>,
    ExtractAuth { identity, .. }: ExtractAuth,
    Json(req): Json<NewEvent>,
) -> AppResult<Json<CreatedResponse>> {
    let event_id = events::create_event(&db, Some(&identity), req).await?;
    Ok(Json(CreatedResponse { event_id }))
}

async fn remove(
    Extension(db): Extension<Db>,
    Path(event_id): Path<i32>,
    ExtractAuth { identity, .. }: ExtractAuth,
) -> AppResult<Json<MutationResponse>> {
    let mutation = events::delete_event(&db, Some(&identity), event_id).await?;
    Ok(Json(mutation.into()))
}

pub fn app() -> Router {
    Router::new()
        .route("/", post(create))
        .route("/list", get(list))
        .route("/upcoming", get(upcoming))
        .route("/:event_id", delete(remove))
}
