use crate::{
    auth::{self, ExtractAuth, Identity, SessionStore},
    error::{AppError, AppResult},
    Db,
};
use axum::{
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    pub token: String,
    #[serde(flatten)]
    pub identity: Identity,
}

async fn login(
    Extension(db): Extension<Db>,
    Extension(sessions): Extension<SessionStore>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let identity = auth::login(&db, &req.email, &req.password).await?;
    let token = sessions.open(identity.clone()).await;
    Ok(Json(LoginResponse { token, identity }))
}

async fn logout(
    Extension(sessions): Extension<SessionStore>,
    session: ExtractAuth,
) -> AppResult<StatusCode> {
    if !sessions.close(&session.token).await {
        return Err(AppError::from(StatusCode::UNAUTHORIZED, "session already ended"));
    }
    tracing::info!(email = %session.identity.email, "logout");
    Ok(StatusCode::NO_CONTENT)
}

async fn me(ExtractAuth { identity, .. }: ExtractAuth) -> Json<Identity> {
    Json(identity)
}

pub fn app() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}
