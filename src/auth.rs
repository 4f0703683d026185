use crate::{
    error::{AppError, Failure},
    executor::{Connector, Executor},
    profile::Role,
    statement::Statement,
};
use argon2::Argon2;
use lazy_static::lazy_static;
use axum::{
    async_trait,
    extract::{FromRequest, RequestParts},
    headers::{authorization::Bearer, Authorization},
    http::{header::AUTHORIZATION, StatusCode},
    Extension, TypedHeader,
};
use nanoid::nanoid;
use password_hash::{
    self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

pub fn hash_password(password: impl AsRef<[u8]>) -> password_hash::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_ref(), &salt)
        .map(|h| h.to_string())
}

pub fn verify_password(
    password: impl AsRef<[u8]>,
    password_hash: impl AsRef<str>,
) -> password_hash::Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash.as_ref())?;
    Ok(Argon2::default()
        .verify_password(password.as_ref(), &parsed_hash)
        .is_ok())
}

/// Who is calling. Passed explicitly to every guard and query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub email: String,
    pub role: Role,
}

const INVALID_CREDENTIALS: &str = "invalid email or password";

lazy_static! {
    // Verified against when the email is unknown, so both rejections cost
    // one argon2 run.
    static ref DUMMY_HASH: String = hash_password("club-registry-dummy").unwrap_or_default();
}

/// Checks `email`/`password` against the `users` table. Unknown emails and
/// wrong passwords fail the same way.
pub async fn login<C: Connector>(
    db: &Executor<C>,
    email: &str,
    password: &str,
) -> Result<Identity, Failure> {
    #[derive(Deserialize)]
    struct UserRow {
        password_hash: String,
        role: String,
    }

    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(Failure::auth("please enter both email and password"));
    }

    let user = db
        .read_one::<UserRow>(
            &Statement::new("SELECT password_hash, role FROM users WHERE email = $1").bind(email),
            None,
        )
        .await?;

    let Some(user) = user else {
        let _ = verify_password(password, DUMMY_HASH.as_str());
        tracing::info!(email, "login rejected: unknown email");
        return Err(Failure::auth(INVALID_CREDENTIALS));
    };

    let matches = verify_password(password, &user.password_hash).unwrap_or_else(|e| {
        tracing::warn!(email, error = %e, "stored password hash is unreadable");
        false
    });
    if !matches {
        tracing::info!(email, "login rejected: wrong password");
        return Err(Failure::auth(INVALID_CREDENTIALS));
    }

    let role = Role::parse(&user.role).unwrap_or_else(|| {
        tracing::warn!(email, role = %user.role, "unknown stored role, treating as viewer");
        Role::Viewer
    });
    tracing::info!(email, %role, "login");

    Ok(Identity {
        email: email.to_string(),
        role,
    })
}

/// Live sessions, keyed by an opaque token. Nothing survives a restart.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, (Instant, Identity)>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Starts a session and drops every expired one.
    pub async fn open(&self, identity: Identity) -> String {
        let token = nanoid!();
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, (issued, _)| issued.elapsed() <= self.ttl);
        sessions.insert(token.clone(), (Instant::now(), identity));
        token
    }

    /// Ends a session. Returns whether it existed.
    pub async fn close(&self, token: &str) -> bool {
        self.sessions.lock().await.remove(token).is_some()
    }

    pub async fn current(&self, token: &str) -> Option<Identity> {
        let mut sessions = self.sessions.lock().await;
        let (issued, identity) = sessions.get(token)?;
        if issued.elapsed() > self.ttl {
            sessions.remove(token);
            return None;
        }
        Some(identity.clone())
    }
}

/// A request carrying a live session token.
pub struct ExtractAuth {
    pub identity: Identity,
    pub token: String,
}

#[async_trait]
impl<B: Send> FromRequest<B> for ExtractAuth {
    type Rejection = AppError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request(req)
                .await
                .map_err(|_| AppError::from(StatusCode::UNAUTHORIZED, "missing session token"))?;

        let Extension(sessions) = Extension::<SessionStore>::from_request(req)
            .await
            .map_err(|_| anyhow::anyhow!("session store is not installed"))?;

        let token = bearer.token().to_string();
        let identity = sessions.current(&token).await.ok_or_else(|| {
            AppError::from(StatusCode::UNAUTHORIZED, "session expired or invalid")
        })?;

        Ok(ExtractAuth { identity, token })
    }
}

/// Like [`ExtractAuth`] but lets anonymous requests through. A token that is
/// present but stale is still rejected.
pub struct MaybeAuth(pub Option<Identity>);

#[async_trait]
impl<B: Send> FromRequest<B> for MaybeAuth {
    type Rejection = AppError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        if !req.headers().contains_key(AUTHORIZATION) {
            return Ok(MaybeAuth(None));
        }
        let ExtractAuth { identity, .. } = ExtractAuth::from_request(req).await?;
        Ok(MaybeAuth(Some(identity)))
    }
}
