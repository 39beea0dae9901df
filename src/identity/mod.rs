//! Identity collaborator.
//!
//! Registration and password checks live outside this service. The core only
//! needs a way to turn a session token into a [`UserRef`], and every core
//! operation receives that reference explicitly.

// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::{AuctionError, Result};
use crate::query::queries;
use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::debug;
// endregion: --- Imports

// region:    --- UserRef
/// Opaque user reference. Only equality is meaningful to the core.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserRef(pub i64);

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}
// endregion: --- UserRef

// region:    --- Identity Store
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn current_user(&self, session: &str) -> Result<Option<UserRef>>;
}

pub type SharedIdentityStore = Arc<dyn IdentityStore>;

/// Session table kept in memory. Used by tests and the database-less mode.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    sessions: RwLock<HashMap<String, UserRef>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_session(&self, token: impl Into<String>, user: UserRef) -> Result<()> {
        self.sessions
            .write()
            .map_err(|_| AuctionError::Internal("session lock poisoned".to_string()))?
            .insert(token.into(), user);
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn current_user(&self, session: &str) -> Result<Option<UserRef>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| AuctionError::Internal("session lock poisoned".to_string()))?;
        Ok(sessions.get(session).copied())
    }
}

/// Sessions issued by the external login service, read from `sessions`.
pub struct PostgresIdentityStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresIdentityStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn current_user(&self, session: &str) -> Result<Option<UserRef>> {
        let user = sqlx::query_scalar::<_, UserRef>(queries::GET_SESSION_USER)
            .bind(session)
            .fetch_optional(self.db_manager.pool())
            .await?;
        Ok(user)
    }
}
// endregion: --- Identity Store

// region:    --- Extractor
/// Authenticated caller, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserRef);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    SharedIdentityStore: FromRef<S>,
{
    type Rejection = AuctionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuctionError::AuthenticationRequired)?;

        let identity = SharedIdentityStore::from_ref(state);
        match identity.current_user(token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                debug!("{:<12} --> unknown session token", "Identity");
                Err(AuctionError::AuthenticationRequired)
            }
        }
    }
}

/// Caller that may be anonymous. A missing or unknown session yields `None`;
/// identity store failures are still errors.
#[derive(Debug, Clone, Copy)]
pub struct MaybeUser(pub Option<UserRef>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    SharedIdentityStore: FromRef<S>,
{
    type Rejection = AuctionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(user)) => Ok(MaybeUser(Some(user))),
            Err(AuctionError::AuthenticationRequired) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}
// endregion: --- Extractor
