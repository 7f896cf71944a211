//! Role scoping shared by every client-facing query.
//!
//! Admins see every client, trainers see the clients currently linked to
//! them, clients see only themselves. Anything outside the caller's scope
//! is reported as not found so the existence of other trainers' clients
//! never leaks.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::{UserRole, UserSession};
use crate::error::{AppError, AppResult};
use crate::models::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    All,
    Trainer(Uuid),
    /// the client's *user* id
    Client(Uuid),
}

impl AccessScope {
    pub fn for_session(session: &UserSession) -> Self {
        match session.role {
            UserRole::Admin => AccessScope::All,
            UserRole::Trainer => AccessScope::Trainer(session.user_id),
            UserRole::Client => AccessScope::Client(session.user_id),
        }
    }

    pub fn permits(&self, client: &Client) -> bool {
        match *self {
            AccessScope::All => true,
            AccessScope::Trainer(trainer_id) => client.is_linked_to(trainer_id),
            AccessScope::Client(user_id) => client.user_id == user_id,
        }
    }

    /// Appends the scope restriction for a `clients` row aliased as `alias`
    pub fn push_filter(&self, query: &mut QueryBuilder<'_, Postgres>, alias: &str) {
        match *self {
            AccessScope::All => {}
            AccessScope::Trainer(trainer_id) => {
                query.push(format!(" AND {}.trainer_id = ", alias));
                query.push_bind(trainer_id);
            }
            AccessScope::Client(user_id) => {
                query.push(format!(" AND {}.user_id = ", alias));
                query.push_bind(user_id);
            }
        }
    }
}

/// Resolves a looked-up client against the caller's scope
pub fn authorize_client(session: &UserSession, client: Option<Client>) -> AppResult<Client> {
    match client {
        Some(client) if AccessScope::for_session(session).permits(&client) => Ok(client),
        _ => Err(AppError::not_found("Client")),
    }
}

pub fn require_staff(session: &UserSession) -> AppResult<()> {
    if session.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

pub fn require_admin(session: &UserSession) -> AppResult<()> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

/// Admins may change anything; trainers only what they created
pub fn can_modify(session: &UserSession, owner: Option<Uuid>) -> bool {
    session.is_admin() || owner == Some(session.user_id)
}

/// Workouts and programs are visible to admins, their creator, or anyone when public
pub fn can_view(session: &UserSession, owner: Uuid, is_public: bool) -> bool {
    session.is_admin() || is_public || owner == session.user_id
}

/// Only clients with an active subscription can start a new program
pub fn ensure_can_receive_program(client: &Client) -> AppResult<()> {
    if client.has_active_subscription() {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Client subscription is not active; programs cannot be assigned".to_string(),
        ))
    }
}
