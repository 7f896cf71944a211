use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User roles for role-based access control
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Trainer,
    Client,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Trainer => "trainer",
            UserRole::Client => "client",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "trainer" => Some(UserRole::Trainer),
            "client" => Some(UserRole::Client),
            _ => None,
        }
    }

    /// Trainers and admins manage the catalog and assignments
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Trainer)
    }

    /// Roles a visitor may pick for themselves at registration
    pub fn self_assignable(&self) -> bool {
        !matches!(self, UserRole::Admin)
    }
}

/// JWT token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // user id
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,    // used for logout blacklisting
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    pub role: Option<UserRole>, // defaults to Client
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: usize,
    pub user: UserInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Authenticated requester, attached to request extensions by the session middleware
#[derive(Debug, Clone)]
pub struct UserSession {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub jti: String,
    pub expires_at: usize,
}

impl UserSession {
    pub fn from_claims(claims: &Claims) -> Result<Self, uuid::Error> {
        Ok(Self {
            user_id: Uuid::parse_str(&claims.sub)?,
            email: claims.email.clone(),
            name: claims.name.clone(),
            role: claims.role,
            jti: claims.jti.clone(),
            expires_at: claims.exp,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
