use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::auth::password::verify_password;
use crate::auth::{
    AuthError, AuthResponse, JwtService, LoginRequest, MessageResponse, RateLimiter,
    RegisterRequest, UserInfo, UserRole, UserSession,
};
use crate::models::{CreateUser, User};
use crate::services::UserService;

/// Failed-login budget per email address and client address
const LOGIN_ATTEMPTS: usize = 10;
const LOGIN_WINDOW_SECS: u64 = 300;

fn login_key(email: &str, client_ip: Option<IpAddr>) -> String {
    match client_ip {
        Some(ip) => format!("{}|{}", email, ip),
        None => format!("{}|unknown", email),
    }
}

#[derive(Debug, Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    users: UserService,
    login_limiter: RateLimiter,
    db: PgPool,
}

impl AuthService {
    pub fn new(db: PgPool, jwt_secret: &str, session_ttl: Duration) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret, session_ttl),
            users: UserService::new(db.clone()),
            login_limiter: RateLimiter::new(
                LOGIN_ATTEMPTS,
                std::time::Duration::from_secs(LOGIN_WINDOW_SECS),
            ),
            db,
        }
    }

    /// Register a new account; clients get an (inactive) client profile
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let role = request.role.unwrap_or(UserRole::Client);
        if !role.self_assignable() {
            return Err(AuthError::RoleNotAllowed(role.as_str().to_string()));
        }

        let user = self
            .users
            .create_user(CreateUser {
                email: request.email,
                name: request.name,
                password: request.password,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = role.as_str(), "user registered");
        self.issue_session(&user)
    }

    /// Checks credentials. Failures count against the caller's budget for
    /// this email; a success clears it.
    pub async fn login(
        &self,
        request: LoginRequest,
        client_ip: Option<IpAddr>,
    ) -> Result<AuthResponse, AuthError> {
        let email = request.email.trim().to_lowercase();
        let key = login_key(&email, client_ip);
        if self.login_limiter.is_limited(&key) {
            tracing::warn!(%email, client_ip = ?client_ip, "login rate limited");
            return Err(AuthError::RateLimitExceeded);
        }

        let user = match self.users.find_by_email(&email).await? {
            Some(user) if verify_password(&request.password, &user.password_hash)? => user,
            _ => {
                self.login_limiter.record_failure(&key);
                return Err(AuthError::InvalidCredentials);
            }
        };

        self.login_limiter.reset(&key);
        self.issue_session(&user)
    }

    /// Blacklists the session's token until it would have expired anyway
    pub async fn logout(&self, session: &UserSession) -> Result<MessageResponse, AuthError> {
        let expires_at = DateTime::<Utc>::from_timestamp(session.expires_at as i64, 0)
            .ok_or(AuthError::InvalidToken)?;

        sqlx::query(
            "INSERT INTO token_blacklist (jti, expires_at) VALUES ($1, $2)
             ON CONFLICT (jti) DO NOTHING",
        )
        .bind(&session.jti)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(MessageResponse {
            message: "Successfully logged out".to_string(),
        })
    }

    pub async fn is_token_blacklisted(&self, jti: &str) -> Result<bool, AuthError> {
        let result = sqlx::query("SELECT 1 FROM token_blacklist WHERE jti = $1 AND expires_at > NOW()")
            .bind(jti)
            .fetch_optional(&self.db)
            .await?;

        Ok(result.is_some())
    }

    /// Validate user session from token
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let session = self.jwt_service.extract_user_session(token)?;

        if self.is_token_blacklisted(&session.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        Ok(session)
    }

    /// Current account as stored, not as remembered by the token
    pub async fn current_user(&self, session: &UserSession) -> Result<UserInfo, AuthError> {
        let user = self
            .users
            .get_user(session.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        Ok(user.info())
    }

    fn issue_session(&self, user: &User) -> Result<AuthResponse, AuthError> {
        let access_token = self
            .jwt_service
            .create_session_token(user.id, &user.email, &user.name, user.role)?;

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.session_expires_in_seconds(),
            user: user.info(),
        })
    }
}
