use chrono::{Duration, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::db::session_repository::SessionRepository;
use crate::db::user_repository::UserRepository;
use crate::errors::AppError;
use crate::models::{AuthResponse, User};

/// Sessions live for 30 days; an expired token behaves like a missing one.
const SESSION_TTL_DAYS: i64 = 30;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    session_repo: SessionRepository,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, session_repo: SessionRepository) -> Self {
        Self { user_repo, session_repo }
    }

    /// Creates an account and opens a session. A duplicate email surfaces as
    /// [`AppError::EmailAlreadyInUse`].
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = validate_email(email)?;
        if password.trim().is_empty() {
            return Err(AppError::EmptyField { field_name: "password".to_string() });
        }

        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::Unexpected(format!("Failed to hash password: {e}")))?;

        let user = self
            .user_repo
            .insert(&Uuid::new_v4().to_string(), &email, &hash)
            .await?;

        self.open_session(user).await
    }

    /// Verifies credentials and opens a session. Unknown email and wrong
    /// password are deliberately indistinguishable.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let email = validate_email(email)?;

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let matches = bcrypt::verify(password, &user.password_hash)
            .map_err(|e| AppError::Unexpected(format!("Failed to verify password: {e}")))?;
        if !matches {
            return Err(AppError::InvalidCredentials);
        }

        self.open_session(user).await
    }

    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        self.session_repo.delete(token).await
    }

    /// Resolves a bearer token to its user, or [`AppError::Unauthorized`].
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        self.session_repo
            .find_user_by_token(token)
            .await?
            .ok_or_else(|| {
                warn!("Rejected missing or expired session token");
                AppError::Unauthorized
            })
    }

    async fn open_session(&self, user: User) -> Result<AuthResponse, AppError> {
        let token = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        self.session_repo.insert(&token, &user.id, expires_at).await?;
        Ok(AuthResponse { token, user })
    }
}

/// Trims and lightly validates an email address. Full RFC validation is the
/// mail server's problem; this only rejects obviously broken input.
fn validate_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::EmptyField { field_name: "email".to_string() });
    }
    if !email.contains('@') {
        return Err(AppError::InvalidEmail { email });
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(validate_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
    }

    #[test]
    fn blank_email_is_rejected_as_empty_field() {
        assert!(matches!(
            validate_email("   "),
            Err(AppError::EmptyField { field_name }) if field_name == "email"
        ));
    }

    #[test]
    fn email_without_at_sign_is_rejected() {
        assert!(validate_email("not-an-email").is_err());
    }
}
