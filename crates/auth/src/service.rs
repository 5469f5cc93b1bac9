use crate::error::{AuthError, Result};
use crate::jwt::JwtService;
use crate::password::{PasswordHasher, PasswordPolicy};
use docvault_database::{
    Database, DatabaseError, OrganizationRepository, OrganizationUserRepository, UserRepository,
};
use docvault_models::user::{ChangePassword, NewUser, UpdateUser, UserProfile};
use docvault_models::{OrganizationRole, OrganizationType, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub type RegisterRequest = NewUser;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

pub struct AuthService {
    pub db: Database,
    pub jwt: JwtService,
    passwords: PasswordHasher,
    user_repo: UserRepository,
    org_repo: OrganizationRepository,
    member_repo: OrganizationUserRepository,
}

impl AuthService {
    pub fn new(db: Database, jwt: JwtService) -> Self {
        let pool = db.pool().clone();

        Self {
            db,
            jwt,
            passwords: PasswordHasher::default(),
            user_repo: UserRepository::new(pool.clone()),
            org_repo: OrganizationRepository::new(pool.clone()),
            member_repo: OrganizationUserRepository::new(pool),
        }
    }

    pub fn with_password_policy(mut self, policy: PasswordPolicy) -> Self {
        self.passwords = PasswordHasher::new(policy);
        self
    }

    /// Register a new user together with their personal organization
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        request.validate()?;

        let email = request.email.trim().to_lowercase();
        if self.user_repo.email_exists(&email, None).await? {
            return Err(AuthError::AlreadyExists(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = self.passwords.hash(&request.password)?;

        let mut tx = self.db.begin().await?;

        let user = self
            .user_repo
            .create(
                &mut *tx,
                &email,
                &password_hash,
                request.first_name.as_deref(),
                request.last_name.as_deref(),
            )
            .await?;

        let workspace_name = personal_workspace_name(&user);
        let organization = self
            .org_repo
            .create(
                &mut *tx,
                &workspace_name,
                None,
                OrganizationType::Individual,
                user.id,
            )
            .await?;

        self.member_repo
            .add(
                &mut *tx,
                organization.id,
                user.id,
                OrganizationRole::Owner,
                true,
                None,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user.id,
            organization_id = %organization.id,
            "User registered with personal organization"
        );

        self.issue_tokens(user)
    }

    /// Login with email and password
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        request.validate().map_err(|_| AuthError::InvalidCredentials)?;

        let user = self
            .user_repo
            .find_by_email(request.email.trim())
            .await
            .map_err(|e| missing_user_as(e, AuthError::InvalidCredentials))?;

        if !self.passwords.verify(&request.password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        // Same answer as a wrong password so inactive accounts look like unknown ones
        if !user.is_active {
            tracing::warn!(user_id = %user.id, "Login rejected: account inactive");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        self.issue_tokens(user)
    }

    /// Exchange a refresh token for a new token pair
    pub async fn refresh(&self, request: RefreshTokenRequest) -> Result<AuthResponse> {
        let claims = self.jwt.validate_refresh_token(&request.refresh_token)?;
        let user_id = claims.user_id()?;

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| {
                missing_user_as(e, AuthError::InvalidToken("User no longer exists".to_string()))
            })?;

        if !user.is_active {
            return Err(AuthError::UserInactive);
        }

        self.issue_tokens(user)
    }

    /// Profile of the authenticated user
    pub async fn me(&self, user_id: Uuid) -> Result<UserProfile> {
        let user = self.user_repo.find_by_id(user_id).await?;
        Ok(user.into())
    }

    /// Update name and email of the authenticated user
    pub async fn update_profile(&self, user_id: Uuid, mut update: UpdateUser) -> Result<UserProfile> {
        check_profile_update(&update)?;

        if let Some(email) = update.email.as_mut() {
            *email = email.trim().to_lowercase();
            if self.user_repo.email_exists(email, Some(user_id)).await? {
                return Err(AuthError::AlreadyExists(
                    "An account with this email already exists".to_string(),
                ));
            }
        }

        let user = self.user_repo.update(user_id, &update).await?;
        Ok(user.into())
    }

    /// Change password after re-checking the current one
    pub async fn change_password(&self, user_id: Uuid, request: ChangePassword) -> Result<()> {
        request.validate()?;

        let user = self.user_repo.find_by_id(user_id).await?;

        if !self.passwords.verify(&request.current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = self.passwords.hash(&request.new_password)?;
        self.user_repo.update_password(user_id, &password_hash).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    fn issue_tokens(&self, user: User) -> Result<AuthResponse> {
        let access_token = self.jwt.generate_access_token(user.id, &user.email)?;
        let refresh_token = self.jwt.generate_refresh_token(user.id, &user.email)?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_token_ttl(),
            user: user.into(),
        })
    }
}

/// A lookup miss becomes `missing`; outages still surface as database errors
fn missing_user_as(err: DatabaseError, missing: AuthError) -> AuthError {
    if err.is_not_found() {
        missing
    } else {
        err.into()
    }
}

fn check_profile_update(update: &UpdateUser) -> Result<()> {
    update.validate()?;
    if update.is_empty() {
        return Err(AuthError::ValidationError("No fields to update".to_string()));
    }
    Ok(())
}

/// Name of the individual organization created at registration
pub fn personal_workspace_name(user: &User) -> String {
    let name = user.first_name.clone().unwrap_or_else(|| user.display_name());
    format!("{}'s workspace", name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(first_name: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "sam.lee@example.com".to_string(),
            password_hash: String::new(),
            first_name: first_name.map(str::to_string),
            last_name: Some("Lee".to_string()),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_personal_workspace_name() {
        assert_eq!(personal_workspace_name(&user(Some("Sam"))), "Sam's workspace");
        assert_eq!(personal_workspace_name(&user(None)), "sam.lee's workspace");
    }

    #[test]
    fn test_login_request_validation() {
        let request = LoginRequest {
            email: "not-an-email".to_string(),
            password: "x".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_only_missing_users_become_auth_failures() {
        let err = missing_user_as(
            DatabaseError::not_found("User", "x"),
            AuthError::InvalidCredentials,
        );
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = missing_user_as(
            DatabaseError::Other("pool timed out".to_string()),
            AuthError::InvalidCredentials,
        );
        assert!(matches!(err, AuthError::DatabaseError(_)));
    }

    #[test]
    fn test_empty_profile_update_rejected() {
        let empty = UpdateUser {
            email: None,
            first_name: None,
            last_name: None,
        };
        assert!(matches!(
            check_profile_update(&empty),
            Err(AuthError::ValidationError(_))
        ));

        let rename = UpdateUser {
            first_name: Some("Sam".to_string()),
            ..empty
        };
        assert!(check_profile_update(&rename).is_ok());
    }
}
