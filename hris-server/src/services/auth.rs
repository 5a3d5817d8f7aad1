//! Registration, login and session tokens
//!
//! Credentials live at the identity provider. This service maps provider
//! accounts to local users and issues our own access/refresh pairs.

use std::sync::Arc;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    AuthResponse, ChangePasswordRequest, EmployeeStatus, LoginRequest, MeResponse,
    RegisterRequest, User, UserRole,
};
use shared::util::now_millis;
use shared::AppResult;

use super::subscription::{TRIAL_PLAN, trial_subscription};
use crate::auth::jwt::JwtError;
use crate::auth::{JwtService, TokenType};
use crate::db::{EmployeeRepo, RefreshTokenRepo, SubscriptionRepo, UserRepo};
use crate::email::{self, EmailSender};
use crate::error::ServiceResult;
use crate::identity::{Credential, IdentityProvider};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort));
    }
    Ok(())
}

/// How a login identifier is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier<'a> {
    Email(&'a str),
    Phone(&'a str),
    EmployeeCode(&'a str),
}

pub fn classify_identifier(raw: &str) -> Identifier<'_> {
    let value = raw.trim();
    if value.contains('@') {
        Identifier::Email(value)
    } else if value.starts_with('+') || value.starts_with('0') {
        Identifier::Phone(value)
    } else {
        Identifier::EmployeeCode(value)
    }
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::required(field));
    }
    Ok(value.to_string())
}

pub struct AuthService {
    users: Arc<dyn UserRepo>,
    employees: Arc<dyn EmployeeRepo>,
    refresh_tokens: Arc<dyn RefreshTokenRepo>,
    subscriptions: Arc<dyn SubscriptionRepo>,
    identity: Arc<dyn IdentityProvider>,
    email: Arc<dyn EmailSender>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        employees: Arc<dyn EmployeeRepo>,
        refresh_tokens: Arc<dyn RefreshTokenRepo>,
        subscriptions: Arc<dyn SubscriptionRepo>,
        identity: Arc<dyn IdentityProvider>,
        email: Arc<dyn EmailSender>,
        jwt: JwtService,
    ) -> Self {
        Self {
            users,
            employees,
            refresh_tokens,
            subscriptions,
            identity,
            email,
            jwt,
        }
    }

    /// New company admin with a free trial
    pub async fn register(&self, req: RegisterRequest) -> ServiceResult<AuthResponse> {
        let email = required(&req.email, "email")?.to_lowercase();
        let name = required(&req.name, "name")?;
        let company = required(&req.company, "company")?;
        validate_password(&req.password)?;
        if !email.contains('@') {
            return Err(AppError::validation("email is not valid")
                .with_detail("field", "email")
                .into());
        }
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::with_message(
                ErrorCode::AlreadyExists,
                "An account with this email already exists",
            )
            .into());
        }

        let phone = req
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        let account = self
            .identity
            .create_user(&email, &req.password, phone)
            .await?;

        let now = now_millis();
        let user = self
            .users
            .upsert_user(&User {
                id: account.uid,
                email,
                phone: phone.map(str::to_string),
                name,
                company: Some(company.clone()),
                role: UserRole::Admin,
                created_at: now,
                updated_at: now,
            })
            .await?;
        self.start_trial(&user.id).await?;
        tracing::info!(user_id = %user.id, company = %company, "Account registered");

        let welcome = email::welcome(&user.name, &company);
        if let Err(e) = self
            .email
            .send(&user.email, &welcome.subject, &welcome.html)
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to send welcome email");
        }

        self.issue(user).await
    }

    /// Login by email, phone number or employee code
    pub async fn login(&self, req: LoginRequest) -> ServiceResult<AuthResponse> {
        if req.identifier.trim().is_empty() {
            return Err(AppError::required("identifier").into());
        }
        if req.password.is_empty() {
            return Err(AppError::required("password").into());
        }

        let account = match classify_identifier(&req.identifier) {
            Identifier::Email(email) => {
                self.identity
                    .verify_credentials(Credential::Email(email), &req.password)
                    .await?
            }
            Identifier::Phone(phone) => {
                self.identity
                    .verify_credentials(Credential::Phone(phone), &req.password)
                    .await?
            }
            Identifier::EmployeeCode(code) => {
                let email = self.email_for_employee_code(code).await?;
                self.identity
                    .verify_credentials(Credential::Email(&email), &req.password)
                    .await?
            }
        };

        let user = self
            .users
            .find_user(&account.uid)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
        if user.role == UserRole::Employee
            && let Some(employee) = self.employees.find_employee_by_user(&user.id).await?
            && employee.status == EmployeeStatus::Inactive
        {
            return Err(AppError::new(ErrorCode::AccountDisabled).into());
        }

        tracing::info!(user_id = %user.id, role = user.role.as_db(), "User logged in");
        self.issue(user).await
    }

    /// Unknown Google accounts become company admins with a trial
    pub async fn login_with_google(&self, id_token: &str) -> ServiceResult<AuthResponse> {
        let id_token = required(id_token, "id_token")?;
        let account = self.identity.verify_id_token(&id_token).await?;
        let email = account
            .email
            .clone()
            .ok_or_else(AppError::invalid_credentials)?
            .to_lowercase();
        let now = now_millis();

        let user = match self.users.find_user(&account.uid).await? {
            Some(mut user) => {
                user.email = email;
                if let Some(name) = account.name {
                    user.name = name;
                }
                user.updated_at = now;
                self.users.upsert_user(&user).await?
            }
            None => {
                let name = account
                    .name
                    .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
                let user = self
                    .users
                    .upsert_user(&User {
                        id: account.uid,
                        email,
                        phone: account.phone,
                        name,
                        company: None,
                        role: UserRole::Admin,
                        created_at: now,
                        updated_at: now,
                    })
                    .await?;
                self.start_trial(&user.id).await?;
                tracing::info!(user_id = %user.id, "Account created from Google sign-in");
                user
            }
        };

        tracing::info!(user_id = %user.id, "User logged in with Google");
        self.issue(user).await
    }

    /// Rotate a refresh token: the presented one is revoked before a new pair is issued
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<AuthResponse> {
        let claims = self
            .jwt
            .validate_as(refresh_token, TokenType::Refresh)
            .map_err(AppError::from)?;
        if !self.refresh_tokens.revoke_refresh_token(&claims.jti).await? {
            tracing::warn!(user_id = %claims.sub, jti = %claims.jti, "Refresh token reuse or revoked token");
            return Err(AppError::invalid_token("Refresh token has been revoked").into());
        }
        let user = self
            .users
            .find_user(&claims.sub)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
        self.issue(user).await
    }

    pub async fn logout(&self, refresh_token: &str) -> ServiceResult<()> {
        match self.jwt.validate_as(refresh_token, TokenType::Refresh) {
            Ok(claims) => {
                self.refresh_tokens.revoke_refresh_token(&claims.jti).await?;
                tracing::info!(user_id = %claims.sub, "User logged out");
                Ok(())
            }
            // Nothing live left to revoke
            Err(JwtError::ExpiredToken) => Ok(()),
            Err(e) => Err(AppError::from(e).into()),
        }
    }

    /// Always succeeds from the caller's point of view
    pub async fn forgot_password(&self, email: &str) {
        let email = email.trim();
        if email.is_empty() {
            return;
        }
        match self.identity.send_password_reset(email).await {
            Ok(()) => tracing::info!("Password reset email requested"),
            Err(e) => tracing::warn!(error = %e, "Password reset request failed"),
        }
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        req: ChangePasswordRequest,
    ) -> ServiceResult<()> {
        validate_password(&req.new_password)?;
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
        self.identity
            .verify_credentials(Credential::Email(&user.email), &req.old_password)
            .await?;
        self.identity
            .update_password(&user.id, &req.new_password)
            .await?;
        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    pub async fn me(&self, user_id: &str) -> ServiceResult<MeResponse> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
        let employee = self.employees.find_employee_by_user(user_id).await?;
        Ok(MeResponse { user, employee })
    }

    async fn email_for_employee_code(&self, code: &str) -> ServiceResult<String> {
        let user_id = self
            .employees
            .find_employee_by_code(code)
            .await?
            .and_then(|e| e.user_id)
            .ok_or_else(AppError::invalid_credentials)?;
        let user = self
            .users
            .find_user(&user_id)
            .await?
            .ok_or_else(AppError::invalid_credentials)?;
        Ok(user.email)
    }

    async fn start_trial(&self, user_id: &str) -> ServiceResult<()> {
        let plan = self
            .subscriptions
            .find_plan_by_code(TRIAL_PLAN)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::PlanNotFound).with_detail("plan_code", TRIAL_PLAN))?;
        let trial = trial_subscription(user_id, &plan, now_millis());
        self.subscriptions.create_subscription(&trial, None).await?;
        Ok(())
    }

    async fn issue(&self, user: User) -> ServiceResult<AuthResponse> {
        let pair = self
            .jwt
            .issue_pair(&user.id, user.role)
            .map_err(AppError::from)?;
        self.refresh_tokens
            .store_refresh_token(&pair.refresh_jti, &user.id, pair.refresh_expires_at)
            .await?;
        Ok(AuthResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: pair.expires_in,
            user,
        })
    }
}
