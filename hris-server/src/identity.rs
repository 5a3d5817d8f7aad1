//! Identity provider (credential verification and account management)
//!
//! Passwords never touch our database. The production implementation talks
//! to a GoTrue-compatible REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account already exists")]
    AlreadyExists,
    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Account as known by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub uid: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
}

/// What the user logs in with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    Email(&'a str),
    Phone(&'a str),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_credentials(
        &self,
        credential: Credential<'_>,
        password: &str,
    ) -> Result<IdentityUser, IdentityError>;

    /// Verify a Google ID token
    async fn verify_id_token(&self, id_token: &str) -> Result<IdentityUser, IdentityError>;

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Result<IdentityUser, IdentityError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), IdentityError>;
}

#[derive(Deserialize)]
struct ProviderUser {
    id: String,
    email: Option<String>,
    phone: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Value,
}

impl From<ProviderUser> for IdentityUser {
    fn from(u: ProviderUser) -> Self {
        let name = u
            .user_metadata
            .get("full_name")
            .or_else(|| u.user_metadata.get("name"))
            .and_then(|v| v.as_str())
            .map(String::from);
        Self {
            uid: u.id,
            email: u.email.filter(|e| !e.is_empty()),
            phone: u.phone.filter(|p| !p.is_empty()),
            name,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    user: ProviderUser,
}

/// GoTrue-compatible REST client
pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoTrueClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<IdentityUser, IdentityError> {
        let resp = self
            .http
            .post(self.url("/token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_client_error() {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Provider(format!("{status}: {text}")));
        }

        let token: TokenResponse = resp.json().await?;
        Ok(token.user.into())
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn verify_credentials(
        &self,
        credential: Credential<'_>,
        password: &str,
    ) -> Result<IdentityUser, IdentityError> {
        let body = match credential {
            Credential::Email(email) => serde_json::json!({ "email": email, "password": password }),
            Credential::Phone(phone) => serde_json::json!({ "phone": phone, "password": password }),
        };
        self.token_grant("password", body).await
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<IdentityUser, IdentityError> {
        let body = serde_json::json!({ "provider": "google", "id_token": id_token });
        self.token_grant("id_token", body).await
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        phone: Option<&str>,
    ) -> Result<IdentityUser, IdentityError> {
        let mut body = serde_json::json!({
            "email": email,
            "password": password,
            "email_confirm": true,
        });
        if let Some(phone) = phone {
            body["phone"] = serde_json::Value::from(phone);
        }

        let resp = self
            .http
            .post(self.url("/admin/users"))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
            || status == reqwest::StatusCode::CONFLICT
        {
            return Err(IdentityError::AlreadyExists);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Provider(format!("{status}: {text}")));
        }

        let user: ProviderUser = resp.json().await?;
        tracing::info!(uid = %user.id, "Identity account created");
        Ok(user.into())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let resp = self
            .http
            .post(self.url("/recover"))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Provider(format!("{status}: {text}")));
        }
        Ok(())
    }

    async fn update_password(&self, uid: &str, new_password: &str) -> Result<(), IdentityError> {
        let resp = self
            .http
            .put(self.url(&format!("/admin/users/{uid}")))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(IdentityError::Provider(format!("{status}: {text}")));
        }
        tracing::info!(uid = uid, "Password updated at identity provider");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_user_conversion() {
        let raw = serde_json::json!({
            "id": "uid-1",
            "email": "ani@example.com",
            "phone": "",
            "user_metadata": { "full_name": "Ani Lestari" }
        });
        let user: IdentityUser = serde_json::from_value::<ProviderUser>(raw).unwrap().into();
        assert_eq!(user.uid, "uid-1");
        assert_eq!(user.email.as_deref(), Some("ani@example.com"));
        assert_eq!(user.phone, None);
        assert_eq!(user.name.as_deref(), Some("Ani Lestari"));
    }

    #[test]
    fn test_provider_user_without_metadata() {
        let raw = serde_json::json!({ "id": "uid-2", "email": null, "phone": "+628123" });
        let user: IdentityUser = serde_json::from_value::<ProviderUser>(raw).unwrap().into();
        assert_eq!(user.email, None);
        assert_eq!(user.phone.as_deref(), Some("+628123"));
        assert_eq!(user.name, None);
    }
}
