use chrono::{DateTime, Utc};
use reqwest::{Method, Request};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::client::BackendClient;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// The account behind a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUser {
    /// Full name if set, else email, else id.
    pub fn display_name(&self) -> &str {
        self.user_metadata
            .full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Tokens issued on sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix seconds on the wire.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}

/// Result of registering an account. Backends that require email
/// confirmation return the user without a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(Session),
    ConfirmationRequired(AuthUser),
}

impl SignUpOutcome {
    fn from_value(value: serde_json::Value) -> Result<Self> {
        if value.get("access_token").is_some() {
            return Ok(SignUpOutcome::SignedIn(serde_json::from_value(value)?));
        }
        let user = match value.get("user") {
            Some(user) => user.clone(),
            None => value,
        };
        Ok(SignUpOutcome::ConfirmationRequired(serde_json::from_value(user)?))
    }
}

impl BackendClient {
    fn auth_request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let url = self.config().endpoint(&format!("auth/v1/{path}"))?;
        Ok(self.request(method, url))
    }

    fn require_token(&self) -> Result<()> {
        match self.access_token() {
            Some(_) => Ok(()),
            None => Err(Error::Auth("not signed in".into())),
        }
    }

    pub fn sign_in_request(&self, email: &str, password: &str) -> Result<Request> {
        Ok(self
            .auth_request(Method::POST, "token?grant_type=password")?
            .json(&json!({ "email": email.trim(), "password": password }))
            .build()?)
    }

    pub fn refresh_session_request(&self, refresh_token: &str) -> Result<Request> {
        Ok(self
            .auth_request(Method::POST, "token?grant_type=refresh_token")?
            .json(&json!({ "refresh_token": refresh_token }))
            .build()?)
    }

    pub fn sign_up_request(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<Request> {
        let mut body = json!({ "email": email.trim(), "password": password });
        if let Some(name) = full_name.map(str::trim).filter(|n| !n.is_empty()) {
            body["data"] = json!({ "full_name": name });
        }
        Ok(self
            .auth_request(Method::POST, "signup")?
            .json(&body)
            .build()?)
    }

    /// Exchange email and password for a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::Validation("email and password are required".into()));
        }
        let session: Session = self.send_json(self.sign_in_request(email, password)?).await?;
        log::info!("Signed in as {}", session.user.display_name());
        Ok(session)
    }

    /// Trade a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        if refresh_token.is_empty() {
            return Err(Error::Auth("no refresh token".into()));
        }
        let session: Session = self
            .send_json(self.refresh_session_request(refresh_token)?)
            .await?;
        log::debug!("Refreshed session for {}", session.user.display_name());
        Ok(session)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(Error::Validation("email and password are required".into()));
        }
        let value: serde_json::Value = self
            .send_json(self.sign_up_request(email, password, full_name)?)
            .await?;
        SignUpOutcome::from_value(value)
    }

    /// Revoke the current session on the backend.
    pub async fn sign_out(&self) -> Result<()> {
        self.require_token()?;
        let request = self.auth_request(Method::POST, "logout")?.build()?;
        self.send_empty(request).await
    }

    /// The user the current access token belongs to.
    pub async fn current_user(&self) -> Result<AuthUser> {
        self.require_token()?;
        let request = self.auth_request(Method::GET, "user")?.build()?;
        self.send_json(request).await
    }
}
