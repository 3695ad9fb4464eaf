// src/services/auth.rs

//! Password authentication against the hosted auth service (GoTrue API).
//!
//! The current session is published on a [`watch`] channel so callers can
//! react to sign-in, refresh and sign-out, and persisted through a
//! [`SessionStore`] so it survives between CLI runs.

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Response};
use serde::Deserialize;
use tokio::sync::watch;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{AuthUser, Config, Session};
use crate::storage::SessionStore;
use crate::utils::http::{create_async_client, error_message};

/// Sessions closer than this to expiry are refreshed before use.
const EXPIRY_SKEW_SECS: i64 = 60;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in.unwrap_or(3600)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// What a sign-up produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// Email confirmation is disabled; the user is signed in already
    SignedIn(Session),
    /// A confirmation link was sent to this address
    ConfirmationRequired { email: String },
}

/// Client for sign-in, sign-up, refresh and sign-out.
pub struct AuthClient {
    client: Client,
    base: Url,
    anon_key: String,
    store: SessionStore,
    state: watch::Sender<Option<Session>>,
}

impl AuthClient {
    /// Build a client from configuration and restore any stored session.
    pub async fn new(config: &Config) -> Result<Self> {
        let url = config
            .backend
            .url
            .as_deref()
            .ok_or_else(|| AppError::config("backend.url is not set (SUPABASE_URL)"))?;
        let anon_key = config
            .backend
            .anon_key
            .as_deref()
            .ok_or_else(|| AppError::config("backend.anon_key is not set (SUPABASE_ANON_KEY)"))?;
        let client = create_async_client(config.backend.timeout_secs)?;
        let store = SessionStore::new(config.paths.session_file());

        let auth = Self::with_client(client, url, anon_key, store)?;
        auth.restore().await?;
        Ok(auth)
    }

    /// Build a client without touching the session store.
    pub fn with_client(
        client: Client,
        project_url: &str,
        anon_key: &str,
        store: SessionStore,
    ) -> Result<Self> {
        let base = Url::parse(&format!("{}/", project_url.trim_end_matches('/')))?.join("auth/v1/")?;
        let (state, _) = watch::channel(None);
        Ok(Self {
            client,
            base,
            anon_key: anon_key.to_string(),
            store,
            state,
        })
    }

    /// Load the persisted session and publish it.
    ///
    /// An unreadable session file is treated as signed out and removed.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let session = match self.store.load().await {
            Ok(session) => session,
            Err(AppError::Json(e)) => {
                log::warn!(
                    "Discarding unreadable session file {}: {}",
                    self.store.path().display(),
                    e
                );
                self.store.clear().await?;
                None
            }
            Err(e) => return Err(e),
        };
        if let Some(s) = &session {
            log::debug!("Restored session for user {}", s.user.id);
        }
        self.state.send_replace(session.clone());
        Ok(session)
    }

    /// Subscribe to session changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    /// The last known session, without refreshing.
    pub fn session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn validate_credentials(email: &str, password: &str) -> Result<()> {
        let email = email.trim();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(user, domain)| !user.is_empty() && !domain.is_empty());
        if !valid_email {
            return Err(AppError::validation(format!("'{email}' is not an email address")));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AppError::auth(error_message(&body)))
    }

    async fn adopt(&self, session: Session) -> Result<Session> {
        self.store.save(&session).await?;
        self.state.send_replace(Some(session.clone()));
        Ok(session)
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        Self::validate_credentials(email, password)?;

        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;
        let token: TokenResponse = Self::check(response).await?.json().await?;

        log::info!("Signed in as {}", email.trim());
        self.adopt(token.into_session()).await
    }

    /// Register a new account.
    ///
    /// `redirect_to` is where the confirmation link should send the user.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome> {
        Self::validate_credentials(email, password)?;

        let mut url = self.endpoint("signup")?;
        if let Some(redirect) = redirect_to {
            url.query_pairs_mut().append_pair("redirect_to", redirect);
        }

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email.trim(), "password": password }))
            .send()
            .await?;
        let value: serde_json::Value = Self::check(response).await?.json().await?;

        if value.get("access_token").is_some() {
            let token: TokenResponse = serde_json::from_value(value)?;
            let session = self.adopt(token.into_session()).await?;
            return Ok(SignUpOutcome::SignedIn(session));
        }

        log::info!("Confirmation email sent to {}", email.trim());
        Ok(SignUpOutcome::ConfirmationRequired {
            email: email.trim().to_string(),
        })
    }

    /// Exchange the refresh token for a new session.
    pub async fn refresh(&self, session: &Session) -> Result<Session> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": session.refresh_token }))
            .send()
            .await?;
        let token: TokenResponse = Self::check(response).await?.json().await?;

        log::debug!("Refreshed session for user {}", session.user.id);
        self.adopt(token.into_session()).await
    }

    /// A usable session, refreshing it when close to expiry.
    ///
    /// A session that cannot be refreshed is discarded.
    pub async fn current_session(&self) -> Result<Option<Session>> {
        let Some(session) = self.session() else {
            return Ok(None);
        };
        if !session.is_expired(Duration::seconds(EXPIRY_SKEW_SECS)) {
            return Ok(Some(session));
        }

        match self.refresh(&session).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(e) => {
                log::warn!("Session refresh failed, signing out locally: {}", e);
                self.clear_local().await?;
                Ok(None)
            }
        }
    }

    /// Like [`AuthClient::current_session`] but fails when signed out.
    pub async fn require_session(&self) -> Result<Session> {
        self.current_session()
            .await?
            .ok_or(AppError::NotAuthenticated)
    }

    /// Fetch the user record behind a session.
    pub async fn user(&self, session: &Session) -> Result<AuthUser> {
        let response = self
            .client
            .get(self.endpoint("user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Revoke the session remotely and forget it locally.
    ///
    /// The local session is cleared even if the remote call fails.
    pub async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.session() {
            let remote = async {
                let response = self
                    .client
                    .post(self.endpoint("logout")?)
                    .header("apikey", &self.anon_key)
                    .bearer_auth(&session.access_token)
                    .send()
                    .await?;
                Self::check(response).await?;
                Ok::<(), AppError>(())
            };
            if let Err(e) = remote.await {
                log::warn!("Remote sign-out failed: {}", e);
            }
        }
        self.clear_local().await
    }

    async fn clear_local(&self) -> Result<()> {
        self.store.clear().await?;
        self.state.send_replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_validation() {
        assert!(AuthClient::validate_credentials("a@b.co", "secret1").is_ok());
        assert!(AuthClient::validate_credentials("not-an-email", "secret1").is_err());
        assert!(AuthClient::validate_credentials("@b.co", "secret1").is_err());
        assert!(AuthClient::validate_credentials("a@b.co", "12345").is_err());
    }

    #[test]
    fn token_response_prefers_absolute_expiry() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "expires_at": 1_900_000_000,
            "user": {"id": "u1", "email": "a@b.co"}
        }))
        .unwrap();
        let session = token.into_session();
        assert_eq!(session.expires_at.timestamp(), 1_900_000_000);
    }

    #[test]
    fn token_response_falls_back_to_relative_expiry() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 120,
            "user": {"id": "u1"}
        }))
        .unwrap();
        let session = token.into_session();
        assert!(session.expires_at > Utc::now());
        assert!(session.expires_at <= Utc::now() + Duration::seconds(121));
    }

    #[test]
    fn auth_base_url_is_normalized() {
        let client = AuthClient::with_client(
            Client::new(),
            "https://demo.supabase.co/",
            "anon",
            SessionStore::new("unused.json"),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("token").unwrap().as_str(),
            "https://demo.supabase.co/auth/v1/token"
        );
    }
}
