//! Firebase Authentication over REST
//!
//! Email/password and Google sign-in go through the identity toolkit API;
//! ID tokens are renewed through the secure-token API using the refresh
//! token, which is also what gets persisted between launches.

use super::{AuthUser, IdentityProvider, SessionStore, StoredSession, TokenSource};
use crate::config::BackendConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

/// Renew the ID token this long before it actually expires
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Token-bearing response of the sign-up / sign-in endpoints
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

/// Response of the secure-token refresh endpoint (snake_case on the wire)
#[derive(Deserialize, Debug)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest {
    post_body: String,
    request_uri: &'static str,
    return_idp_credential: bool,
    return_secure_token: bool,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    user: AuthUser,
    id_token: Option<String>,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl ActiveSession {
    fn token_is_fresh(&self) -> bool {
        self.id_token.is_some()
            && self.expires_at - Duration::seconds(TOKEN_EXPIRY_MARGIN_SECS) > Utc::now()
    }

    fn stored(&self) -> StoredSession {
        StoredSession {
            uid: self.user.uid.clone(),
            email: self.user.email.clone(),
            display_name: self.user.display_name.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

/// Identity provider backed by Firebase Authentication
#[derive(Clone)]
pub struct FirebaseAuth {
    client: reqwest::Client,
    config: BackendConfig,
    sessions: Arc<dyn SessionStore>,
    active: Arc<RwLock<Option<ActiveSession>>>,
}

fn expiry_from(expires_in: Option<&str>) -> DateTime<Utc> {
    let secs = expires_in.and_then(|s| s.parse::<i64>().ok()).unwrap_or(3600);
    Utc::now() + Duration::seconds(secs)
}

/// Turn an identity toolkit error code into a message a user can act on
fn describe_auth_error(code: &str) -> String {
    // Codes may carry detail after " : ", e.g. "WEAK_PASSWORD : Password should be ..."
    let (code, detail) = match code.split_once(" : ") {
        Some((code, detail)) => (code.trim(), Some(detail.trim())),
        None => (code.trim(), None),
    };

    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password.".to_string()
        }
        "EMAIL_EXISTS" => "An account already exists for this email address.".to_string(),
        "INVALID_EMAIL" => "The email address is badly formatted.".to_string(),
        "WEAK_PASSWORD" => detail
            .unwrap_or("Password should be at least 6 characters.")
            .to_string(),
        "USER_DISABLED" => "This account has been disabled.".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            "Too many unsuccessful attempts. Please try again later.".to_string()
        }
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => {
            "Your session has expired. Please sign in again.".to_string()
        }
        "INVALID_IDP_RESPONSE" => "Google Sign-In failed: the credential was rejected.".to_string(),
        "" => "An unknown authentication error occurred.".to_string(),
        other => format!("Authentication failed: {}", other),
    }
}

impl FirebaseAuth {
    pub fn new(client: reqwest::Client, config: BackendConfig, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            config,
            sessions,
            active: Arc::new(RwLock::new(None)),
        }
    }

    fn read_active(&self) -> Option<ActiveSession> {
        match self.active.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_active(&self, session: Option<ActiveSession>) {
        match self.active.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }

    fn require_api_key(&self) -> Result<&str> {
        if self.config.api_key.trim().is_empty() {
            return Err(AppError::Auth(
                "Sign-in is not configured correctly in the app (API key missing).".to_string(),
            ));
        }
        Ok(&self.config.api_key)
    }

    /// Map a failed identity request to an authentication error
    async fn auth_error(response: reqwest::Response) -> AppError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => AppError::Auth(describe_auth_error(&envelope.error.message)),
            Err(_) => AppError::Remote {
                service: "Identity provider",
                status,
                message: text,
            },
        }
    }

    async fn accounts_call<B: Serialize + ?Sized>(&self, method: &str, body: &B) -> Result<AuthUser> {
        let key = self.require_api_key()?;
        let url = format!(
            "{}/accounts:{}",
            self.config.identity_toolkit_url.trim_end_matches('/'),
            method
        );

        let response = self
            .client
            .post(url)
            .query(&[("key", key)])
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::auth_error(response).await);
        }

        let signed_in: SignInResponse = response.json().await?;
        let session = ActiveSession {
            user: AuthUser {
                uid: signed_in.local_id,
                email: signed_in.email,
                display_name: signed_in.display_name,
            },
            expires_at: expiry_from(signed_in.expires_in.as_deref()),
            id_token: Some(signed_in.id_token),
            refresh_token: signed_in.refresh_token,
        };

        if let Err(e) = self.sessions.save(&session.stored()) {
            tracing::warn!("Failed to persist session: {}", e);
        }

        let user = session.user.clone();
        self.set_active(Some(session));
        Ok(user)
    }

    /// Exchange a refresh token for a fresh ID token
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let key = self.require_api_key()?;
        let url = format!("{}/token", self.config.secure_token_url.trim_end_matches('/'));

        let response = self
            .client
            .post(url)
            .query(&[("key", key)])
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::auth_error(response).await);
        }

        Ok(response.json().await?)
    }

    async fn renew(&self, mut session: ActiveSession) -> Result<ActiveSession> {
        let refreshed = self.refresh(&session.refresh_token).await?;

        session.id_token = Some(refreshed.id_token);
        session.expires_at = expiry_from(refreshed.expires_in.as_deref());
        if refreshed.refresh_token != session.refresh_token {
            session.refresh_token = refreshed.refresh_token;
            if let Err(e) = self.sessions.save(&session.stored()) {
                tracing::warn!("Failed to persist rotated refresh token: {}", e);
            }
        }

        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        tracing::info!("Creating account for {}", email);
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.accounts_call("signUp", &body).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        tracing::info!("Signing in {}", email);
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        self.accounts_call("signInWithPassword", &body).await
    }

    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser> {
        tracing::info!("Signing in with Google credential");
        let body = IdpRequest {
            post_body: format!("id_token={}&providerId=google.com", id_token),
            request_uri: "http://localhost",
            return_idp_credential: true,
            return_secure_token: true,
        };
        self.accounts_call("signInWithIdp", &body).await
    }

    async fn restore_session(&self) -> Result<Option<AuthUser>> {
        let Some(stored) = self.sessions.load()? else {
            tracing::debug!("No stored session");
            return Ok(None);
        };

        let session = ActiveSession {
            user: AuthUser {
                uid: stored.uid,
                email: stored.email,
                display_name: stored.display_name,
            },
            id_token: None,
            refresh_token: stored.refresh_token,
            expires_at: Utc::now(),
        };

        let session = match self.renew(session.clone()).await {
            Ok(renewed) => renewed,
            // Offline: keep the session, the token is fetched again on first use
            Err(AppError::Http(e)) => {
                tracing::warn!("Could not refresh stored session, continuing offline: {}", e);
                session
            }
            Err(e) => {
                tracing::warn!("Stored session rejected, signing out: {}", e);
                self.sessions.clear()?;
                return Ok(None);
            }
        };

        tracing::info!("Restored session for {}", session.user.uid);
        let user = session.user.clone();
        self.set_active(Some(session));
        Ok(Some(user))
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.read_active().map(|s| s.user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.set_active(None);
        self.sessions.clear()?;
        tracing::info!("Signed out");
        Ok(())
    }
}

#[async_trait]
impl TokenSource for FirebaseAuth {
    async fn id_token(&self) -> Result<Option<String>> {
        let Some(session) = self.read_active() else {
            return Ok(None);
        };

        if session.token_is_fresh() {
            return Ok(session.id_token);
        }

        let renewed = self.renew(session).await?;
        let token = renewed.id_token.clone();
        self.set_active(Some(renewed));
        Ok(token)
    }
}
