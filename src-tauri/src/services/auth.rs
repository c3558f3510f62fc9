//! Session state holder
//!
//! Owns the authentication state shown by the login, sign-up and profile
//! screens, and the role of the signed-in user. Every sign-in path resolves
//! the role before reporting `Authenticated`, so navigation can pick the
//! right dashboard.

use super::roles::{Role, RoleResolver};
use crate::auth::{AuthUser, IdentityProvider};
use crate::error::{AppError, Result};
use crate::navigation::Route;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

const GOOGLE_CLIENT_ID_PLACEHOLDER: &str = "YOUR_WEB_CLIENT_ID.apps.googleusercontent.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AuthState {
    /// Nothing determined yet
    Idle,
    Loading,
    Authenticated { user: AuthUser },
    Unauthenticated,
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginKind {
    Password,
    Administrator,
    Google,
}

fn login_message(kind: LoginKind, role: Role, user: &AuthUser) -> String {
    match (kind, role.is_admin()) {
        (LoginKind::Password, true) => {
            format!("Admin (via regular login) logged in as {}!", user.label("User"))
        }
        (LoginKind::Password, false) => format!("Logged in successfully as {}!", user.label("User")),
        (LoginKind::Administrator, _) => format!("Admin login successful as {}!", user.label("Admin")),
        (LoginKind::Google, true) => format!("Admin (via Google) logged in as {}!", user.label("User")),
        (LoginKind::Google, false) => {
            format!("Logged in successfully with Google as {}!", user.label("User"))
        }
    }
}

struct Session {
    state: AuthState,
    role: Role,
    /// One-shot greeting for the next screen; taken once
    login_message: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    roles: RoleResolver,
    google_web_client_id: String,
    session: Arc<RwLock<Session>>,
}

impl AuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        roles: RoleResolver,
        google_web_client_id: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            roles,
            google_web_client_id: google_web_client_id.into(),
            session: Arc::new(RwLock::new(Session {
                state: AuthState::Idle,
                role: Role::FAIL_CLOSED,
                login_message: None,
            })),
        }
    }

    pub async fn state(&self) -> AuthState {
        self.session.read().await.state.clone()
    }

    pub async fn role(&self) -> Role {
        self.session.read().await.role
    }

    /// Greeting produced by the last successful sign-in, if not yet shown
    pub async fn take_login_message(&self) -> Option<String> {
        self.session.write().await.login_message.take()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.identity.current_user()
    }

    /// Where a signed-in user lands; the login screen otherwise
    pub async fn dashboard_route(&self) -> Route {
        let session = self.session.read().await;
        match session.state {
            AuthState::Authenticated { .. } => Route::dashboard_for(session.role),
            _ => Route::Login,
        }
    }

    async fn set_state(&self, state: AuthState) -> AuthState {
        self.session.write().await.state = state.clone();
        state
    }

    async fn authenticated(&self, user: AuthUser, role: Role, message: Option<String>) -> AuthState {
        let mut session = self.session.write().await;
        session.role = role;
        session.login_message = message;
        session.state = AuthState::Authenticated { user };
        session.state.clone()
    }

    /// Resume a session persisted by an earlier launch.
    ///
    /// The role is resolved before the state becomes `Authenticated`.
    pub async fn initialize(&self) -> AuthState {
        self.set_state(AuthState::Loading).await;

        match self.identity.restore_session().await {
            Ok(Some(user)) => {
                tracing::debug!("Existing session for {}, checking role", user.uid);
                let role = self.roles.resolve(&user.uid).await;
                self.authenticated(user, role, None).await
            }
            Ok(None) => {
                tracing::debug!("No authenticated user");
                self.set_state(AuthState::Unauthenticated).await
            }
            Err(e) => {
                tracing::warn!("Could not restore session: {}", e);
                self.set_state(AuthState::Unauthenticated).await
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthState {
        self.set_state(AuthState::Loading).await;

        match self.identity.sign_up(email, password).await {
            Ok(user) => {
                tracing::info!("Sign up successful for {}", user.uid);
                // New accounts have no profile document, so no administrator rights
                self.authenticated(user, Role::FAIL_CLOSED, None).await
            }
            Err(e) => {
                tracing::error!("Sign up failed: {}", e);
                self.set_state(AuthState::Error {
                    message: e.to_string(),
                })
                .await
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthState {
        self.set_state(AuthState::Loading).await;

        match self.identity.sign_in(email, password).await {
            Ok(user) => self.complete_login(user, LoginKind::Password).await,
            Err(e) => {
                tracing::error!("Login failed: {}", e);
                self.set_state(AuthState::Error {
                    message: e.to_string(),
                })
                .await
            }
        }
    }

    /// Sign in through the administrator form.
    ///
    /// A user whose role does not resolve to administrator is signed out
    /// again and the attempt reported as access denied.
    pub async fn admin_login(&self, email: &str, password: &str) -> AuthState {
        self.set_state(AuthState::Loading).await;

        let user = match self.identity.sign_in(email, password).await {
            Ok(user) => user,
            Err(e) => {
                tracing::error!("Admin login failed: {}", e);
                return self
                    .set_state(AuthState::Error {
                        message: format!("Admin login failed: {}", e),
                    })
                    .await;
            }
        };

        let role = self.roles.resolve(&user.uid).await;
        if !role.is_admin() {
            tracing::warn!("Admin login attempt by non-admin {}, signing out", user.uid);
            if let Err(e) = self.identity.sign_out().await {
                tracing::error!("Sign-out after denied admin login failed: {}", e);
            }

            let mut session = self.session.write().await;
            session.role = Role::FAIL_CLOSED;
            session.state = AuthState::Error {
                message: "Access Denied: Not an authorized administrator.".to_string(),
            };
            return session.state.clone();
        }

        let message = login_message(LoginKind::Administrator, role, &user);
        self.authenticated(user, role, Some(message)).await
    }

    /// Check that Google sign-in can start and hand back the web client id
    /// the presentation layer needs to obtain an ID token.
    pub async fn begin_google_sign_in(&self) -> Result<String> {
        let client_id = self.google_web_client_id.trim();
        if client_id.is_empty() || client_id == GOOGLE_CLIENT_ID_PLACEHOLDER {
            tracing::error!("Google web client id is not configured");
            let message =
                "Google Sign-In is not configured correctly in the app (Web Client ID missing).";
            self.set_state(AuthState::Error {
                message: message.to_string(),
            })
            .await;
            return Err(AppError::Auth(message.to_string()));
        }

        tracing::debug!("Starting Google sign-in");
        Ok(client_id.to_string())
    }

    /// Finish Google sign-in with the ID token the Google flow produced
    pub async fn sign_in_with_google(&self, id_token: Option<&str>) -> AuthState {
        let Some(id_token) = id_token.filter(|t| !t.is_empty()) else {
            return self
                .set_state(AuthState::Error {
                    message: "Google Sign-In: ID token from Google was null.".to_string(),
                })
                .await;
        };

        self.set_state(AuthState::Loading).await;

        match self.identity.sign_in_with_google(id_token).await {
            Ok(user) => self.complete_login(user, LoginKind::Google).await,
            Err(e) => {
                tracing::error!("Google sign-in failed: {}", e);
                self.set_state(AuthState::Error {
                    message: e.to_string(),
                })
                .await
            }
        }
    }

    async fn complete_login(&self, user: AuthUser, kind: LoginKind) -> AuthState {
        tracing::info!("Authenticated {}, checking role", user.uid);
        let role = self.roles.resolve(&user.uid).await;
        let message = login_message(kind, role, &user);
        self.authenticated(user, role, Some(message)).await
    }

    pub async fn logout(&self) -> AuthState {
        if let Err(e) = self.identity.sign_out().await {
            tracing::error!("Sign-out failed: {}", e);
        }

        let mut session = self.session.write().await;
        session.role = Role::FAIL_CLOSED;
        session.login_message = None;
        session.state = AuthState::Unauthenticated;

        tracing::info!("User logged out");
        session.state.clone()
    }
}
