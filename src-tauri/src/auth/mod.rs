//! Identity provider module
//!
//! Authentication is delegated to a remote identity provider. This module
//! defines the seam the session state holder talks to, the Firebase
//! implementation of it, and where the session survives between launches.

pub mod firebase;
pub mod session_store;

pub use firebase::FirebaseAuth;
pub use session_store::{KeyringSessionStore, MemorySessionStore, SessionStore, StoredSession};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Identity of a signed-in user as issued by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl AuthUser {
    /// Name shown in greetings, falling back to the email address
    pub fn label(&self, fallback: &str) -> String {
        self.display_name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Remote identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new email/password account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Exchange a one-time Google ID token for a session
    async fn sign_in_with_google(&self, id_token: &str) -> Result<AuthUser>;

    /// Bring back the session persisted by a previous launch, if any
    async fn restore_session(&self) -> Result<Option<AuthUser>>;

    fn current_user(&self) -> Option<AuthUser>;

    async fn sign_out(&self) -> Result<()>;
}

/// Bearer token for requests made on behalf of the signed-in user
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn id_token(&self) -> Result<Option<String>>;
}
