//! Role resolution
//!
//! A user is an administrator only when their profile document exists and
//! carries the role flag set to true. Anything else, including a failed
//! lookup, resolves to [`Role::FAIL_CLOSED`].

use crate::database::Repository;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    RegularUser,
    Administrator,
}

impl Role {
    /// Role assumed whenever the profile cannot confirm administrator rights
    pub const FAIL_CLOSED: Role = Role::RegularUser;

    pub fn is_admin(self) -> bool {
        self == Role::Administrator
    }
}

#[derive(Clone)]
pub struct RoleResolver {
    repo: Repository,
}

impl RoleResolver {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Look up the role of `uid`. Never fails; errors are logged.
    pub async fn resolve(&self, uid: &str) -> Role {
        match self.repo.get_user_profile(uid).await {
            Ok(Some(profile)) if profile.is_admin_role == Some(true) => {
                tracing::info!("User {} resolved as administrator", uid);
                Role::Administrator
            }
            Ok(Some(_)) => {
                tracing::debug!("User {} has no administrator flag", uid);
                Role::FAIL_CLOSED
            }
            Ok(None) => {
                tracing::warn!("No profile document for {}, assuming regular user", uid);
                Role::FAIL_CLOSED
            }
            Err(e) => {
                tracing::error!("Role lookup failed for {}: {}", uid, e);
                Role::FAIL_CLOSED
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::USERS_COLLECTION;
    use crate::database::{Document, DocumentStore, Fields, MemoryStore, Query};
    use crate::error::{AppError, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn get(&self, _: &str, _: &str) -> Result<Option<Document>> {
            Err(AppError::Remote {
                service: "Document store",
                status: 503,
                message: "unavailable".to_string(),
            })
        }
        async fn create(&self, _: &str, _: Fields, _: &[&str]) -> Result<String> {
            unreachable!()
        }
        async fn update(&self, _: &str, _: &str, _: Fields, _: &[&str]) -> Result<()> {
            unreachable!()
        }
        async fn query(&self, _: &str, _: &Query) -> Result<Vec<Document>> {
            unreachable!()
        }
    }

    async fn resolver_with(profile: Option<serde_json::Value>) -> RoleResolver {
        let store = MemoryStore::new();
        if let Some(profile) = profile {
            store
                .insert(USERS_COLLECTION, "u1", profile.as_object().cloned().unwrap())
                .await;
        }
        RoleResolver::new(Repository::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_admin_flag() {
        let resolver = resolver_with(Some(json!({ "isAdminRole": true }))).await;
        assert_eq!(resolver.resolve("u1").await, Role::Administrator);
    }

    #[tokio::test]
    async fn test_flag_false_or_missing() {
        let resolver = resolver_with(Some(json!({ "isAdminRole": false }))).await;
        assert_eq!(resolver.resolve("u1").await, Role::RegularUser);

        let resolver = resolver_with(Some(json!({ "email": "a@example.org" }))).await;
        assert_eq!(resolver.resolve("u1").await, Role::RegularUser);
    }

    #[tokio::test]
    async fn test_absent_profile_is_fail_closed() {
        let resolver = resolver_with(None).await;
        assert_eq!(resolver.resolve("u1").await, Role::FAIL_CLOSED);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_fail_closed() {
        let resolver = RoleResolver::new(Repository::new(Arc::new(FailingStore)));
        assert_eq!(resolver.resolve("u1").await, Role::FAIL_CLOSED);
        assert!(!Role::FAIL_CLOSED.is_admin());
    }
}
