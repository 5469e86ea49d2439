//! In-memory user repository used by service and HTTP tests

use parley_database::{
    new_id, timestamp_now, ExternalIdentity, StoreError, StoreResult, User, UserProfile,
};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock user repository for testing.
///
/// Users are kept in insertion order; clones share the same storage.
#[derive(Clone, Default)]
pub struct MockUserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn find_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == user_id).cloned())
    }

    pub async fn find_profiles(&self, ids: &[String]) -> StoreResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(User::profile)
            .collect())
    }

    pub async fn list_excluding(&self, user_id: &str) -> StoreResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .rev()
            .filter(|u| u.id != user_id)
            .map(User::profile)
            .collect())
    }

    pub async fn upsert_identity(&self, identity: &ExternalIdentity) -> StoreResult<User> {
        let identity = identity.normalized();
        let avatar = identity.avatar.clone().unwrap_or_default();
        let now = timestamp_now();
        let mut users = self.users.write().await;

        let email_taken = users
            .iter()
            .any(|u| u.email == identity.email && u.external_id != identity.external_id);
        if email_taken {
            return Err(StoreError::Duplicate { field: "email" });
        }

        if let Some(user) = users
            .iter_mut()
            .find(|u| u.external_id == identity.external_id)
        {
            user.name = identity.name;
            user.email = identity.email;
            user.avatar = avatar;
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: new_id(),
            external_id: identity.external_id,
            name: identity.name,
            email: identity.email,
            avatar,
            created_at: now.clone(),
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }
}
