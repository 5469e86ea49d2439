//! User service for directory lookups.

use super::mock_repositories::MockUserRepository;
use crate::types::{UserError, UserResult};
use parley_database::{bounded, ExternalIdentity, StoreResult, User, UserProfile, UserRepository};
use sqlx::SqlitePool;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Service for managing user operations
#[derive(Clone)]
pub struct UserService<R> {
    user_repository: R,
    operation_timeout: Duration,
}

impl UserService<UserRepository> {
    /// Create a new user service instance with real database repository
    pub fn new(pool: SqlitePool, operation_timeout: Duration) -> Self {
        Self::with_repository(UserRepository::new(pool), operation_timeout)
    }
}

impl<R> UserService<R>
where
    R: UserRepo,
{
    pub fn with_repository(user_repository: R, operation_timeout: Duration) -> Self {
        Self {
            user_repository,
            operation_timeout,
        }
    }

    /// Every user except the caller, newest first
    pub async fn list_other_users(&self, user_id: &str) -> UserResult<Vec<UserProfile>> {
        let users = bounded(
            self.operation_timeout,
            self.user_repository.list_excluding(user_id),
        )
        .await?;
        debug!(user_id, count = users.len(), "listed other users");
        Ok(users)
    }

    /// The caller's own profile
    pub async fn profile(&self, user_id: &str) -> UserResult<UserProfile> {
        bounded(self.operation_timeout, self.user_repository.find_by_id(user_id))
            .await?
            .map(|user| user.profile())
            .ok_or(UserError::NotFound)
    }
}

/// Trait for user repositories to allow generic usage
pub trait UserRepo: Send + Sync {
    fn find_by_id(&self, id: &str) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    /// Profiles for the given ids; unknown ids are skipped
    fn find_profiles(
        &self,
        ids: &[String],
    ) -> impl Future<Output = StoreResult<Vec<UserProfile>>> + Send;

    fn list_excluding(
        &self,
        user_id: &str,
    ) -> impl Future<Output = StoreResult<Vec<UserProfile>>> + Send;

    fn upsert_identity(
        &self,
        identity: &ExternalIdentity,
    ) -> impl Future<Output = StoreResult<User>> + Send;
}

impl UserRepo for UserRepository {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.find_by_id(id).await
    }

    async fn find_profiles(&self, ids: &[String]) -> StoreResult<Vec<UserProfile>> {
        self.find_profiles(ids).await
    }

    async fn list_excluding(&self, user_id: &str) -> StoreResult<Vec<UserProfile>> {
        self.list_excluding(user_id).await
    }

    async fn upsert_identity(&self, identity: &ExternalIdentity) -> StoreResult<User> {
        self.upsert_identity(identity).await
    }
}

impl UserRepo for MockUserRepository {
    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.find_by_id(id).await
    }

    async fn find_profiles(&self, ids: &[String]) -> StoreResult<Vec<UserProfile>> {
        self.find_profiles(ids).await
    }

    async fn list_excluding(&self, user_id: &str) -> StoreResult<Vec<UserProfile>> {
        self.list_excluding(user_id).await
    }

    async fn upsert_identity(&self, identity: &ExternalIdentity) -> StoreResult<User> {
        self.upsert_identity(identity).await
    }
}
