use std::sync::Arc;

use parley_auth::Authenticator;
use parley_chats::ConversationService;
use parley_config::AppConfig;
use parley_database::{ChatRepository, MessageRepository, User, UserRepository};
use parley_users::UserService;
use sqlx::SqlitePool;

use crate::ApiError;

pub type Conversations = ConversationService<UserRepository, ChatRepository, MessageRepository>;
pub type Directory = UserService<UserRepository>;

/// The authenticated caller, placed in request extensions by the session middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub user: User,
}

#[derive(Clone)]
pub struct AppState {
    authenticator: Authenticator,
    conversations: Arc<Conversations>,
    users: Arc<Directory>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Self {
        let timeout = config.database.operation_timeout();
        Self::from_parts(
            Authenticator::new(pool.clone(), &config.auth, timeout),
            ConversationService::new(pool.clone(), timeout),
            UserService::new(pool, timeout),
        )
    }

    pub fn from_parts(
        authenticator: Authenticator,
        conversations: Conversations,
        users: Directory,
    ) -> Self {
        Self {
            authenticator,
            conversations: Arc::new(conversations),
            users: Arc::new(users),
        }
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn conversations(&self) -> &Conversations {
        &self.conversations
    }

    pub fn users(&self) -> &Directory {
        &self.users
    }

    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, ApiError> {
        let (user, _) = self
            .authenticator
            .authenticate_token(token)
            .await
            .map_err(ApiError::from)?;

        Ok(CurrentUser {
            id: user.id.clone(),
            user,
        })
    }
}
