//! User entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user profile record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// The public projection of a user shown to other participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
}

/// Verified identity handed over by the external identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl ExternalIdentity {
    /// Trim the free-text fields and lower-case the email.
    pub fn normalized(&self) -> Self {
        Self {
            external_id: self.external_id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            avatar: Some(
                self.avatar
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string(),
            ),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.external_id.trim().is_empty() {
            return Err("external identity reference is required".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err("a valid email is required".to_string());
        }
        Ok(())
    }
}
