//! Chat entity definitions

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A two-party chat, stored under its canonical participant pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Chat {
    pub id: String,
    pub participant_low: String,
    pub participant_high: String,
    pub last_message_id: Option<String>,
    pub last_message_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Chat {
    pub fn participants(&self) -> [&str; 2] {
        [&self.participant_low, &self.participant_high]
    }

    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participant_low == user_id || self.participant_high == user_id
    }

    /// The participant that is not `viewer`, or `None` when `viewer` is not in the chat.
    pub fn other_participant(&self, viewer: &str) -> Option<&str> {
        if self.participant_low == viewer {
            Some(&self.participant_high)
        } else if self.participant_high == viewer {
            Some(&self.participant_low)
        } else {
            None
        }
    }

    pub fn pair(&self) -> ParticipantPair {
        ParticipantPair {
            low: self.participant_low.clone(),
            high: self.participant_high.clone(),
        }
    }
}

/// Unordered pair of two distinct users, kept in canonical `(min, max)` order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantPair {
    low: String,
    high: String,
}

impl ParticipantPair {
    /// Returns `None` when both ids are the same user.
    pub fn new(a: &str, b: &str) -> Option<Self> {
        match a.cmp(b) {
            std::cmp::Ordering::Less => Some(Self {
                low: a.to_string(),
                high: b.to_string(),
            }),
            std::cmp::Ordering::Greater => Some(Self {
                low: b.to_string(),
                high: a.to_string(),
            }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> &str {
        &self.low
    }

    pub fn high(&self) -> &str {
        &self.high
    }
}
