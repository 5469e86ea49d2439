//! # Parley Chats Crate
//!
//! Pairwise chats between two users and the ordered message log inside each chat.
//!
//! ## Architecture
//!
//! - **Repositories**: `ChatRepo` / `MessageRepo` seams over the sqlite store, plus an
//!   in-memory store for tests
//! - **Services**: [`ConversationService`], which owns get-or-create, summaries and
//!   membership scoping
//! - **Types**: errors and the response shapes handed to the HTTP layer
//! - **Utils**: identifier and message body validation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parley_chats::ConversationService;
//!
//! let service = ConversationService::new(pool, Duration::from_secs(5));
//! let chat = service.get_or_create_chat(&user_id, &participant_id).await?;
//! ```

pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;

pub use repositories::{ChatRepo, MessageRepo, MockChatStore};
pub use services::ConversationService;
pub use types::{ChatError, ChatResult, ChatSummary, LastMessage, MessageWithSender};
