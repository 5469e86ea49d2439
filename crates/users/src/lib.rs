//! # Parley Users Crate
//!
//! The user directory: profile lookups and the "other users" listing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use parley_users::UserService;
//!
//! let service = UserService::new(pool, Duration::from_secs(5));
//! let others = service.list_other_users(&user_id).await?;
//! ```

pub mod services;
pub mod types;

pub use parley_database::{ExternalIdentity, User, UserProfile, UserRepository};
pub use services::{MockUserRepository, UserRepo, UserService};
pub use types::{UserError, UserResult};
