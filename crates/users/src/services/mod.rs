//! Business logic for the user directory.

pub mod mock_repositories;
pub mod user_service;

pub use mock_repositories::MockUserRepository;
pub use user_service::{UserRepo, UserService};
