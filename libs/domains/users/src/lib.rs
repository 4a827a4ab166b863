//! Users Domain
//!
//! User accounts with a password lifecycle: hashing on create, verification and
//! replacement through the change-password workflow.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, input validation, status mapping
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌──────────────┐
//! │   Service   │ ──▶ │    Hasher    │  ← Argon2id, runs on the blocking pool
//! └──────┬──────┘     └──────────────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Record store (in-memory or MongoDB)
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_users::{
//!     handlers,
//!     password::{Argon2Hasher, HasherConfig},
//!     repository::InMemoryUserRepository,
//!     service::UserService,
//! };
//!
//! let hasher = Argon2Hasher::new(HasherConfig::default()).unwrap();
//! let service = UserService::new(InMemoryUserRepository::new(), hasher);
//!
//! let router: axum::Router = handlers::router(service);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod password;
pub mod repository;
pub mod service;

pub use error::{StoreError, UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{ChangePassword, CreateUser, UpdateUser, User, UserResponse};
pub use self::mongodb::MongoUserRepository;
pub use password::{Argon2Hasher, HasherConfig, PasswordHasher};
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
