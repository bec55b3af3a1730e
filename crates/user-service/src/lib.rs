//! User service.
//!
//! A small user directory kept in memory and exposed as three JSON
//! operations:
//!
//! | Operation | Route |
//! |---|---|
//! | `createUser` | `POST /users` |
//! | `getUser` | `GET /users/:id` |
//! | `listUsers` | `GET /users` |
//!
//! The root route reports the store's connection state through
//! [`UserStorePlugin`].

#![doc(html_root_url = "https://docs.rs/user-service/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod plugin;
pub mod routes;
pub mod store;

pub use config::UserServiceConfig;
pub use plugin::UserStorePlugin;
pub use routes::{service_router, SERVICE_NAME};
pub use store::{LocalUserStore, NewUser, User, UserRepository};

/// Service version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
