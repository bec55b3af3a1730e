//! Demonstration app.
//!
//! Wires a test controller through the request adapter, mounts the root
//! route with its route listing, and answers everything else with a
//! fallback.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod controllers;
pub mod routes;

pub use config::AppConfig;
pub use routes::app_router;
