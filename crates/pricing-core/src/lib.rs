//! Core library for pricing-admin.
//!
//! Talks to the pricing catalog REST API: authentication, product CRUD and
//! the session-aware gateway every call goes through. Front ends (the
//! `pricing-admin` CLI) build on [`auth::AuthState`] and
//! [`catalog::ProductCatalog`].

pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiError, Gateway, SessionEvent};
pub use config::Config;
