//! Data models for the pricing catalog API.
//!
//! - `Product`, `NewProduct`, `ProductPatch`: catalog records and edits
//! - `ProductPage`, `ProductQuery`: paginated listing and its filters
//! - `UserIdentity`, `Role`: the logged-in account
//! - `LoginResponse`, `RegisterRequest`: auth endpoint payloads
//! - `Envelope`: the `{ success, message, data, errors }` wrapper every
//!   endpoint answers with

pub mod envelope;
pub mod product;
pub mod user;

pub use envelope::Envelope;
pub use product::{NewProduct, Product, ProductPage, ProductPatch, ProductQuery, ALL_CATEGORIES};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, Role, UserIdentity};
