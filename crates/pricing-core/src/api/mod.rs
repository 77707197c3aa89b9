//! REST API access for the pricing catalog.
//!
//! - `Gateway`: the single entry point for every call. Attaches the bearer
//!   token and recovers from an expired access token with one shared
//!   refresh (`POST /token/refresh/`) before replaying the call.
//! - `Transport`: the HTTP seam under the gateway, backed by reqwest.
//! - `AuthApi`, `ProductsApi`: typed resource clients built on the gateway.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod products;
pub mod refresh;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::AuthApi;
pub use error::ApiError;
pub use gateway::{ApiRequest, Gateway, SessionEvent};
pub use products::ProductsApi;
pub use refresh::RefreshCoordinator;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
