//! Client-side product catalog state.
//!
//! `ProductCatalog` keeps the current page of products, the active filters
//! and the last error, and keeps the local list in step with create,
//! update and delete calls.

pub mod state;

pub use state::{Filters, Pagination, ProductCatalog};
