//! Utility functions for display formatting.

pub mod format;

pub use format::{format_number, format_price, truncate_string};
