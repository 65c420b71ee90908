//! Ignore-aware directory traversal
//!
//! [`IgnoreFilter`] decides visibility; [`walk`] enumerates files under a
//! root with a depth bound.

mod filter;
mod walker;

pub use filter::{DEFAULT_IGNORE_NAMES, IgnoreFilter};
pub use walker::walk;
