//! Browser error types - re-exports the unified UishotError from uishot-core
//!
//! Browser-side failures map onto these variants:
//! - Browser(String) - launch, tab and CDP failures
//! - NavigationFailed { url, reason } - page did not load
//! - Extraction(String) - selector queries and geometry scripts
//! - Capture(String) - screenshots and hover
//!
//! Error messages should name the operation and, where known, the URL or selector.

pub use uishot_core::{Result, UishotError};

/// Alias kept for call sites that read better with a browser-specific name
pub type BrowserError = UishotError;
