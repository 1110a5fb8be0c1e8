//! Browser pages, visibility resolution and element capture for uishot
//!
//! This crate drives a Chrome/Chromium browser over the Chrome DevTools
//! Protocol (CDP) and decides which located elements are worth capturing.
//!
//! # Features
//!
//! - **Page Sessions**: one tab per URL, smooth scrolling disabled, console forwarded to logs
//! - **Visibility Resolution**: center or corner hit-testing after a centered scroll
//! - **Element Capture**: padded, clipped screenshots in normal and hover state
//!
//! # Example
//!
//! ```no_run
//! use uishot_browser::{BrowserSession, CaptureEngine, PageSession, PageSource, VisibilityResolver};
//! use uishot_core::{CaptureSettings, Category};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = BrowserSession::launch().await?;
//!     let page = session.navigate("https://example.com").await?;
//!
//!     let settings = CaptureSettings::default();
//!     let resolver = VisibilityResolver::from_settings(&settings);
//!     let engine = CaptureEngine::new(&settings);
//!
//!     for link in page.query(Category::TextLink.selector()).await? {
//!         let verdict = resolver.resolve(&page, &link, Category::TextLink).await?;
//!         if !verdict.is_degenerate() {
//!             let records = engine.capture(&page, &link, &verdict.rect, Category::TextLink).await;
//!             println!("captured {} records", records.len());
//!         }
//!     }
//!
//!     page.close().await?;
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Requirements
//!
//! - Chrome or Chromium browser installed
//!
//! # Architecture
//!
//! - [`page`]: the page capabilities the pipeline depends on
//! - [`browser`]: headless Chrome implementation of those capabilities
//! - [`visibility`]: occlusion test and padded clip rectangles
//! - [`capture`]: normal/hover screenshots and element ids
//! - [`error`]: Error types for browser operations

pub mod browser;
pub mod capture;
pub mod error;
pub mod page;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod visibility;

// Re-export commonly used types
pub use browser::{BrowserSession, ChromeElement, ChromePage};
pub use capture::{CaptureEngine, IdGenerator, RandomIds};
pub use error::{BrowserError, Result};
pub use page::{PageSession, PageSource};
pub use visibility::{VisibilityResolver, VisibilityVerdict};
