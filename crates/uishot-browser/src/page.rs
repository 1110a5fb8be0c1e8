//! Page capabilities used by the capture pipeline
//!
//! The resolver, capture engine and orchestrator only talk to these traits,
//! which keeps the geometry and batching logic testable without a browser.

use async_trait::async_trait;
use uishot_core::{Measurement, Point, Rect, Result};

/// Opens pages (one browser, many sequential pages)
#[async_trait]
pub trait PageSource: Send + Sync {
    type Page: PageSession;

    /// Navigate a fresh page to `url`.
    ///
    /// Implementations must disable smooth scrolling on success and return
    /// `UishotError::NavigationFailed` (never panic) when the page does not
    /// load within policy.
    async fn navigate(&self, url: &str) -> Result<Self::Page>;
}

/// One navigated page and the element operations the pipeline needs
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Ephemeral element reference, only valid until [`PageSession::close`]
    type Element: Send + Sync;

    /// All elements matching a CSS selector, in document order
    async fn query(&self, selector: &str) -> Result<Vec<Self::Element>>;

    /// Scroll the element to the viewport center without animation
    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()>;

    /// Current bounding box and scroll offset; `None` when the element is
    /// not laid out
    async fn measure(&self, element: &Self::Element) -> Result<Option<Measurement>>;

    /// Position of `element` in the hit stack at a viewport point
    /// (0 = topmost), or `None` if it is not in the stack at all
    async fn hit_test(&self, element: &Self::Element, point: Point) -> Result<Option<usize>>;

    /// PNG screenshot clipped to a document-space rectangle
    async fn screenshot(&self, clip: &Rect) -> Result<Vec<u8>>;

    /// Move the pointer over the element
    async fn simulate_hover(&self, element: &Self::Element) -> Result<()>;

    /// Park the pointer where it hovers nothing the pipeline captures
    async fn clear_hover(&self) -> Result<()>;

    /// Release the page; element handles become invalid
    async fn close(self) -> Result<()>;
}
