//! Test doubles for the page traits
//!
//! [`FakeScene`] is a flat list of boxes in document space. Hit-testing
//! returns the topmost box at a point followed by its ancestor chain, so an
//! unrelated box on top hides an element while a nested child does not.
//! Points outside the viewport hit nothing.
//!
//! This is stricter than Chrome: `document.elementsFromPoint` also lists
//! covered siblings below the topmost box, so an element under a
//! non-ancestor overlay is still "in the stack" there. Both agree on the
//! topmost entry, which is what the center check reads; for the corner
//! check the fake treats any foreign box on top as occluding.

use crate::capture::IdGenerator;
use crate::page::{PageSession, PageSource};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uishot_core::{Category, Measurement, Point, Rect, Result, UishotError};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct FakeNode {
    rect: Option<Rect>,
    z: i32,
    parent: Option<usize>,
}

/// Static page layout
#[derive(Debug, Clone)]
pub struct FakeScene {
    viewport: (f64, f64),
    nodes: Vec<FakeNode>,
    tags: Vec<(Category, usize)>,
    fail_screenshots: bool,
    failing_queries: HashSet<Category>,
}

impl FakeScene {
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            viewport: (viewport_width, viewport_height),
            nodes: Vec::new(),
            tags: Vec::new(),
            fail_screenshots: false,
            failing_queries: HashSet::new(),
        }
    }

    fn push(&mut self, rect: Option<Rect>, z: i32, parent: Option<usize>) -> usize {
        self.nodes.push(FakeNode { rect, z, parent });
        self.nodes.len() - 1
    }

    /// Element matched by the category's selector
    pub fn add_element(&mut self, category: Category, rect: Rect) -> usize {
        let id = self.push(Some(rect), 1, None);
        self.tags.push((category, id));
        id
    }

    /// Matched element that is not laid out
    pub fn add_unrendered(&mut self, category: Category) -> usize {
        let id = self.push(None, 1, None);
        self.tags.push((category, id));
        id
    }

    /// Nested, untagged node painted above its parent
    pub fn add_child(&mut self, parent: usize, rect: Rect) -> usize {
        let z = self.nodes[parent].z + 1;
        self.push(Some(rect), z, Some(parent))
    }

    /// Untagged node painted at `z`
    pub fn add_overlay(&mut self, rect: Rect, z: i32) -> usize {
        self.push(Some(rect), z, None)
    }

    pub fn fail_screenshots(&mut self) {
        self.fail_screenshots = true;
    }

    pub fn fail_queries(&mut self) {
        self.failing_queries.extend(Category::ALL);
    }

    /// Only the query for `category` fails
    pub fn fail_query(&mut self, category: Category) {
        self.failing_queries.insert(category);
    }

    /// Topmost node at a document point; later nodes win ties
    fn topmost(&self, point: Point) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.rect.is_some_and(|r| r.contains(point)))
            .max_by_key(|(i, n)| (n.z, *i))
            .map(|(i, _)| i)
    }

    fn hit_stack(&self, point: Point) -> Vec<usize> {
        let mut stack = Vec::new();
        let mut current = self.topmost(point);
        while let Some(id) = current {
            stack.push(id);
            current = self.nodes[id].parent;
        }
        stack
    }
}

/// Handle into a [`FakePage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeElement(pub usize);

/// A navigated fake page
pub struct FakePage {
    scene: FakeScene,
    scroll: Mutex<Point>,
    hovered: Mutex<Option<usize>>,
    screenshots: AtomicUsize,
    closed: Arc<AtomicBool>,
    open_pages: Arc<AtomicUsize>,
}

impl FakePage {
    pub fn new(scene: FakeScene) -> Self {
        Self::with_tracking(scene, Arc::new(AtomicBool::new(false)), Arc::new(AtomicUsize::new(1)))
    }

    fn with_tracking(
        scene: FakeScene,
        closed: Arc<AtomicBool>,
        open_pages: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            scene,
            scroll: Mutex::new(Point::default()),
            hovered: Mutex::new(None),
            screenshots: AtomicUsize::new(0),
            closed,
            open_pages,
        }
    }

    pub fn element(&self, id: usize) -> FakeElement {
        FakeElement(id)
    }

    pub fn hovered(&self) -> Option<usize> {
        *self.hovered.lock().unwrap()
    }

    pub fn screenshot_count(&self) -> usize {
        self.screenshots.load(Ordering::SeqCst)
    }

    fn rect_of(&self, element: &FakeElement) -> Result<Option<Rect>> {
        self.scene
            .nodes
            .get(element.0)
            .map(|n| n.rect)
            .ok_or_else(|| UishotError::Extraction(format!("stale element {}", element.0)))
    }
}

#[async_trait]
impl PageSession for FakePage {
    type Element = FakeElement;

    async fn query(&self, selector: &str) -> Result<Vec<FakeElement>> {
        if self
            .scene
            .failing_queries
            .iter()
            .any(|category| category.selector() == selector)
        {
            return Err(UishotError::Extraction(format!("query '{}' failed", selector)));
        }
        Ok(self
            .scene
            .tags
            .iter()
            .filter(|(category, _)| category.selector() == selector)
            .map(|(_, id)| FakeElement(*id))
            .collect())
    }

    async fn scroll_into_view(&self, element: &FakeElement) -> Result<()> {
        if let Some(rect) = self.rect_of(element)? {
            let center = rect.center();
            let (vw, vh) = self.scene.viewport;
            *self.scroll.lock().unwrap() =
                Point::new((center.x - vw / 2.0).max(0.0), (center.y - vh / 2.0).max(0.0));
        }
        Ok(())
    }

    async fn measure(&self, element: &FakeElement) -> Result<Option<Measurement>> {
        let scroll = *self.scroll.lock().unwrap();
        Ok(self.rect_of(element)?.map(|r| Measurement {
            rect: Rect::new(r.x - scroll.x, r.y - scroll.y, r.width, r.height),
            scroll,
        }))
    }

    async fn hit_test(&self, element: &FakeElement, point: Point) -> Result<Option<usize>> {
        let (vw, vh) = self.scene.viewport;
        if point.x < 0.0 || point.y < 0.0 || point.x >= vw || point.y >= vh {
            return Ok(None);
        }
        let scroll = *self.scroll.lock().unwrap();
        let document_point = Point::new(point.x + scroll.x, point.y + scroll.y);
        Ok(self
            .scene
            .hit_stack(document_point)
            .iter()
            .position(|id| *id == element.0))
    }

    async fn screenshot(&self, clip: &Rect) -> Result<Vec<u8>> {
        if self.scene.fail_screenshots {
            return Err(UishotError::Capture("clip outside renderable surface".to_string()));
        }
        self.screenshots.fetch_add(1, Ordering::SeqCst);
        let state = match self.hovered() {
            Some(id) => format!("hover-{}", id),
            None => "normal".to_string(),
        };
        Ok(format!(
            "{}:{}:{}:{}:{}",
            state, clip.x, clip.y, clip.width, clip.height
        )
        .into_bytes())
    }

    async fn simulate_hover(&self, element: &FakeElement) -> Result<()> {
        self.rect_of(element)?;
        *self.hovered.lock().unwrap() = Some(element.0);
        Ok(())
    }

    async fn clear_hover(&self) -> Result<()> {
        *self.hovered.lock().unwrap() = None;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.open_pages.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fake browser serving scenes by URL
#[derive(Default)]
pub struct FakeSource {
    scenes: HashMap<String, FakeScene>,
    failing: HashSet<String>,
    navigations: Mutex<Vec<String>>,
    open_pages: Arc<AtomicUsize>,
    max_open: AtomicUsize,
    closed: Mutex<Vec<Arc<AtomicBool>>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, scene: FakeScene) -> Self {
        self.scenes.insert(url.to_string(), scene);
        self
    }

    /// URL whose navigation always fails
    pub fn with_failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// URLs navigated so far, in order
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }

    /// Highest number of simultaneously open pages
    pub fn max_open_pages(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }

    /// Pages opened and closed again
    pub fn all_pages_closed(&self) -> bool {
        self.open_pages.load(Ordering::SeqCst) == 0
            && self
                .closed
                .lock()
                .unwrap()
                .iter()
                .all(|c| c.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl PageSource for FakeSource {
    type Page = FakePage;

    async fn navigate(&self, url: &str) -> Result<FakePage> {
        self.navigations.lock().unwrap().push(url.to_string());

        if self.failing.contains(url) {
            return Err(UishotError::NavigationFailed {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        let scene = self.scenes.get(url).cloned().ok_or_else(|| UishotError::NavigationFailed {
            url: url.to_string(),
            reason: "no such page".to_string(),
        })?;

        let open = self.open_pages.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_open.fetch_max(open, Ordering::SeqCst);

        let closed = Arc::new(AtomicBool::new(false));
        self.closed.lock().unwrap().push(closed.clone());
        Ok(FakePage::with_tracking(scene, closed, self.open_pages.clone()))
    }
}

/// Deterministic ids: 1, 2, 3, ...
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::SeqCst) + 1))
    }
}
