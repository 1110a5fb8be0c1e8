//! Element capture: normal screenshot, hover, hover screenshot

use crate::page::PageSession;
use std::collections::HashSet;
use tracing::{debug, warn};
use uishot_core::{
    CaptureRecord, CaptureSettings, CaptureState, Category, Rect, Result, UishotError,
};
use uuid::Uuid;

/// Source of per-element identifiers
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Random v4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Captures clipped screenshots of resolved elements
pub struct CaptureEngine<G: IdGenerator = RandomIds> {
    ids: G,
    hover_categories: HashSet<Category>,
}

impl CaptureEngine<RandomIds> {
    pub fn new(settings: &CaptureSettings) -> Self {
        Self::with_ids(settings, RandomIds)
    }
}

impl<G: IdGenerator> CaptureEngine<G> {
    /// Create an engine with a custom id source
    pub fn with_ids(settings: &CaptureSettings, ids: G) -> Self {
        Self {
            ids,
            hover_categories: settings.hover_categories.iter().copied().collect(),
        }
    }

    pub fn hovers(&self, category: Category) -> bool {
        self.hover_categories.contains(&category)
    }

    /// Capture one element.
    ///
    /// Returns the normal record, followed by the hover record when hover is
    /// enabled for the category. Any failure skips the element: the error is
    /// logged and no records are returned.
    pub async fn capture<P: PageSession>(
        &self,
        page: &P,
        element: &P::Element,
        rect: &Rect,
        category: Category,
    ) -> Vec<CaptureRecord> {
        match self.try_capture(page, element, rect, category).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Skipping {} at {:?}: {}", category, rect, e);
                Vec::new()
            }
        }
    }

    async fn try_capture<P: PageSession>(
        &self,
        page: &P,
        element: &P::Element,
        rect: &Rect,
        category: Category,
    ) -> Result<Vec<CaptureRecord>> {
        if rect.is_degenerate() {
            return Err(UishotError::Capture(
                "refusing to capture a degenerate rectangle".to_string(),
            ));
        }

        let id = self.ids.next_id();
        let mut records = Vec::with_capacity(2);

        // The pointer is still wherever the previous element's hover left it
        page.clear_hover().await?;
        let normal = page.screenshot(rect).await?;
        records.push(CaptureRecord {
            id,
            category,
            state: CaptureState::Normal,
            bytes: normal,
        });

        if self.hovers(category) {
            page.simulate_hover(element).await?;
            let hover = page.screenshot(rect).await?;
            records.push(CaptureRecord {
                id,
                category,
                state: CaptureState::Hover,
                bytes: hover,
            });
        }

        debug!("Captured {} {} ({} records)", category, id, records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePage, FakeScene, SequentialIds};

    fn engine(hover: Vec<Category>) -> CaptureEngine<SequentialIds> {
        let settings = CaptureSettings {
            hover_categories: hover,
            ..CaptureSettings::default()
        };
        CaptureEngine::with_ids(&settings, SequentialIds::default())
    }

    #[test]
    fn test_random_ids_are_distinct() {
        assert_ne!(RandomIds.next_id(), RandomIds.next_id());
    }

    #[tokio::test]
    async fn test_normal_and_hover_share_id() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let button = scene.add_element(Category::Button, Rect::new(10.0, 10.0, 50.0, 20.0));
        let page = FakePage::new(scene);
        let rect = Rect::new(0.0, 0.0, 70.0, 40.0);

        let records = engine(Category::ALL.to_vec())
            .capture(&page, &page.element(button), &rect, Category::Button)
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, records[1].id);
        assert_eq!(records[0].category, records[1].category);
        assert_eq!(records[0].state, CaptureState::Normal);
        assert_eq!(records[1].state, CaptureState::Hover);
        assert_ne!(records[0].bytes, records[1].bytes);
        assert_eq!(page.hovered(), Some(button));
    }

    #[tokio::test]
    async fn test_each_element_gets_new_id() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let a = scene.add_element(Category::TextLink, Rect::new(10.0, 10.0, 50.0, 20.0));
        let b = scene.add_element(Category::TextLink, Rect::new(10.0, 100.0, 50.0, 20.0));
        let page = FakePage::new(scene);
        let engine = engine(Category::ALL.to_vec());
        let rect = Rect::new(0.0, 0.0, 70.0, 40.0);

        let first = engine
            .capture(&page, &page.element(a), &rect, Category::TextLink)
            .await;
        let second = engine
            .capture(&page, &page.element(b), &rect, Category::TextLink)
            .await;

        assert_ne!(first[0].id, second[0].id);
    }

    #[tokio::test]
    async fn test_normal_capture_after_previous_hover_is_unhovered() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let a = scene.add_element(Category::Button, Rect::new(10.0, 10.0, 50.0, 20.0));
        let b = scene.add_element(Category::Button, Rect::new(10.0, 100.0, 50.0, 20.0));
        let page = FakePage::new(scene);
        let engine = engine(Category::ALL.to_vec());
        let rect = Rect::new(0.0, 0.0, 70.0, 40.0);

        engine
            .capture(&page, &page.element(a), &rect, Category::Button)
            .await;
        assert_eq!(page.hovered(), Some(a));

        let second = engine
            .capture(&page, &page.element(b), &rect, Category::Button)
            .await;

        assert_eq!(second.len(), 2);
        assert_eq!(second[0].bytes, b"normal:0:0:70:40".to_vec());
        assert_eq!(second[1].bytes, format!("hover-{}:0:0:70:40", b).into_bytes());
    }

    #[tokio::test]
    async fn test_hover_disabled_for_category() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let link = scene.add_element(Category::ImageLink, Rect::new(10.0, 10.0, 50.0, 20.0));
        let page = FakePage::new(scene);

        let records = engine(vec![Category::Button, Category::TextLink])
            .capture(
                &page,
                &page.element(link),
                &Rect::new(0.0, 0.0, 70.0, 40.0),
                Category::ImageLink,
            )
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state, CaptureState::Normal);
        assert_eq!(page.hovered(), None);
    }

    #[tokio::test]
    async fn test_degenerate_rect_produces_nothing() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let button = scene.add_element(Category::Button, Rect::new(10.0, 10.0, 50.0, 20.0));
        let page = FakePage::new(scene);

        let records = engine(Category::ALL.to_vec())
            .capture(&page, &page.element(button), &Rect::degenerate(), Category::Button)
            .await;

        assert!(records.is_empty());
        assert_eq!(page.screenshot_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_screenshot_skips_element() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let button = scene.add_element(Category::Button, Rect::new(10.0, 10.0, 50.0, 20.0));
        scene.fail_screenshots();
        let page = FakePage::new(scene);

        let records = engine(Category::ALL.to_vec())
            .capture(
                &page,
                &page.element(button),
                &Rect::new(0.0, 0.0, 70.0, 40.0),
                Category::Button,
            )
            .await;

        assert!(records.is_empty());
    }
}
