//! Visibility resolution: is a located element really the thing a user sees?
//!
//! The element is scrolled to the viewport center, measured, and then
//! hit-tested at one or more sample points. Only elements that survive the
//! occlusion test get a padded clip rectangle; everything else resolves to
//! the degenerate rectangle and is silently skipped.

use crate::page::PageSession;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uishot_core::{CaptureSettings, Category, Point, Probe, Rect, Result};

/// Outcome of resolving one element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityVerdict {
    pub visible: bool,
    /// Padded document-space clip when visible, degenerate otherwise
    pub rect: Rect,
}

impl VisibilityVerdict {
    pub fn visible(rect: Rect) -> Self {
        Self {
            visible: true,
            rect,
        }
    }

    pub fn occluded() -> Self {
        Self {
            visible: false,
            rect: Rect::degenerate(),
        }
    }

    /// True when nothing should be captured
    pub fn is_degenerate(&self) -> bool {
        !self.visible || self.rect.is_degenerate()
    }
}

/// Scrolls, measures and hit-tests elements
#[derive(Debug, Clone)]
pub struct VisibilityResolver {
    padding: f64,
    corner_inset: f64,
}

impl Default for VisibilityResolver {
    fn default() -> Self {
        Self::from_settings(&CaptureSettings::default())
    }
}

impl VisibilityResolver {
    pub fn new(padding: f64, corner_inset: f64) -> Self {
        Self {
            padding,
            corner_inset,
        }
    }

    pub fn from_settings(settings: &CaptureSettings) -> Self {
        Self::new(settings.padding, settings.corner_inset)
    }

    /// Resolve one element using the occlusion policy of its category
    pub async fn resolve<P: PageSession>(
        &self,
        page: &P,
        element: &P::Element,
        category: Category,
    ) -> Result<VisibilityVerdict> {
        page.scroll_into_view(element).await?;

        let measurement = match page.measure(element).await? {
            Some(m) if !m.rect.is_degenerate() => m,
            _ => {
                trace!("{} lost its box after scrolling", category);
                return Ok(VisibilityVerdict::occluded());
            }
        };

        let unobstructed = match category.probe() {
            Probe::Center => self.topmost_at_center(page, element, &measurement.rect).await?,
            Probe::Corners => self.present_at_corners(page, element, &measurement.rect).await?,
        };

        if !unobstructed {
            debug!(
                "{} at ({:.0}, {:.0}) is occluded",
                category, measurement.rect.x, measurement.rect.y
            );
            return Ok(VisibilityVerdict::occluded());
        }

        Ok(VisibilityVerdict::visible(
            measurement.rect.padded(measurement.scroll, self.padding),
        ))
    }

    /// Simple elements must be the first node hit at their center
    async fn topmost_at_center<P: PageSession>(
        &self,
        page: &P,
        element: &P::Element,
        rect: &Rect,
    ) -> Result<bool> {
        Ok(page.hit_test(element, rect.center()).await? == Some(0))
    }

    /// Composite elements must be somewhere in the stack at every inset
    /// corner, and at the center
    async fn present_at_corners<P: PageSession>(
        &self,
        page: &P,
        element: &P::Element,
        rect: &Rect,
    ) -> Result<bool> {
        let samples: Vec<Point> = rect
            .inset_corners(self.corner_inset)
            .into_iter()
            .chain(std::iter::once(rect.center()))
            .collect();

        for point in samples {
            if page.hit_test(element, point).await?.is_none() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePage, FakeScene};

    fn resolver() -> VisibilityResolver {
        VisibilityResolver::new(10.0, 5.0)
    }

    #[test]
    fn test_verdict_constructors() {
        let occluded = VisibilityVerdict::occluded();
        assert!(!occluded.visible);
        assert!(occluded.is_degenerate());

        let visible = VisibilityVerdict::visible(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!visible.is_degenerate());
    }

    #[tokio::test]
    async fn test_unobstructed_text_link_is_padded() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let link = scene.add_element(Category::TextLink, Rect::new(100.0, 1000.0, 80.0, 20.0));
        let page = FakePage::new(scene);

        let verdict = resolver()
            .resolve(&page, &page.element(link), Category::TextLink)
            .await
            .unwrap();

        assert!(verdict.visible);
        // centered: scroll = (0, 1010 - 300)
        assert_eq!(verdict.rect, Rect::new(90.0, 990.0, 100.0, 40.0));
    }

    #[tokio::test]
    async fn test_text_link_under_overlay_is_occluded() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let link = scene.add_element(Category::TextLink, Rect::new(100.0, 100.0, 80.0, 20.0));
        scene.add_overlay(Rect::new(0.0, 0.0, 800.0, 600.0), 10);
        let page = FakePage::new(scene);

        let verdict = resolver()
            .resolve(&page, &page.element(link), Category::TextLink)
            .await
            .unwrap();

        assert!(verdict.is_degenerate());
        assert_eq!(verdict.rect, Rect::degenerate());
    }

    #[tokio::test]
    async fn test_text_link_with_child_at_center_is_not_topmost() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let link = scene.add_element(Category::TextLink, Rect::new(100.0, 100.0, 80.0, 20.0));
        scene.add_child(link, Rect::new(130.0, 105.0, 20.0, 10.0));
        let page = FakePage::new(scene);

        let verdict = resolver()
            .resolve(&page, &page.element(link), Category::TextLink)
            .await
            .unwrap();

        assert!(!verdict.visible);
    }

    #[tokio::test]
    async fn test_image_link_with_nested_image_is_visible() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let link = scene.add_element(Category::ImageLink, Rect::new(200.0, 200.0, 120.0, 60.0));
        scene.add_child(link, Rect::new(220.0, 210.0, 80.0, 40.0));
        let page = FakePage::new(scene);

        let verdict = resolver()
            .resolve(&page, &page.element(link), Category::ImageLink)
            .await
            .unwrap();

        assert!(verdict.visible);
        assert_eq!(verdict.rect.width, 140.0);
        assert_eq!(verdict.rect.height, 80.0);
    }

    #[tokio::test]
    async fn test_button_with_one_covered_corner_is_occluded() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let button = scene.add_element(Category::Button, Rect::new(300.0, 300.0, 100.0, 40.0));
        // covers only the bottom-right inset corner
        scene.add_overlay(Rect::new(390.0, 330.0, 50.0, 50.0), 5);
        let page = FakePage::new(scene);

        let verdict = resolver()
            .resolve(&page, &page.element(button), Category::Button)
            .await
            .unwrap();

        assert!(!verdict.visible);
    }

    #[tokio::test]
    async fn test_stacked_buttons_only_top_survives() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let bottom = scene.add_element(Category::Button, Rect::new(300.0, 300.0, 100.0, 40.0));
        let top = scene.add_element(Category::Button, Rect::new(300.0, 300.0, 100.0, 40.0));
        let page = FakePage::new(scene);

        let r = resolver();
        let bottom_verdict = r
            .resolve(&page, &page.element(bottom), Category::Button)
            .await
            .unwrap();
        let top_verdict = r
            .resolve(&page, &page.element(top), Category::Button)
            .await
            .unwrap();

        assert!(!bottom_verdict.visible);
        assert!(top_verdict.visible);
    }

    #[tokio::test]
    async fn test_button_under_full_overlay_is_occluded() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let hidden = scene.add_element(Category::Button, Rect::new(300.0, 300.0, 100.0, 40.0));
        scene.add_overlay(Rect::new(290.0, 290.0, 120.0, 60.0), 5);
        let page = FakePage::new(scene);

        let verdict = resolver()
            .resolve(&page, &page.element(hidden), Category::Button)
            .await
            .unwrap();

        assert!(!verdict.visible);
    }

    #[tokio::test]
    async fn test_padded_rect_near_origin_is_clamped() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let button = scene.add_element(Category::Button, Rect::new(2.0, 3.0, 60.0, 30.0));
        let page = FakePage::new(scene);

        let verdict = resolver()
            .resolve(&page, &page.element(button), Category::Button)
            .await
            .unwrap();

        assert!(verdict.visible);
        assert_eq!(verdict.rect.x, 0.0);
        assert_eq!(verdict.rect.y, 0.0);
        assert_eq!(verdict.rect.width, 80.0);
        assert_eq!(verdict.rect.height, 50.0);
    }

    #[tokio::test]
    async fn test_unrendered_element_is_degenerate() {
        let mut scene = FakeScene::new(800.0, 600.0);
        let hidden = scene.add_unrendered(Category::Button);
        let page = FakePage::new(scene);

        let verdict = resolver()
            .resolve(&page, &page.element(hidden), Category::Button)
            .await
            .unwrap();

        assert!(verdict.is_degenerate());
    }
}
