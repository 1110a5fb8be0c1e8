//! Core type definitions for uishot

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::{Result, UishotError};

/// A point in viewport coordinates (CSS pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle
///
/// Raw rectangles come straight from `getBoundingClientRect()` and live in
/// viewport space. Padded rectangles are shifted by the scroll offset into
/// document space, which is what screenshot clipping expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The zero-area sentinel meaning "do not capture"
    pub fn degenerate() -> Self {
        Self::default()
    }

    /// Zero (or negative) width or height
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Corner sample points, each pulled `inset` pixels towards the inside.
    ///
    /// Order: top-left, top-right, bottom-left, bottom-right.
    pub fn inset_corners(&self, inset: f64) -> [Point; 4] {
        let left = self.x + inset;
        let right = self.x + self.width - inset;
        let top = self.y + inset;
        let bottom = self.y + self.height - inset;
        [
            Point::new(left, top),
            Point::new(right, top),
            Point::new(left, bottom),
            Point::new(right, bottom),
        ]
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Expand by `padding` on every side after moving into document space.
    ///
    /// `x`/`y` are clamped to zero; width and height always grow by
    /// `2 * padding`, even when the clamp kicks in.
    pub fn padded(&self, scroll: Point, padding: f64) -> Rect {
        Rect {
            x: (scroll.x + self.x - padding).max(0.0),
            y: (scroll.y + self.y - padding).max(0.0),
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }
}

/// Rendered geometry of an element at a given scroll position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Bounding client rect (viewport space)
    pub rect: Rect,
    /// `window.scrollX` / `window.scrollY` when the rect was read
    pub scroll: Point,
}

/// Hit-test sampling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Probe {
    /// Single center sample; the element must be the topmost node
    Center,
    /// Four inset corners (plus center); the element must be somewhere in
    /// the hit stack at every sample
    Corners,
}

/// Category of interactive element
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Button,
    TextLink,
    ImageLink,
}

impl Category {
    /// Canonical processing order
    pub const ALL: [Category; 3] = [Category::Button, Category::TextLink, Category::ImageLink];

    /// CSS selector locating elements of this category
    pub fn selector(&self) -> &'static str {
        match self {
            Self::Button => {
                "button, input[type='button'], input[type='submit'], input[type='reset']"
            }
            Self::TextLink => "a:not(:has(img))",
            Self::ImageLink => "a:has(img)",
        }
    }

    /// Output directory name
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Button => "buttons",
            Self::TextLink => "text-links",
            Self::ImageLink => "image-links",
        }
    }

    /// Label used in progress summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::Button => "Buttons",
            Self::TextLink => "Links",
            Self::ImageLink => "Image Links",
        }
    }

    /// Occlusion policy for this category.
    ///
    /// Composite elements (image links, buttons, form controls) often have a
    /// nested child at their visual center, so they are verified at the
    /// corners instead of requiring to be topmost at the center. This split
    /// is carried over from observed behavior and is not independently
    /// confirmed.
    pub fn probe(&self) -> Probe {
        match self {
            Self::TextLink => Probe::Center,
            Self::Button | Self::ImageLink => Probe::Corners,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Button => write!(f, "button"),
            Self::TextLink => write!(f, "link"),
            Self::ImageLink => write!(f, "imageLink"),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "button" | "buttons" => Ok(Self::Button),
            "link" | "links" | "text_link" | "text-link" | "textlink" => Ok(Self::TextLink),
            "imagelink" | "image_link" | "image-link" | "imagelinks" => Ok(Self::ImageLink),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

/// Capture state of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Normal,
    Hover,
}

impl CaptureState {
    /// File name suffix for this state
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Normal => "",
            Self::Hover => "-hover",
        }
    }
}

impl std::fmt::Display for CaptureState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Hover => write!(f, "hover"),
        }
    }
}

/// One clipped screenshot of one element
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    /// Shared by the normal/hover pair of one element
    pub id: Uuid,
    pub category: Category,
    pub state: CaptureState,
    /// PNG bytes as returned by the browser
    pub bytes: Vec<u8>,
}

impl CaptureRecord {
    /// File stem used when persisting: `{id}` or `{id}-hover`
    pub fn file_stem(&self) -> String {
        format!("{}{}", self.id, self.state.suffix())
    }
}

/// One URL to process and the categories to extract from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub url: String,
    pub categories: BTreeSet<Category>,
}

impl TargetSpec {
    /// Target extracting every category
    pub fn all(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            categories: Category::ALL.into_iter().collect(),
        }
    }

    pub fn with_categories(
        url: impl Into<String>,
        categories: impl IntoIterator<Item = Category>,
    ) -> Self {
        Self {
            url: url.into(),
            categories: categories.into_iter().collect(),
        }
    }

    /// Parse the command-line form `[categories:]url`.
    ///
    /// The prefix before the first `:` is a filter only when every
    /// comma-separated part names a category, so `https://...` is left
    /// intact.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(UishotError::InvalidTarget("empty target".to_string()));
        }

        if let Some((prefix, rest)) = input.split_once(':') {
            let parsed: std::result::Result<Vec<Category>, _> =
                prefix.split(',').map(str::parse::<Category>).collect();
            if let Ok(categories) = parsed {
                if rest.is_empty() {
                    return Err(UishotError::InvalidTarget(format!(
                        "missing url after filter in '{}'",
                        input
                    )));
                }
                return Ok(Self::with_categories(rest, categories));
            }
        }

        Ok(Self::all(input))
    }
}

impl std::str::FromStr for TargetSpec {
    type Err = UishotError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_rect() {
        assert!(Rect::degenerate().is_degenerate());
        assert!(Rect::new(10.0, 10.0, 0.0, 5.0).is_degenerate());
        assert!(Rect::new(10.0, 10.0, 5.0, 0.0).is_degenerate());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_padded_rect_grows_and_shifts() {
        let raw = Rect::new(100.0, 50.0, 80.0, 20.0);
        let padded = raw.padded(Point::new(0.0, 400.0), 10.0);
        assert_eq!(padded, Rect::new(90.0, 440.0, 100.0, 40.0));
    }

    #[test]
    fn test_padded_rect_clamps_to_origin() {
        let raw = Rect::new(3.0, 4.0, 30.0, 12.0);
        let padded = raw.padded(Point::default(), 10.0);
        assert_eq!(padded.x, 0.0);
        assert_eq!(padded.y, 0.0);
        assert_eq!(padded.width, 50.0);
        assert_eq!(padded.height, 32.0);
    }

    #[test]
    fn test_inset_corners() {
        let corners = Rect::new(0.0, 0.0, 100.0, 40.0).inset_corners(5.0);
        assert_eq!(corners[0], Point::new(5.0, 5.0));
        assert_eq!(corners[1], Point::new(95.0, 5.0));
        assert_eq!(corners[2], Point::new(5.0, 35.0));
        assert_eq!(corners[3], Point::new(95.0, 35.0));
    }

    #[test]
    fn test_category_parse_and_display() {
        assert_eq!("button".parse::<Category>().unwrap(), Category::Button);
        assert_eq!("link".parse::<Category>().unwrap(), Category::TextLink);
        assert_eq!("imageLink".parse::<Category>().unwrap(), Category::ImageLink);
        assert_eq!("image-link".parse::<Category>().unwrap(), Category::ImageLink);
        assert!("video".parse::<Category>().is_err());

        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn test_category_probe() {
        assert_eq!(Category::TextLink.probe(), Probe::Center);
        assert_eq!(Category::ImageLink.probe(), Probe::Corners);
        assert_eq!(Category::Button.probe(), Probe::Corners);
    }

    #[test]
    fn test_target_without_filter() {
        let target = TargetSpec::parse("https://example.com/page?q=1").unwrap();
        assert_eq!(target.url, "https://example.com/page?q=1");
        assert_eq!(target.categories.len(), 3);
    }

    #[test]
    fn test_target_with_filter() {
        let target = TargetSpec::parse("button,link:https://example.com").unwrap();
        assert_eq!(target.url, "https://example.com");
        assert!(target.categories.contains(&Category::Button));
        assert!(target.categories.contains(&Category::TextLink));
        assert!(!target.categories.contains(&Category::ImageLink));
    }

    #[test]
    fn test_target_invalid() {
        assert!(TargetSpec::parse("   ").is_err());
        assert!(TargetSpec::parse("button:").is_err());
    }

    #[test]
    fn test_record_file_stem() {
        let id = Uuid::from_u128(7);
        let record = CaptureRecord {
            id,
            category: Category::Button,
            state: CaptureState::Hover,
            bytes: Vec::new(),
        };
        assert_eq!(record.file_stem(), format!("{}-hover", id));
    }
}
