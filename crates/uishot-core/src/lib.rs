//! # uishot-core
//!
//! Core types for the uishot element capture pipeline.
//!
//! uishot renders pages in a headless browser, finds the interactive elements
//! a user would actually see (text links, image links, buttons) and captures
//! each one in its normal and hovered state.
//!
//! ## Core Paradigm
//!
//! - Geometry is read after the element is scrolled to the viewport center
//! - An element counts only if hit-testing finds it at its sample points
//! - A degenerate (zero-area) rectangle means "skip", never "fail"
//! - Normal and hover captures of one element share one id

pub mod config;
mod error;
pub mod fail_open;
mod types;

pub use config::{BrowserConfig, CaptureSettings, ImageFormatKind, OutputSettings, UishotConfig};
pub use error::{Result, UishotError};
pub use types::*;
