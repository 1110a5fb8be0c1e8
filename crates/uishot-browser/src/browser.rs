//! Browser lifecycle and pages using Chrome DevTools Protocol

use crate::error::{BrowserError, Result};
use crate::page::{PageSession, PageSource};
use async_trait::async_trait;
use headless_chrome::browser::tab::point::Point as MousePoint;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport};
use headless_chrome::protocol::cdp::Runtime;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use uishot_core::fail_open::fail_open_sync;
use uishot_core::{BrowserConfig, Measurement, Point, Rect};

/// Injected after every navigation so `scrollIntoView` lands immediately
const DISABLE_SMOOTH_SCROLL: &str = r#"
(() => {
    const style = document.createElement('style');
    style.textContent = '* { scroll-behavior: auto !important; }';
    (document.head || document.documentElement).appendChild(style);
    return true;
})()
"#;

/// Attribute used to re-find queried elements between script calls
const REF_ATTRIBUTE: &str = "data-uishot-ref";

/// The single browser process of a run
pub struct BrowserSession {
    browser: Browser,
    config: BrowserConfig,
}

impl BrowserSession {
    /// Launch a browser with default configuration
    pub async fn launch() -> Result<Self> {
        Self::launch_with_config(BrowserConfig::default()).await
    }

    /// Launch browser with custom configuration
    pub async fn launch_with_config(config: BrowserConfig) -> Result<Self> {
        info!(
            "Launching browser (headless: {}, size: {}x{})",
            config.headless, config.window_width, config.window_height
        );

        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .build()
            .map_err(|e| BrowserError::Browser(format!("Failed to launch browser: {}", e)))?;

        let user_agent_arg: Option<String> =
            config.user_agent.as_ref().map(|ua| format!("--user-agent={}", ua));
        if let Some(ref ua_arg) = user_agent_arg {
            launch_options.args.push(OsStr::new(ua_arg));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| BrowserError::Browser(format!("Failed to launch browser: {}", e)))?;

        info!("Browser launched successfully");

        Ok(Self { browser, config })
    }

    /// Close the browser process
    pub async fn close(self) -> Result<()> {
        info!("Closing browser session");
        // Dropping `Browser` kills the child process
        drop(self.browser);
        Ok(())
    }

    fn load(&self, tab: &Tab, url: &str) -> std::result::Result<(), String> {
        tab.set_default_timeout(Duration::from_secs(self.config.timeout_seconds));
        tab.navigate_to(url).map_err(|e| e.to_string())?;
        tab.wait_until_navigated().map_err(|e| e.to_string())?;
        tab.evaluate(DISABLE_SMOOTH_SCROLL, false)
            .map_err(|e| format!("style override failed: {}", e))?;
        Ok(())
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    type Page = ChromePage;

    async fn navigate(&self, url: &str) -> Result<ChromePage> {
        debug!("Navigating to {}", url);

        let tab = self
            .browser
            .new_tab()
            .map_err(|e| BrowserError::Browser(format!("Failed to create tab: {}", e)))?;

        if let Err(reason) = self.load(&tab, url) {
            fail_open_sync("tab_close", close_tab(&tab));
            return Err(BrowserError::NavigationFailed {
                url: url.to_string(),
                reason,
            });
        }

        fail_open_sync("console_forwarding", forward_console(&tab));

        info!("Successfully navigated to {}", url);
        Ok(ChromePage {
            tab,
            url: url.to_string(),
            queries: AtomicUsize::new(0),
        })
    }
}

fn close_tab(tab: &Tab) -> Result<()> {
    tab.close(true)
        .map(|_| ())
        .map_err(|e| BrowserError::Browser(format!("Failed to close tab: {}", e)))
}

/// Re-emit page console output as debug logs
fn forward_console(tab: &Arc<Tab>) -> Result<()> {
    tab.call_method(Runtime::Enable(None))
        .map_err(|e| BrowserError::Browser(format!("Failed to enable runtime events: {}", e)))?;

    tab.add_event_listener(Arc::new(|event: &Event| {
        if let Event::RuntimeConsoleAPICalled(call) = event {
            let text = call
                .params
                .args
                .iter()
                .map(|arg| match &arg.value {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(value) => value.to_string(),
                    None => arg.description.clone().unwrap_or_default(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            debug!(target: "uishot::console", "{}", text);
        }
    }))
    .map_err(|e| BrowserError::Browser(format!("Failed to attach console listener: {}", e)))?;

    Ok(())
}

/// Element located by [`ChromePage::query`]
#[derive(Debug, Clone)]
pub struct ChromeElement {
    reference: String,
}

impl ChromeElement {
    /// JS expression evaluating to the element (or null once detached)
    fn expression(&self) -> String {
        format!(
            "document.querySelector({})",
            serde_json::Value::String(self.selector())
        )
    }

    fn selector(&self) -> String {
        format!("[{}=\"{}\"]", REF_ATTRIBUTE, self.reference)
    }
}

/// One navigated tab
pub struct ChromePage {
    tab: Arc<Tab>,
    url: String,
    queries: AtomicUsize,
}

impl ChromePage {
    fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| BrowserError::Extraction(format!("JavaScript evaluation failed: {}", e)))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl PageSession for ChromePage {
    type Element = ChromeElement;

    async fn query(&self, selector: &str) -> Result<Vec<ChromeElement>> {
        let batch = self.queries.fetch_add(1, Ordering::SeqCst);
        let script = format!(
            r#"
            (() => {{
                const found = Array.from(document.querySelectorAll({selector}));
                found.forEach((el, i) => el.setAttribute('{attr}', '{batch}-' + i));
                return found.length;
            }})()
            "#,
            selector = serde_json::Value::String(selector.to_string()),
            attr = REF_ATTRIBUTE,
            batch = batch,
        );

        let count = self
            .evaluate(&script)?
            .as_u64()
            .ok_or_else(|| BrowserError::Extraction(format!("Bad query result for {}", selector)))?;

        debug!("{} matched {} elements on {}", selector, count, self.url);
        Ok((0..count)
            .map(|i| ChromeElement {
                reference: format!("{}-{}", batch, i),
            })
            .collect())
    }

    async fn scroll_into_view(&self, element: &ChromeElement) -> Result<()> {
        let script = format!(
            r#"
            (() => {{
                const el = {element};
                if (!el) {{ return false; }}
                el.scrollIntoView({{ behavior: 'auto', block: 'center', inline: 'center' }});
                return true;
            }})()
            "#,
            element = element.expression(),
        );

        match self.evaluate(&script)?.as_bool() {
            Some(true) => Ok(()),
            _ => Err(BrowserError::Extraction(format!(
                "Element {} detached before scrolling",
                element.reference
            ))),
        }
    }

    async fn measure(&self, element: &ChromeElement) -> Result<Option<Measurement>> {
        let script = format!(
            r#"
            (() => {{
                const el = {element};
                if (!el || el.getClientRects().length === 0) {{ return null; }}
                const r = el.getBoundingClientRect();
                return JSON.stringify({{
                    rect: {{ x: r.x, y: r.y, width: r.width, height: r.height }},
                    scroll: {{ x: window.scrollX, y: window.scrollY }}
                }});
            }})()
            "#,
            element = element.expression(),
        );

        match self.evaluate(&script)? {
            serde_json::Value::String(json) => Ok(Some(serde_json::from_str(&json)?)),
            _ => Ok(None),
        }
    }

    async fn hit_test(&self, element: &ChromeElement, point: Point) -> Result<Option<usize>> {
        let script = format!(
            r#"
            (() => {{
                const el = {element};
                if (!el) {{ return -1; }}
                return document.elementsFromPoint({x}, {y}).indexOf(el);
            }})()
            "#,
            element = element.expression(),
            x = point.x,
            y = point.y,
        );

        let index = self
            .evaluate(&script)?
            .as_i64()
            .ok_or_else(|| BrowserError::Extraction("Bad hit-test result".to_string()))?;

        Ok(usize::try_from(index).ok())
    }

    async fn screenshot(&self, clip: &Rect) -> Result<Vec<u8>> {
        let viewport = Viewport {
            x: clip.x,
            y: clip.y,
            width: clip.width,
            height: clip.height,
            scale: 1.0,
        };

        self.tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, Some(viewport), true)
            .map_err(|e| BrowserError::Capture(format!("CDP capture failed: {}", e)))
    }

    async fn simulate_hover(&self, element: &ChromeElement) -> Result<()> {
        let selector = element.selector();
        let handle = self
            .tab
            .find_element(&selector)
            .map_err(|e| BrowserError::Capture(format!("Hover target lost: {}", e)))?;

        handle
            .move_mouse_over()
            .map_err(|e| BrowserError::Capture(format!("Hover failed: {}", e)))?;
        Ok(())
    }

    async fn clear_hover(&self) -> Result<()> {
        self.tab
            .move_mouse_to_point(MousePoint { x: 0.0, y: 0.0 })
            .map_err(|e| BrowserError::Capture(format!("Failed to reset pointer: {}", e)))?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        debug!("Closing page {}", self.url);
        close_tab(&self.tab)
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        debug!("ChromePage for {} dropped", self.url);
    }
}
