//! Capture a [`PageSnapshot`] from a real page through headless Chrome

use crate::dom::element::PageSnapshot;
use crate::error::{PenError, Result};
use headless_chrome::{Browser, Tab};
use std::sync::Arc;
use std::time::Duration;

/// Options for launching the capture browser
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Run without a visible window
    pub headless: bool,

    /// Browser window size in pixels
    pub window_width: u32,
    pub window_height: u32,

    /// Extra time for client-side rendering after navigation
    pub settle: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 900,
            settle: Duration::from_millis(500),
        }
    }
}

impl CaptureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Builder method: set the settle delay
    pub fn settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

/// Launch a browser, load `url` and snapshot the rendered DOM
pub fn capture_page(url: &str, options: &CaptureOptions) -> Result<PageSnapshot> {
    let mut launch_opts = headless_chrome::LaunchOptions::default();
    launch_opts.headless = options.headless;
    launch_opts.window_size = Some((options.window_width, options.window_height));

    let browser = Browser::new(launch_opts).map_err(|e| PenError::SnapshotFailed(format!("Failed to launch browser: {}", e)))?;
    let tab = browser
        .new_tab()
        .map_err(|e| PenError::SnapshotFailed(format!("Failed to create tab: {}", e)))?;

    tab.navigate_to(url)
        .map_err(|e| PenError::SnapshotFailed(format!("Failed to navigate to {}: {}", url, e)))?;
    tab.wait_until_navigated()
        .map_err(|e| PenError::SnapshotFailed(format!("Navigation timeout: {}", e)))?;
    std::thread::sleep(options.settle);

    snapshot_tab(&tab)
}

/// Snapshot the DOM of an already loaded tab
pub fn snapshot_tab(tab: &Arc<Tab>) -> Result<PageSnapshot> {
    let js_code = include_str!("extract_dom.js");

    let result = tab
        .evaluate(js_code, false)
        .map_err(|e| PenError::SnapshotFailed(format!("Failed to execute DOM extraction script: {}", e)))?;

    let json_value = result
        .value
        .ok_or_else(|| PenError::SnapshotFailed("No value returned from DOM extraction".to_string()))?;

    // The script returns a JSON string, not an object
    let json_str: String = serde_json::from_value(json_value)
        .map_err(|e| PenError::SnapshotFailed(format!("Failed to get JSON string: {}", e)))?;

    let snapshot: PageSnapshot = serde_json::from_str(&json_str)
        .map_err(|e| PenError::SnapshotFailed(format!("Failed to parse DOM JSON: {}", e)))?;

    log::info!("Captured {} nodes from {}", snapshot.root.count_nodes(), snapshot.url);
    Ok(snapshot)
}
