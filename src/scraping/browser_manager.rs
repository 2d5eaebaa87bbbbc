//! Native headless-browser management using `chromiumoxide`.
//!
//! Some results pages inject the winning numbers via client-side script, so
//! the static HTML carries nothing extractable. This module renders such
//! pages in a headless Chromium-family browser and hands the hydrated HTML
//! back to the extractor. One browser instance is launched per fetch and
//! released on every exit path; a leaked Chromium process is the principal
//! failure mode to guard against here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::core::config::RenderingBackend;
use crate::core::error::ScrapeError;

/// Fixed desktop profile; the results site serves its PC layout for this.
pub const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

/// Element the rendered page is known to carry once hydration finished.
const RENDER_MARKER: &str = ".js-lottery-number-pc";

/// Timeouts for one rendered fetch. Values come from config, not constants —
/// a hung remote page must never block the caller past these budgets.
#[derive(Debug, Clone, Copy)]
pub struct RenderBudget {
    pub navigation_ms: u64,
    pub idle_ms: u64,
    pub grace_ms: u64,
}

/// Find a usable Chromium-family browser executable.
///
/// Resolution order:
/// 1. `CHROME_EXECUTABLE` env var (explicit override)
/// 2. PATH scan — finds package-manager installs on all platforms.
/// 3. OS-specific well-known install paths.
pub fn find_chrome_executable() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(crate::core::config::ENV_CHROME_EXECUTABLE) {
        if Path::new(&p).exists() {
            return Some(PathBuf::from(p));
        }
    }

    if let Ok(path_var) = std::env::var("PATH") {
        let candidates = ["google-chrome", "chromium", "chromium-browser", "chrome"];
        for dir in std::env::split_paths(&path_var) {
            for exe in candidates {
                let full = dir.join(exe);
                if full.exists() {
                    return Some(full);
                }
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        let candidates = [
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(PathBuf::from(c));
            }
        }
    }

    #[cfg(target_os = "linux")]
    {
        let candidates = [
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/local/bin/chromium",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(PathBuf::from(c));
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        let candidates = [
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ];
        for c in candidates {
            if Path::new(c).exists() {
                return Some(PathBuf::from(c));
            }
        }
    }

    None
}

/// Resolve the executable for the configured backend.
pub fn resolve_executable(backend: &RenderingBackend) -> Result<PathBuf, ScrapeError> {
    match backend {
        RenderingBackend::ExternalBinary(path) => {
            if path.exists() {
                Ok(path.clone())
            } else {
                Err(ScrapeError::BrowserUnavailable)
            }
        }
        RenderingBackend::Bundled => find_chrome_executable().ok_or(ScrapeError::BrowserUnavailable),
    }
}

fn build_headless_config(exe: &Path) -> Result<BrowserConfig, String> {
    BrowserConfig::builder()
        .chrome_executable(exe)
        .viewport(Viewport {
            width: 1280,
            height: 900,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .window_size(1280, 900)
        .arg("--disable-gpu")
        .arg("--no-sandbox") // required in CI / container environments
        .arg("--disable-dev-shm-usage")
        .arg("--disable-extensions")
        .arg("--disable-background-networking")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--hide-scrollbars")
        .arg("--mute-audio")
        .arg(format!("--user-agent={DESKTOP_USER_AGENT}"))
        .build()
        .map_err(|e| format!("browser config: {e}"))
}

/// Wait until the page network goes idle (no new resource entries for
/// `quiet_ms` consecutive ms) or until `timeout_ms` has elapsed.
///
/// Polls `performance.getEntriesByType("resource").length` every 250 ms — a
/// networkidle heuristic that needs no CDP Network events.
async fn wait_until_idle(page: &Page, quiet_ms: u64, timeout_ms: u64) -> bool {
    let poll = Duration::from_millis(250);
    let start = std::time::Instant::now();
    let mut last_count: u64 = 0;
    let mut stable_since = std::time::Instant::now();

    loop {
        if start.elapsed().as_millis() as u64 >= timeout_ms {
            debug!("network idle wait timed out after {}ms", timeout_ms);
            return false;
        }

        let count: u64 = page
            .evaluate("performance.getEntriesByType('resource').length")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_u64())
            .unwrap_or(0);

        let ready: bool = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_str().map(|s| s == "complete"))
            .unwrap_or(false);

        if !ready || count != last_count {
            last_count = count;
            stable_since = std::time::Instant::now();
        } else if stable_since.elapsed().as_millis() as u64 >= quiet_ms {
            debug!(
                "network idle after {}ms ({} resources)",
                start.elapsed().as_millis(),
                count
            );
            return true;
        }

        tokio::time::sleep(poll).await;
    }
}

/// Poll for the hydration marker element for up to `grace_ms`.
async fn wait_for_marker(page: &Page, grace_ms: u64) {
    let poll = Duration::from_millis(250);
    let start = std::time::Instant::now();
    let probe = format!("document.querySelector('{RENDER_MARKER}') !== null");
    loop {
        let present: bool = page
            .evaluate(probe.as_str())
            .await
            .ok()
            .and_then(|v| v.into_value::<serde_json::Value>().ok())
            .and_then(|j| j.as_bool())
            .unwrap_or(false);
        if present {
            debug!("render marker appeared after {}ms", start.elapsed().as_millis());
            return;
        }
        if start.elapsed().as_millis() as u64 >= grace_ms {
            debug!("render marker absent after {}ms grace", grace_ms);
            return;
        }
        tokio::time::sleep(poll).await;
    }
}

fn render_err(url: &str, reason: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Render {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Fetch the rendered HTML of `url` with a fresh headless browser.
///
/// Navigation is bounded by `budget.navigation_ms`; after navigation the
/// page is given `budget.idle_ms` to go network-idle, falling back to a
/// `budget.grace_ms` wait for the hydration marker. The browser is closed on
/// every path out of this function.
pub async fn fetch_rendered_html(
    url: &str,
    backend: &RenderingBackend,
    budget: RenderBudget,
) -> Result<String, ScrapeError> {
    let exe = resolve_executable(backend)?;
    info!("rendered fetch: {} (browser: {})", url, exe.display());

    let config = build_headless_config(&exe).map_err(|e| render_err(url, e))?;
    let (mut browser, mut handler) = Browser::launch(config)
        .await
        .map_err(|e| render_err(url, format!("launch ({}): {e}", exe.display())))?;

    // CDP event pump; ends when the browser closes.
    let pump = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("CDP handler error: {}", e);
            }
        }
    });

    let result: Result<String, ScrapeError> = async {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| render_err(url, format!("open page: {e}")))?;

        tokio::time::timeout(
            Duration::from_millis(budget.navigation_ms),
            page.goto(url),
        )
        .await
        .map_err(|_| render_err(url, format!("navigation timed out after {}ms", budget.navigation_ms)))?
        .map_err(|e| render_err(url, format!("navigation: {e}")))?;

        if !wait_until_idle(&page, 1_500, budget.idle_ms).await {
            // Never went idle inside the budget; give the marker a short
            // fixed grace period before reading whatever rendered.
            wait_for_marker(&page, budget.grace_ms).await;
        }

        page.content()
            .await
            .map_err(|e| render_err(url, format!("read content: {e}")))
    }
    .await;

    // Unconditional release — don't let a close error shadow the fetch error.
    if let Err(e) = browser.close().await {
        warn!("browser close error (non-fatal): {}", e);
    }
    pump.abort();

    result
}
