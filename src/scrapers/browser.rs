use crate::error::{DriverInitError, FetchError};
use crate::scrapers::traits::PageFetcher;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

// Consent banners cover the cards on some portals
const DISMISS_COOKIES_JS: &str = r#"
    const button = document.querySelector(
        '#didomi-notice-agree-button, button[data-testid="TcfAccept"], button[id*="accept"], button[id*="aceptar"]'
    );
    if (button) button.click();
"#;

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub headless: bool,
    /// Browser binary; `None` lets headless_chrome locate one
    pub chrome_bin: Option<PathBuf>,
    /// Bound on navigation and page load
    pub page_timeout: Duration,
    /// Bound on waiting for the listing marker to render
    pub wait_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_bin: None,
            page_timeout: Duration::from_secs(45),
            wait_timeout: Duration::from_secs(30),
        }
    }
}

/// Headless Chrome owned by one search invocation.
///
/// Chrome is shut down when the session is dropped, so a search creates the
/// session, lends it to the runner and lets it go out of scope afterwards.
pub struct BrowserSession {
    browser: Browser,
    config: BrowserConfig,
}

impl BrowserSession {
    pub fn launch(config: BrowserConfig) -> Result<Self, DriverInitError> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false)
            .window_size(Some((1920, 1080)))
            .path(config.chrome_bin.clone())
            .idle_browser_timeout(config.page_timeout + config.wait_timeout + Duration::from_secs(60))
            .build()
            .map_err(|e| DriverInitError(format!("invalid launch options: {}", e)))?;

        let browser = Browser::new(options).map_err(|e| DriverInitError(e.to_string()))?;

        Ok(Self { browser, config })
    }

    fn render(
        browser: &Browser,
        config: &BrowserConfig,
        url: &str,
        ready_selector: &str,
    ) -> Result<String, FetchError> {
        let tab = browser.new_tab().map_err(|e| navigation(url, e))?;
        tab.set_default_timeout(config.page_timeout);

        let result = Self::load(&tab, config, url, ready_selector);

        if let Err(e) = tab.close(true) {
            debug!("Could not close tab for {}: {}", url, e);
        }

        result
    }

    fn load(
        tab: &Tab,
        config: &BrowserConfig,
        url: &str,
        ready_selector: &str,
    ) -> Result<String, FetchError> {
        tab.navigate_to(url).map_err(|e| navigation(url, e))?;
        tab.wait_until_navigated().map_err(|e| navigation(url, e))?;

        tab.wait_for_element_with_custom_timeout(ready_selector, config.wait_timeout)
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                secs: config.wait_timeout.as_secs(),
            })?;

        let _ = tab.evaluate(DISMISS_COOKIES_JS, false);

        let html = tab.get_content().map_err(|e| navigation(url, e))?;
        debug!("Rendered {} bytes of HTML from {}", html.len(), url);

        Ok(html)
    }
}

fn navigation(url: &str, error: anyhow::Error) -> FetchError {
    FetchError::Navigation {
        url: url.to_string(),
        reason: error.to_string(),
    }
}

#[async_trait]
impl PageFetcher for BrowserSession {
    async fn fetch(&self, url: &str, ready_selector: &str) -> Result<String, FetchError> {
        let browser = self.browser.clone();
        let config = self.config.clone();
        let target = url.to_string();
        let ready = ready_selector.to_string();

        // CDP calls block; keep them off the runtime threads
        tokio::task::spawn_blocking(move || Self::render(&browser, &config, &target, &ready))
            .await
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                reason: format!("browser task aborted: {}", e),
            })?
    }

    fn strategy_name(&self) -> &'static str {
        "browser"
    }
}
