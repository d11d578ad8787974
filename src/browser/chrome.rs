use super::config::LaunchConfig;
use crate::config::{Config, SeedInput};
use crate::crawler::{ElementHandle, Locator, Renderer};
use crate::RendererError;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use scraper::{Html, Selector};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// How long `capture` waits to re-locate an element it was handed
const RELOCATE_TIMEOUT: Duration = Duration::from_millis(500);

/// Renderer backed by a single Chrome tab
pub struct ChromeRenderer {
    // Dropping the browser closes the tab
    _browser: Browser,
    tab: Arc<Tab>,
    not_found: Option<Locator>,
    not_found_timeout: Duration,
}

impl ChromeRenderer {
    /// Starts Chrome and opens the tab the session will use
    pub fn launch(seed: &SeedInput, config: &Config) -> Result<Self, RendererError> {
        let launch = LaunchConfig::from_settings(seed, &config.browser);
        let browser = Browser::new(Self::build_launch_options(&launch)?)
            .map_err(|e| RendererError::Launch(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| RendererError::Launch(format!("Tab creation failed: {}", e)))?;
        tab.set_default_timeout(launch.navigation_timeout);

        tracing::info!(
            "Browser started ({}x{}, headless: {}, extension: {})",
            launch.window_size.0,
            launch.window_size.1,
            launch.headless,
            launch
                .extension
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        );

        Ok(Self {
            _browser: browser,
            tab,
            not_found: config.selectors.not_found.clone(),
            not_found_timeout: config.timing.not_found_timeout(),
        })
    }

    /// Build Chrome launch options from our config
    fn build_launch_options(launch: &LaunchConfig) -> Result<LaunchOptions<'_>, RendererError> {
        let extensions: Vec<&OsStr> = launch
            .extension
            .iter()
            .map(|path| path.as_os_str())
            .collect();

        LaunchOptions::default_builder()
            .headless(launch.headless)
            .window_size(Some(launch.window_size))
            .idle_browser_timeout(launch.idle_timeout)
            .extensions(extensions)
            .build()
            .map_err(|e| RendererError::Launch(e.to_string()))
    }
}

impl Renderer for ChromeRenderer {
    fn load(&mut self, address: &str) -> Result<(), RendererError> {
        self.tab
            .navigate_to(address)
            .map_err(|e| navigation_error(address, e))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| navigation_error(address, e))?;
        tracing::debug!("Loaded {}", address);
        Ok(())
    }

    fn is_not_found(&mut self) -> bool {
        if let Some(locator) = &self.not_found {
            if find(&self.tab, locator, self.not_found_timeout).is_some() {
                tracing::debug!("Not-found marker {} present", locator);
                return true;
            }
        }

        match self.tab.get_content() {
            Ok(html) => is_not_found_document(&html),
            Err(e) => {
                tracing::warn!("Could not read page content: {}", e);
                false
            }
        }
    }

    fn wait_for_element(
        &mut self,
        locator: &Locator,
        timeout: Duration,
        click: bool,
    ) -> Option<ElementHandle> {
        let element = find(&self.tab, locator, timeout)?;
        let text = element.get_inner_text().unwrap_or_default();

        if click && !click_element(&element) {
            tracing::debug!("{} found but not clickable", locator);
            return None;
        }

        Some(ElementHandle::new(locator.clone(), text))
    }

    fn refresh(&mut self) -> Result<(), RendererError> {
        self.tab
            .reload(false, None)
            .map_err(|e| RendererError::Refresh(e.to_string()))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| RendererError::Refresh(e.to_string()))?;
        Ok(())
    }

    fn current_address(&mut self) -> String {
        self.tab.get_url()
    }

    fn capture(&mut self, element: &ElementHandle) -> Result<Vec<u8>, RendererError> {
        let target = find(&self.tab, &element.locator, RELOCATE_TIMEOUT).ok_or_else(|| {
            RendererError::Screenshot(format!("{} is no longer on the page", element.locator))
        })?;

        target
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Jpeg)
            .map_err(|e| RendererError::Screenshot(e.to_string()))
    }
}

fn navigation_error(address: &str, e: impl std::fmt::Display) -> RendererError {
    RendererError::Navigation {
        address: address.to_string(),
        message: e.to_string(),
    }
}

fn find<'t>(tab: &'t Tab, locator: &Locator, timeout: Duration) -> Option<Element<'t>> {
    let found = match locator {
        Locator::Css(selector) => tab.wait_for_element_with_custom_timeout(selector, timeout),
        Locator::Xpath(expression) => tab.wait_for_xpath_with_custom_timeout(expression, timeout),
    };
    found.ok()
}

/// Scrolls the element into view and clicks it, falling back to a script click
/// when the native click is intercepted
fn click_element(element: &Element<'_>) -> bool {
    if let Err(e) = element.scroll_into_view() {
        tracing::debug!("Scroll into view failed: {}", e);
    }

    match element.click() {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("Native click failed ({}), using script click", e);
            element
                .call_js_fn("function() { this.click(); }", vec![], false)
                .is_ok()
        }
    }
}

/// Returns true if the document's title marks it as a not-found page
pub fn is_not_found_document(html: &str) -> bool {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("title") else {
        return false;
    };

    document
        .select(&selector)
        .next()
        .map(|title| {
            let title = title.text().collect::<String>().to_lowercase();
            title.contains("404") || title.contains("page not found")
        })
        .unwrap_or(false)
}
