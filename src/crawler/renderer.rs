//! Renderer collaborator interface
//!
//! The crawler never talks to a browser directly. Everything it needs from the
//! page (loading, waiting for elements, clicking, reloading, screenshots) goes
//! through the `Renderer` trait so the control logic can run against a real
//! browser or a scripted stand-in.

use crate::RendererError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    /// CSS selector
    Css(String),
    /// XPath expression
    Xpath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::Xpath(expression.into())
    }

    /// The raw selector or expression
    pub fn expression(&self) -> &str {
        match self {
            Self::Css(s) | Self::Xpath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{}", s),
            Self::Xpath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// An element the renderer located
///
/// Owned and detached from the page: it records how the element was found and
/// the text it held at that moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub locator: Locator,
    pub text: String,
}

impl ElementHandle {
    pub fn new(locator: Locator, text: impl Into<String>) -> Self {
        Self {
            locator,
            text: text.into(),
        }
    }
}

/// A stateful page renderer borrowed by the crawl for the whole session
///
/// All calls block. Implementations must not be shared with another writer while
/// a unit is being crawled.
pub trait Renderer {
    /// Navigates to `address` and blocks until the initial load completes
    fn load(&mut self, address: &str) -> Result<(), RendererError>;

    /// Returns true if the current page is the site's not-found page
    fn is_not_found(&mut self) -> bool;

    /// Waits up to `timeout` for an element, optionally clicking it
    ///
    /// Never fails; returns `None` when the element did not appear (or, with
    /// `click`, could not be clicked) in time.
    fn wait_for_element(
        &mut self,
        locator: &Locator,
        timeout: Duration,
        click: bool,
    ) -> Option<ElementHandle>;

    /// Reloads the current page
    fn refresh(&mut self) -> Result<(), RendererError>;

    /// The address currently shown
    fn current_address(&mut self) -> String;

    /// Screenshots the element as JPEG bytes
    fn capture(&mut self, element: &ElementHandle) -> Result<Vec<u8>, RendererError>;
}
