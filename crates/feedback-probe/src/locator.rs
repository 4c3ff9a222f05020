//! Locator abstraction for element selection and interaction.
//!
//! Locators are strict and auto-wait: an action polls the driver until its
//! target is attached, visible and enabled, and fails with a bounded error
//! otherwise. Queries (`is_visible`, `get_attribute`, ...) look once and
//! return immediately.

use crate::driver::{ElementHandle, PageDriver, Screenshot};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{poll_until, WaitOptions, DEFAULT_NAVIGATION_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// ARIA roles the widget exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AriaRole {
    /// `button`
    Button,
    /// `heading`
    Heading,
    /// `checkbox`
    Checkbox,
    /// `textbox`
    Textbox,
    /// `alert`
    Alert,
}

impl AriaRole {
    /// Role name as written in selectors
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Heading => "heading",
            Self::Checkbox => "checkbox",
            Self::Textbox => "textbox",
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for AriaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an attribute selector compares values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMatch {
    /// `[name="value"]`
    Equals,
    /// `[name*="value"]`
    Contains,
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Text content
    Text {
        /// Text to match
        text: String,
        /// Whole-string, case-sensitive match
        exact: bool,
    },
    /// ARIA role with optional accessible name
    Role {
        /// Role
        role: AriaRole,
        /// Accessible name
        name: Option<String>,
        /// Whole-string, case-sensitive name match
        exact: bool,
        /// Heading level
        level: Option<u8>,
    },
    /// Placeholder attribute
    Placeholder {
        /// Placeholder text
        text: String,
        /// Whole-string, case-sensitive match
        exact: bool,
    },
    /// Associated label text
    Label {
        /// Label text
        text: String,
        /// Whole-string, case-sensitive match
        exact: bool,
    },
    /// CSS attribute selector such as `button[data-value='1']`
    Attribute {
        /// Tag name, if constrained
        tag: Option<String>,
        /// Attribute name
        name: String,
        /// Attribute value
        value: String,
        /// Comparison
        op: AttributeMatch,
    },
}

impl Selector {
    /// Create a substring text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: false,
        }
    }

    /// Create an exact text selector
    #[must_use]
    pub fn text_exact(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            exact: true,
        }
    }

    /// Create a role selector with a substring name match
    #[must_use]
    pub fn role(role: AriaRole, name: impl Into<String>) -> Self {
        Self::Role {
            role,
            name: Some(name.into()),
            exact: false,
            level: None,
        }
    }

    /// Create a placeholder selector
    #[must_use]
    pub fn placeholder(text: impl Into<String>) -> Self {
        Self::Placeholder {
            text: text.into(),
            exact: false,
        }
    }

    /// Create a label selector
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::Label {
            text: text.into(),
            exact: false,
        }
    }

    /// Create an `[name="value"]` selector, optionally constrained to a tag
    #[must_use]
    pub fn attribute(tag: Option<&str>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute {
            tag: tag.map(str::to_string),
            name: name.into(),
            value: value.into(),
            op: AttributeMatch::Equals,
        }
    }

    /// Create an `[name*="value"]` selector
    #[must_use]
    pub fn attribute_contains(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute {
            tag: None,
            name: name.into(),
            value: value.into(),
            op: AttributeMatch::Contains,
        }
    }

    /// Switch the text, name, placeholder or label match to exact
    #[must_use]
    pub fn exact(mut self, value: bool) -> Self {
        match &mut self {
            Self::Text { exact, .. }
            | Self::Role { exact, .. }
            | Self::Placeholder { exact, .. }
            | Self::Label { exact, .. } => *exact = value,
            Self::Attribute { .. } => {}
        }
        self
    }

    /// Constrain a role selector to a heading level
    #[must_use]
    pub fn level(mut self, value: u8) -> Self {
        if let Self::Role { level, .. } = &mut self {
            *level = Some(value);
        }
        self
    }

    /// Whether `element` matches this selector
    #[must_use]
    pub fn matches(&self, element: &ElementHandle) -> bool {
        match self {
            Self::Text { text, exact } => text_matches(text, *exact, &element.text),
            Self::Role {
                role,
                name,
                exact,
                level,
            } => {
                element.role == Some(*role)
                    && name
                        .as_deref()
                        .is_none_or(|n| text_matches(n, *exact, &element.accessible_name))
                    && level.is_none_or(|l| element.level == Some(l))
            }
            Self::Placeholder { text, exact } => element
                .placeholder
                .as_deref()
                .is_some_and(|p| text_matches(text, *exact, p)),
            Self::Label { text, exact } => element
                .label
                .as_deref()
                .is_some_and(|l| text_matches(text, *exact, l)),
            Self::Attribute {
                tag,
                name,
                value,
                op,
            } => {
                tag.as_deref().is_none_or(|t| t == element.tag_name)
                    && element.attribute(name).is_some_and(|actual| match op {
                        AttributeMatch::Equals => actual == *value,
                        AttributeMatch::Contains => actual.contains(value.as_str()),
                    })
            }
        }
    }

    /// Render in Playwright selector-engine syntax
    #[must_use]
    pub fn to_query(&self) -> String {
        let quote = |s: &str, exact: bool| {
            if exact {
                format!("{s:?}s")
            } else {
                format!("{s:?}i")
            }
        };
        match self {
            Self::Text { text, exact } => format!("internal:text={}", quote(text, *exact)),
            Self::Role {
                role,
                name,
                exact,
                level,
            } => {
                let mut query = format!("internal:role={role}");
                if let Some(name) = name {
                    query.push_str(&format!("[name={}]", quote(name, *exact)));
                }
                if let Some(level) = level {
                    query.push_str(&format!("[level={level}]"));
                }
                query
            }
            Self::Placeholder { text, exact } => {
                format!("internal:attr=[placeholder={}]", quote(text, *exact))
            }
            Self::Label { text, exact } => format!("internal:label={}", quote(text, *exact)),
            Self::Attribute {
                tag,
                name,
                value,
                op,
            } => {
                let op = match op {
                    AttributeMatch::Equals => "=",
                    AttributeMatch::Contains => "*=",
                };
                format!("{}[{name}{op}{value:?}]", tag.as_deref().unwrap_or(""))
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Playwright text semantics: exact is whole-string equality after whitespace
/// normalization; otherwise a case-insensitive substring match.
#[must_use]
pub fn text_matches(pattern: &str, exact: bool, candidate: &str) -> bool {
    let pattern = normalize_whitespace(pattern);
    let candidate = normalize_whitespace(candidate);
    if exact {
        candidate == pattern
    } else {
        candidate.to_lowercase().contains(&pattern.to_lowercase())
    }
}

/// Locator options for customizing behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Auto-wait budget and polling interval
    pub wait: WaitOptions,
    /// Whether to require strict single-element match
    pub strict: bool,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            wait: WaitOptions::default(),
            strict: true,
        }
    }
}

/// A selector plus its auto-wait options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    options: LocatorOptions,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            options: LocatorOptions::default(),
        }
    }

    /// Set a custom timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.options.wait.timeout_ms = timeout_ms;
        self
    }

    /// Disable strict mode (allow multiple matches)
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Replace the wait options
    #[must_use]
    pub const fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.options.wait = wait;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }
}

/// A navigable document behind a [`PageDriver`]
#[derive(Debug)]
pub struct Page<D> {
    driver: D,
    wait: WaitOptions,
    navigation_timeout_ms: u64,
}

impl<D: PageDriver> Page<D> {
    /// Wrap a driver with default wait budgets
    #[must_use]
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            wait: WaitOptions::default(),
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
        }
    }

    /// Set the auto-wait options used by new locators
    #[must_use]
    pub const fn with_wait_options(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    /// Set the navigation and load-state timeout
    #[must_use]
    pub const fn with_navigation_timeout(mut self, timeout_ms: u64) -> Self {
        self.navigation_timeout_ms = timeout_ms;
        self
    }

    /// Auto-wait options for new locators
    #[must_use]
    pub const fn wait_options(&self) -> &WaitOptions {
        &self.wait
    }

    /// Borrow the driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Mutably borrow the driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Unwrap the driver
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Element reference for an arbitrary selector
    pub fn locator(&mut self, selector: Selector) -> ElementRef<'_, D> {
        let locator = Locator::new(selector).with_wait(self.wait);
        ElementRef {
            page: self,
            locator,
        }
    }

    /// `getByText` (substring, case-insensitive)
    pub fn get_by_text(&mut self, text: &str) -> ElementRef<'_, D> {
        self.locator(Selector::text(text))
    }

    /// `getByText` with `exact: true`
    pub fn get_by_text_exact(&mut self, text: &str) -> ElementRef<'_, D> {
        self.locator(Selector::text_exact(text))
    }

    /// `getByRole` with an accessible name (substring, case-insensitive)
    pub fn get_by_role(&mut self, role: AriaRole, name: &str) -> ElementRef<'_, D> {
        self.locator(Selector::role(role, name))
    }

    /// `getByPlaceholder`
    pub fn get_by_placeholder(&mut self, text: &str) -> ElementRef<'_, D> {
        self.locator(Selector::placeholder(text))
    }

    /// `getByLabel`
    pub fn get_by_label(&mut self, text: &str) -> ElementRef<'_, D> {
        self.locator(Selector::label(text))
    }

    /// Navigate to `url`
    ///
    /// # Errors
    ///
    /// Propagates driver navigation failures
    pub fn goto_url(&mut self, url: &str) -> ProbeResult<()> {
        tracing::debug!(url, "navigating");
        self.driver.goto(url)
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> String {
        self.driver.url()
    }

    /// Document title
    ///
    /// # Errors
    ///
    /// Propagates driver failures
    pub fn title(&mut self) -> ProbeResult<String> {
        self.driver.title()
    }

    /// Wait until the network is idle, bounded by the navigation timeout
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if requests are still in flight when the budget ends
    pub fn wait_for_network_idle(&mut self) -> ProbeResult<Duration> {
        let options = self.wait.with_timeout(self.navigation_timeout_ms);
        let driver = &mut self.driver;
        let waited = poll_until(|| Ok(driver.is_network_idle()?.then_some(())), &options)?;
        tracing::debug!(elapsed_ms = waited.elapsed.as_millis() as u64, "network idle");
        Ok(waited.elapsed)
    }

    /// Wait until the title equals `expected`
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` with the last observed title on timeout
    pub fn expect_title(&mut self, expected: &str) -> ProbeResult<()> {
        let options = self.wait.with_timeout(self.navigation_timeout_ms);
        let mut last = String::new();
        let driver = &mut self.driver;
        let outcome = poll_until(
            || {
                last = driver.title()?;
                Ok((last == expected).then_some(()))
            },
            &options,
        );
        match outcome {
            Ok(_) => Ok(()),
            Err(ProbeError::Timeout { .. }) => Err(ProbeError::assertion(format!(
                "Expected page title '{expected}' but got '{last}'"
            ))),
            Err(e) => Err(e),
        }
    }

    /// Capture the viewport
    ///
    /// # Errors
    ///
    /// Propagates driver failures
    pub fn screenshot(&mut self) -> ProbeResult<Screenshot> {
        self.driver.screenshot()
    }

    /// Serialized document content
    ///
    /// # Errors
    ///
    /// Propagates driver failures
    pub fn content(&mut self) -> ProbeResult<String> {
        self.driver.content()
    }
}

/// Why a matched element cannot take an action yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blocked {
    Detached,
    Hidden,
    Disabled,
}

impl Blocked {
    const fn describe(self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Hidden => "not visible",
            Self::Disabled => "disabled",
        }
    }
}

/// A located element on a [`Page`]
#[derive(Debug)]
pub struct ElementRef<'p, D> {
    page: &'p mut Page<D>,
    locator: Locator,
}

impl<D: PageDriver> ElementRef<'_, D> {
    /// Use exact matching for text, name, placeholder or label
    #[must_use]
    pub fn exact(mut self) -> Self {
        self.locator.selector = self.locator.selector.exact(true);
        self
    }

    /// Override the auto-wait timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.locator = self.locator.with_timeout(timeout_ms);
        self
    }

    /// Allow more than one match, acting on the first
    #[must_use]
    pub fn non_strict(mut self) -> Self {
        self.locator = self.locator.with_strict(false);
        self
    }

    /// The underlying locator
    #[must_use]
    pub const fn locator(&self) -> &Locator {
        &self.locator
    }

    fn strict_violation(&self, count: usize) -> ProbeError {
        ProbeError::NotActionable {
            selector: self.locator.selector.to_string(),
            reason: format!("ambiguous, matched {count} elements"),
            timeout_ms: self.locator.options.wait.timeout_ms,
        }
    }

    fn pick(&self, matches: Vec<ElementHandle>) -> ProbeResult<Option<ElementHandle>> {
        if self.locator.options.strict && matches.len() > 1 {
            return Err(self.strict_violation(matches.len()));
        }
        Ok(matches.into_iter().next())
    }

    /// Poll until the element is attached, visible and enabled
    fn wait_actionable(&mut self) -> ProbeResult<ElementHandle> {
        let options = self.locator.options.wait;
        let strict = self.locator.options.strict;
        let selector = self.locator.selector.clone();
        let mut blocked = Blocked::Detached;
        let mut ambiguous = None;
        let driver = &mut self.page.driver;

        let outcome = poll_until(
            || {
                let matches = driver.query(&selector)?;
                if strict && matches.len() > 1 {
                    ambiguous = Some(matches.len());
                    return Err(ProbeError::driver("strict mode violation"));
                }
                let Some(element) = matches.into_iter().next() else {
                    blocked = Blocked::Detached;
                    return Ok(None);
                };
                if !element.visible {
                    blocked = Blocked::Hidden;
                    Ok(None)
                } else if !element.enabled {
                    blocked = Blocked::Disabled;
                    Ok(None)
                } else {
                    Ok(Some(element))
                }
            },
            &options,
        );

        match outcome {
            Ok(found) => Ok(found.value),
            Err(_) if ambiguous.is_some() => {
                Err(self.strict_violation(ambiguous.unwrap_or_default()))
            }
            Err(ProbeError::Timeout { .. }) => Err(match blocked {
                Blocked::Detached => ProbeError::NotFound {
                    selector: selector.to_string(),
                    timeout_ms: options.timeout_ms,
                },
                reason => ProbeError::NotActionable {
                    selector: selector.to_string(),
                    reason: reason.describe().to_string(),
                    timeout_ms: options.timeout_ms,
                },
            }),
            Err(e) => Err(e),
        }
    }

    /// Poll until `check` holds for the current matches
    fn expect_state<F>(&mut self, description: &str, mut check: F) -> ProbeResult<()>
    where
        F: FnMut(Option<&ElementHandle>) -> bool,
    {
        let options = self.locator.options.wait;
        let selector = self.locator.selector.clone();
        let driver = &mut self.page.driver;
        let outcome = poll_until(
            || {
                let matches = driver.query(&selector)?;
                Ok(check(matches.first()).then_some(()))
            },
            &options,
        );
        match outcome {
            Ok(_) => Ok(()),
            Err(ProbeError::Timeout { ms }) => Err(ProbeError::assertion(format!(
                "Expected {selector} to be {description} within {ms}ms"
            ))),
            Err(e) => Err(e),
        }
    }

    fn current(&mut self) -> ProbeResult<ElementHandle> {
        let matches = self.page.driver.query(&self.locator.selector)?;
        self.pick(matches)?.ok_or_else(|| ProbeError::NotFound {
            selector: self.locator.selector.to_string(),
            timeout_ms: 0,
        })
    }

    /// Click once the element is actionable
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotActionable` or a driver failure
    pub fn click(&mut self) -> ProbeResult<()> {
        self.wait_actionable()?;
        tracing::trace!(selector = %self.locator.selector, "click");
        self.page.driver.click(&self.locator.selector)
    }

    /// Replace the input value once actionable
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotActionable` or a driver failure
    pub fn fill(&mut self, text: &str) -> ProbeResult<()> {
        self.wait_actionable()?;
        tracing::trace!(selector = %self.locator.selector, chars = text.chars().count(), "fill");
        self.page.driver.fill(&self.locator.selector, text)
    }

    /// Type `text` key by key once actionable
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotActionable` or a driver failure
    pub fn press_sequentially(&mut self, text: &str, delay: Duration) -> ProbeResult<()> {
        self.wait_actionable()?;
        self.page
            .driver
            .press_sequentially(&self.locator.selector, text, delay)
    }

    /// Empty the input once actionable
    ///
    /// # Errors
    ///
    /// `NotFound`, `NotActionable` or a driver failure
    pub fn clear(&mut self) -> ProbeResult<()> {
        self.wait_actionable()?;
        self.page.driver.clear(&self.locator.selector)
    }

    /// Whether a matching element is visible right now
    ///
    /// # Errors
    ///
    /// Strict-mode violation or driver failure
    pub fn is_visible(&mut self) -> ProbeResult<bool> {
        let matches = self.page.driver.query(&self.locator.selector)?;
        Ok(self.pick(matches)?.is_some_and(|e| e.visible))
    }

    /// Whether the element is enabled right now
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches
    pub fn is_enabled(&mut self) -> ProbeResult<bool> {
        Ok(self.current()?.enabled)
    }

    /// Attribute value
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches
    pub fn get_attribute(&mut self, name: &str) -> ProbeResult<Option<String>> {
        Ok(self.current()?.attribute(name))
    }

    /// Text content
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches
    pub fn get_text(&mut self) -> ProbeResult<String> {
        Ok(self.current()?.text)
    }

    /// Current input value
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing matches
    pub fn input_value(&mut self) -> ProbeResult<String> {
        Ok(self.current()?.value)
    }

    /// Number of matching elements
    ///
    /// # Errors
    ///
    /// Propagates driver failures
    pub fn count(&mut self) -> ProbeResult<usize> {
        Ok(self.page.driver.query(&self.locator.selector)?.len())
    }

    /// Wait for the element to be visible
    ///
    /// # Errors
    ///
    /// `AssertionFailed` on timeout
    pub fn expect_visible(&mut self) -> ProbeResult<()> {
        self.expect_state("visible", |e| e.is_some_and(|e| e.visible))
    }

    /// Wait for the element to be hidden or detached
    ///
    /// # Errors
    ///
    /// `AssertionFailed` on timeout
    pub fn expect_hidden(&mut self) -> ProbeResult<()> {
        self.expect_state("hidden", |e| e.is_none_or(|e| !e.visible))
    }

    /// Wait for the element to be enabled
    ///
    /// # Errors
    ///
    /// `AssertionFailed` on timeout
    pub fn expect_enabled(&mut self) -> ProbeResult<()> {
        self.expect_state("enabled", |e| e.is_some_and(|e| e.enabled))
    }

    /// Wait for the element to be disabled
    ///
    /// # Errors
    ///
    /// `AssertionFailed` on timeout
    pub fn expect_disabled(&mut self) -> ProbeResult<()> {
        self.expect_state("disabled", |e| e.is_some_and(|e| !e.enabled))
    }

    /// Wait for the text content to contain `expected`
    ///
    /// # Errors
    ///
    /// `AssertionFailed` on timeout
    pub fn expect_text(&mut self, expected: &str) -> ProbeResult<()> {
        let description = format!("showing text '{expected}'");
        self.expect_state(&description, |e| {
            e.is_some_and(|e| text_matches(expected, false, &e.text))
        })
    }

    /// Wait for the input value to equal `expected`
    ///
    /// # Errors
    ///
    /// `AssertionFailed` on timeout
    pub fn expect_value(&mut self, expected: &str) -> ProbeResult<()> {
        let description = format!("holding value '{expected}'");
        self.expect_state(&description, |e| e.is_some_and(|e| e.value == expected))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{PageFault, SimulatedPage};
    use crate::result::ErrorKind;
    use crate::widget::text;

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(60).with_poll_interval(5)
    }

    fn loaded_page() -> Page<SimulatedPage> {
        let mut page = Page::new(SimulatedPage::new()).with_wait_options(fast());
        page.goto_url("https://docs.example.test/").unwrap();
        page
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_text_matching_modes() {
            assert!(text_matches("submit", false, "SUBMIT"));
            assert!(!text_matches("submit", true, "SUBMIT"));
            assert!(text_matches("Your  email", true, " Your email "));
            assert!(text_matches("Which are you interested", false, "Which are you interested in?"));
        }

        #[test]
        fn test_role_selector_matches() {
            let el = ElementHandle::new("h", "h3", text::TELL_US_MORE)
                .with_role(AriaRole::Heading)
                .with_level(3);
            assert!(Selector::role(AriaRole::Heading, "tell us").matches(&el));
            assert!(Selector::role(AriaRole::Heading, text::TELL_US_MORE)
                .exact(true)
                .level(3)
                .matches(&el));
            assert!(!Selector::role(AriaRole::Heading, text::TELL_US_MORE)
                .level(2)
                .matches(&el));
            assert!(!Selector::role(AriaRole::Button, text::TELL_US_MORE).matches(&el));
        }

        #[test]
        fn test_attribute_selector() {
            let el = ElementHandle::new("b", "button", "1").with_attribute("data-value", "1");
            assert!(Selector::attribute(Some("button"), "data-value", "1").matches(&el));
            assert!(!Selector::attribute(Some("input"), "data-value", "1").matches(&el));
            let alert = ElementHandle::new("a", "span", "")
                .with_attribute("aria-label", "Character count exceeded 300 out of 255");
            assert!(Selector::attribute_contains("aria-label", "Character count exceeded").matches(&alert));
        }

        #[test]
        fn test_to_query() {
            assert_eq!(
                Selector::text_exact("NOT SATISFIED").to_query(),
                "internal:text=\"NOT SATISFIED\"s"
            );
            assert_eq!(
                Selector::role(AriaRole::Heading, "Tell us more").exact(true).level(3).to_query(),
                "internal:role=heading[name=\"Tell us more\"s][level=3]"
            );
            assert_eq!(
                Selector::attribute(Some("button"), "data-value", "2").to_query(),
                "button[data-value=\"2\"]"
            );
        }
    }

    mod element_ref_tests {
        use super::*;

        #[test]
        fn test_click_opens_widget() {
            let mut page = loaded_page();
            page.get_by_role(AriaRole::Button, text::OPEN_BUTTON).click().unwrap();
            page.get_by_text_exact(text::RATING_HEADING).expect_visible().unwrap();
        }

        #[test]
        fn test_missing_element_is_not_found() {
            let mut page = loaded_page();
            let err = page.get_by_text_exact(text::SUBMIT).click().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }

        #[test]
        fn test_hidden_element_is_not_actionable() {
            let mut page = Page::new(
                SimulatedPage::new().with_fault(PageFault::HideElement(text::OPEN_BUTTON.into())),
            )
            .with_wait_options(fast());
            page.goto_url("https://docs.example.test/").unwrap();
            let err = page
                .get_by_role(AriaRole::Button, text::OPEN_BUTTON)
                .click()
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotActionable);
            assert!(err.to_string().contains("not visible"));
        }

        #[test]
        fn test_strict_mode_rejects_ambiguous_match() {
            let mut page = loaded_page();
            page.get_by_role(AriaRole::Button, text::OPEN_BUTTON).click().unwrap();
            let err = page.get_by_role(AriaRole::Button, "Rate").click().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotActionable);
            assert!(err.to_string().contains("matched 6 elements"));
            assert_eq!(page.get_by_role(AriaRole::Button, "Rate").count().unwrap(), 6);
        }

        #[test]
        fn test_disabled_submit_is_not_actionable() {
            let mut page = loaded_page();
            page.get_by_role(AriaRole::Button, text::OPEN_BUTTON).click().unwrap();
            page.get_by_role(AriaRole::Button, "Rate 2 of 6").click().unwrap();
            let mut submit = page.get_by_role(AriaRole::Button, text::SUBMIT).exact();
            assert!(!submit.is_enabled().unwrap());
            submit.expect_disabled().unwrap();
            let err = submit.click().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotActionable);
            assert!(err.to_string().contains("disabled"));
        }

        #[test]
        fn test_fill_and_input_value() {
            let mut page = loaded_page();
            page.get_by_role(AriaRole::Button, text::OPEN_BUTTON).click().unwrap();
            page.get_by_role(AriaRole::Button, "Rate 5 of 6").click().unwrap();
            let mut email = page.get_by_placeholder(text::EMAIL_PLACEHOLDER);
            email.fill("a@b.co").unwrap();
            email.expect_value("a@b.co").unwrap();
            email
                .press_sequentially("m", Duration::ZERO)
                .unwrap();
            assert_eq!(email.input_value().unwrap(), "a@b.com");
            email.clear().unwrap();
            assert_eq!(email.input_value().unwrap(), "");
        }

        #[test]
        fn test_failed_expectation_is_assertion() {
            let mut page = loaded_page();
            let err = page.get_by_text(text::THANK_YOU).expect_visible().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Assertion);
            page.get_by_text(text::THANK_YOU).expect_hidden().unwrap();
        }

        #[test]
        fn test_queries_do_not_wait() {
            let mut page = Page::new(SimulatedPage::new())
                .with_wait_options(WaitOptions::new().with_timeout(10_000));
            page.goto_url("https://docs.example.test/").unwrap();
            let start = std::time::Instant::now();
            assert!(!page.get_by_text(text::SUBMIT).is_visible().unwrap());
            assert!(page.get_by_text(text::SUBMIT).get_text().is_err());
            assert!(start.elapsed() < Duration::from_secs(1));
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn test_title_and_network_idle() {
            let mut page = loaded_page();
            page.expect_title(text::PAGE_TITLE).unwrap();
            page.wait_for_network_idle().unwrap();
            assert_eq!(page.url(), "https://docs.example.test/");
        }

        #[test]
        fn test_wrong_title_fails() {
            let mut page = Page::new(SimulatedPage::new().with_fault(PageFault::WrongTitle))
                .with_wait_options(fast())
                .with_navigation_timeout(30);
            page.goto_url("https://docs.example.test/").unwrap();
            let err = page.expect_title(text::PAGE_TITLE).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Assertion);
        }

        #[test]
        fn test_network_never_idle_times_out() {
            let mut page = Page::new(SimulatedPage::new().with_fault(PageFault::SlowNetwork))
                .with_wait_options(fast())
                .with_navigation_timeout(30);
            page.goto_url("https://docs.example.test/").unwrap();
            assert_eq!(
                page.wait_for_network_idle().unwrap_err().kind(),
                ErrorKind::Timeout
            );
        }
    }
}
