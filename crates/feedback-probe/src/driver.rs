//! PageDriver - abstract page automation trait
//!
//! A browser binding implements [`PageDriver`] to give the rest of the crate
//! primitive, non-waiting access to a live document. Auto-waiting, strictness
//! and assertions are layered on top by [`crate::locator`], so drivers stay
//! thin: resolve a [`Selector`] to element snapshots and perform one action.
//!
//! [`crate::mock::SimulatedPage`] is the in-process implementation used by the
//! test suite.

use crate::locator::{AriaRole, Selector};
use crate::result::ProbeResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Point-in-time view of one element in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// ARIA role, if any
    pub role: Option<AriaRole>,
    /// Accessible name (defaults to text content)
    pub accessible_name: String,
    /// Text content
    pub text: String,
    /// Associated `<label>` text
    pub label: Option<String>,
    /// Placeholder attribute
    pub placeholder: Option<String>,
    /// Current input value
    pub value: String,
    /// Heading level for headings
    pub level: Option<u8>,
    /// Whether the element is rendered and visible
    pub visible: bool,
    /// Whether the element accepts interaction
    pub enabled: bool,
    /// Remaining attributes
    pub attributes: BTreeMap<String, String>,
}

impl ElementHandle {
    /// Create a visible, enabled element with the given tag and text
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            role: None,
            accessible_name: text.clone(),
            text,
            label: None,
            placeholder: None,
            value: String::new(),
            level: None,
            visible: true,
            enabled: true,
            attributes: BTreeMap::new(),
        }
    }

    /// Set the ARIA role
    #[must_use]
    pub const fn with_role(mut self, role: AriaRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the accessible name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.accessible_name = name.into();
        self
    }

    /// Set the label text
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the placeholder
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set the input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the heading level
    #[must_use]
    pub const fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    /// Set the enabled flag
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the visibility flag
    #[must_use]
    pub const fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Look up an attribute, including the well-known ones stored as fields
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "placeholder" => self.placeholder.clone(),
            "value" => Some(self.value.clone()),
            _ => self.attributes.get(name).cloned(),
        }
    }
}

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Encoded image (or text rendering for simulated pages)
    pub data: Vec<u8>,
    /// MIME type of `data`
    pub mime_type: String,
    /// Timestamp when screenshot was taken
    pub timestamp: SystemTime,
}

impl Screenshot {
    /// Create a PNG screenshot
    #[must_use]
    pub fn png(data: Vec<u8>) -> Self {
        Self::with_mime(data, "image/png")
    }

    /// Create a screenshot with an explicit MIME type
    #[must_use]
    pub fn with_mime(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            timestamp: SystemTime::now(),
        }
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Primitive page automation.
///
/// Every method acts immediately: no method waits for an element to appear.
/// Callers wanting auto-wait go through [`crate::locator::Page`].
pub trait PageDriver {
    /// Navigate to `url`, replacing the current document
    fn goto(&mut self, url: &str) -> ProbeResult<()>;

    /// Current URL
    fn url(&self) -> String;

    /// Document title
    fn title(&mut self) -> ProbeResult<String>;

    /// Whether no network requests are in flight
    fn is_network_idle(&mut self) -> ProbeResult<bool>;

    /// All elements matching `selector`, in document order
    fn query(&mut self, selector: &Selector) -> ProbeResult<Vec<ElementHandle>>;

    /// Click the single element matching `selector`
    fn click(&mut self, selector: &Selector) -> ProbeResult<()>;

    /// Replace the value of the input matching `selector`
    fn fill(&mut self, selector: &Selector, text: &str) -> ProbeResult<()>;

    /// Type `text` key by key, appending to the current value
    fn press_sequentially(&mut self, selector: &Selector, text: &str, delay: Duration)
        -> ProbeResult<()>;

    /// Empty the input matching `selector`
    fn clear(&mut self, selector: &Selector) -> ProbeResult<()> {
        self.fill(selector, "")
    }

    /// Capture the viewport
    fn screenshot(&mut self) -> ProbeResult<Screenshot>;

    /// Serialized document content
    fn content(&mut self) -> ProbeResult<String>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_new_defaults() {
            let el = ElementHandle::new("e1", "button", "SUBMIT");
            assert!(el.visible);
            assert!(el.enabled);
            assert_eq!(el.accessible_name, "SUBMIT");
            assert!(el.role.is_none());
        }

        #[test]
        fn test_builder_chain() {
            let el = ElementHandle::new("e2", "textarea", "")
                .with_role(AriaRole::Textbox)
                .with_placeholder("Type your reply here")
                .with_value("hello")
                .with_enabled(false)
                .with_attribute("aria-label", "reply");
            assert_eq!(el.attribute("placeholder").as_deref(), Some("Type your reply here"));
            assert_eq!(el.attribute("value").as_deref(), Some("hello"));
            assert_eq!(el.attribute("aria-label").as_deref(), Some("reply"));
            assert_eq!(el.attribute("missing"), None);
            assert!(!el.enabled);
        }
    }

    mod screenshot_tests {
        use super::*;

        #[test]
        fn test_png() {
            let shot = Screenshot::png(vec![0x89, b'P', b'N', b'G']);
            assert_eq!(shot.mime_type, "image/png");
            assert_eq!(shot.size(), 4);
        }
    }
}
