//! In-memory page that renders the rating widget model.
//!
//! [`SimulatedPage`] implements [`PageDriver`] by projecting a
//! [`RatingWidget`] into a flat list of accessible elements, the way the
//! documentation site lays the widget out. Clicks and typing are dispatched
//! back into the model. [`PageFault`]s inject the page-level defects the
//! runner must detect.

use crate::driver::{ElementHandle, PageDriver, Screenshot};
use crate::locator::{AriaRole, Selector};
use crate::result::{ProbeError, ProbeResult};
use crate::validation::{character_count_label, EMAIL_ALERT_LABEL, EMAIL_ALERT_TEXT};
use crate::widget::{text, Interest, RatingWidget, WidgetState};
use std::time::Duration;

/// Network polls needed before a fresh navigation reports idle
pub const DEFAULT_IDLE_AFTER_POLLS: u32 = 2;

/// Defects a simulated page can exhibit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFault {
    /// SUBMIT renders enabled regardless of validation, and clicking it does nothing
    SubmitAlwaysEnabled,
    /// Elements whose accessible name equals this text render hidden
    HideElement(String),
    /// Elements whose accessible name equals this text render disabled
    DisableElement(String),
    /// Network never becomes idle
    SlowNetwork,
    /// Document title is wrong
    WrongTitle,
    /// The first `n` navigations hide the open button
    FlakyLoads(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Open,
    Rate(u8),
    Close,
    Area(&'static str),
    Interest(Interest),
    Submit,
    Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Comment,
    Email,
}

/// A [`PageDriver`] backed by a [`RatingWidget`]
#[derive(Debug, Clone, Default)]
pub struct SimulatedPage {
    widget: RatingWidget,
    url: String,
    loaded: bool,
    pending_polls: u32,
    idle_after_polls: u32,
    navigations: u32,
    faults: Vec<PageFault>,
    history: Vec<String>,
}

impl SimulatedPage {
    /// A blank page; call [`PageDriver::goto`] to load the widget
    #[must_use]
    pub fn new() -> Self {
        Self {
            idle_after_polls: DEFAULT_IDLE_AFTER_POLLS,
            ..Self::default()
        }
    }

    /// Inject a fault
    #[must_use]
    pub fn with_fault(mut self, fault: PageFault) -> Self {
        self.faults.push(fault);
        self
    }

    /// Set how many network polls a navigation takes to settle
    #[must_use]
    pub const fn with_idle_after(mut self, polls: u32) -> Self {
        self.idle_after_polls = polls;
        self
    }

    /// The underlying widget model
    #[must_use]
    pub const fn widget(&self) -> &RatingWidget {
        &self.widget
    }

    /// Actions performed so far, oldest first
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Number of navigations performed
    #[must_use]
    pub const fn navigations(&self) -> u32 {
        self.navigations
    }

    fn has_fault(&self, fault: &PageFault) -> bool {
        self.faults.contains(fault)
    }

    fn load_is_flaky(&self) -> bool {
        self.faults
            .iter()
            .any(|f| matches!(f, PageFault::FlakyLoads(n) if self.navigations <= *n))
    }

    fn apply_faults(&self, element: ElementHandle) -> ElementHandle {
        self.faults.iter().fold(element, |el, fault| match fault {
            PageFault::HideElement(name) if el.accessible_name == *name => el.with_visible(false),
            PageFault::DisableElement(name) if el.accessible_name == *name => {
                el.with_enabled(false)
            }
            _ => el,
        })
    }

    fn button(id: &str, name: &str) -> ElementHandle {
        ElementHandle::new(id, "button", name).with_role(AriaRole::Button)
    }

    fn checkbox(id: String, label: &str, checked: bool) -> ElementHandle {
        ElementHandle::new(id, "input", label)
            .with_role(AriaRole::Checkbox)
            .with_label(label)
            .with_attribute("type", "checkbox")
            .with_attribute("checked", checked.to_string())
    }

    /// Elements currently in the document, in document order
    fn render(&self) -> Vec<ElementHandle> {
        if !self.loaded {
            return Vec::new();
        }
        let mut out = Vec::new();
        match self.widget.form() {
            None if self.widget.state() == WidgetState::Closed => {
                out.push(
                    Self::button("open", text::OPEN_BUTTON).with_visible(!self.load_is_flaky()),
                );
                if let Some(ack) = self.widget.acknowledgment() {
                    out.push(ElementHandle::new("thanks", "p", ack));
                }
            }
            None => {
                out.push(ElementHandle::new("rating-heading", "p", text::RATING_HEADING));
                for n in 1..=6u8 {
                    out.push(
                        Self::button(&format!("rate-{n}"), &n.to_string())
                            .with_name(text::rate_button(n))
                            .with_attribute("data-value", n.to_string()),
                    );
                }
                out.push(ElementHandle::new("low", "span", text::NOT_SATISFIED));
                out.push(ElementHandle::new("high", "span", text::VERY_SATISFIED));
                out.push(Self::button("close-rating", "").with_name(text::CLOSE_RATING_BUTTON));
            }
            Some(form) => {
                let validation = form.validation();
                let polarity = form.polarity();
                let selected = form.contributing_areas();
                let interests = form.interests();

                out.push(
                    ElementHandle::new("tell-us-more", "h3", text::TELL_US_MORE)
                        .with_role(AriaRole::Heading)
                        .with_level(3),
                );
                out.push(ElementHandle::new("q-areas", "p", text::AREAS_QUESTION));
                out.push(ElementHandle::new("q-hint", "p", text::SELECT_ALL));
                for (i, area) in polarity.areas().iter().enumerate() {
                    out.push(Self::checkbox(
                        format!("area-{i}"),
                        area,
                        selected.contains(area),
                    ));
                }
                out.push(ElementHandle::new("q-interests", "p", text::INTERESTS_QUESTION));
                for (i, interest) in Interest::ALL.iter().enumerate() {
                    out.push(Self::checkbox(
                        format!("interest-{i}"),
                        interest.label(),
                        interests.contains(interest),
                    ));
                }
                out.push(ElementHandle::new("q-comment", "p", polarity.comment_question()));
                out.push(
                    ElementHandle::new("comment", "textarea", "")
                        .with_role(AriaRole::Textbox)
                        .with_name(polarity.comment_question())
                        .with_label(polarity.comment_question())
                        .with_placeholder(text::COMMENT_PLACEHOLDER)
                        .with_value(form.comment()),
                );
                if !validation.comment_valid {
                    let label = character_count_label(validation.comment_chars);
                    out.push(
                        ElementHandle::new("comment-alert", "span", "")
                            .with_role(AriaRole::Alert)
                            .with_name(label.clone())
                            .with_attribute("aria-label", label),
                    );
                }
                out.push(ElementHandle::new("q-email", "p", text::EMAIL_QUESTION));
                out.push(
                    ElementHandle::new("email", "input", "")
                        .with_role(AriaRole::Textbox)
                        .with_name(text::EMAIL_QUESTION)
                        .with_label(text::EMAIL_QUESTION)
                        .with_placeholder(text::EMAIL_PLACEHOLDER)
                        .with_attribute("type", "email")
                        .with_value(form.email()),
                );
                if !validation.email_valid {
                    out.push(
                        ElementHandle::new("email-alert", "span", EMAIL_ALERT_TEXT)
                            .with_role(AriaRole::Alert)
                            .with_name(EMAIL_ALERT_LABEL)
                            .with_attribute("aria-label", EMAIL_ALERT_LABEL),
                    );
                }
                let submit_enabled =
                    validation.submit_enabled() || self.has_fault(&PageFault::SubmitAlwaysEnabled);
                out.push(Self::button("submit", text::SUBMIT).with_enabled(submit_enabled));
                out.push(Self::button("close-form", "").with_name(text::CLOSE_FORM_BUTTON));
            }
        }
        out.into_iter().map(|el| self.apply_faults(el)).collect()
    }

    fn resolve(&self, selector: &Selector) -> ProbeResult<ElementHandle> {
        self.render()
            .into_iter()
            .find(|el| selector.matches(el))
            .ok_or_else(|| ProbeError::NotFound {
                selector: selector.to_string(),
                timeout_ms: 0,
            })
    }

    fn action_for(element: &ElementHandle) -> ProbeResult<Action> {
        let id = element.id.as_str();
        let indexed = |prefix: &str| {
            id.strip_prefix(prefix)
                .and_then(|n| n.parse::<usize>().ok())
        };
        if let Some(n) = indexed("rate-") {
            return Ok(Action::Rate(n as u8));
        }
        if id.starts_with("area-") {
            return crate::widget::POSITIVE_AREAS
                .iter()
                .chain(crate::widget::NEGATIVE_AREAS.iter())
                .copied()
                .find(|a| *a == element.text)
                .map(Action::Area)
                .ok_or_else(|| ProbeError::driver(format!("unknown area '{}'", element.text)));
        }
        if let Some(i) = indexed("interest-") {
            return Interest::ALL
                .get(i)
                .map(|interest| Action::Interest(*interest))
                .ok_or_else(|| ProbeError::driver(format!("unknown interest index {i}")));
        }
        match id {
            "open" => Ok(Action::Open),
            "close-rating" | "close-form" => Ok(Action::Close),
            "submit" => Ok(Action::Submit),
            _ => Ok(Action::Focus),
        }
    }

    fn dispatch(&mut self, action: Action) -> ProbeResult<()> {
        let outcome = match &action {
            Action::Open => self.widget.open(),
            Action::Rate(n) => self.widget.select_rating(i64::from(*n)).map(|_| ()),
            Action::Close => self.widget.close(),
            Action::Area(area) => self.widget.toggle_area(area).map(|_| ()),
            Action::Interest(interest) => self.widget.toggle_interest(interest.label()).map(|_| ()),
            Action::Submit => {
                if self.widget.submit_enabled() {
                    self.widget.submit().map(|_| ())
                } else {
                    Ok(())
                }
            }
            Action::Focus => Ok(()),
        };
        self.history.push(format!("{action:?}"));
        outcome.map_err(|e| ProbeError::driver(format!("page rejected {action:?}: {e}")))
    }

    fn field_for(element: &ElementHandle) -> ProbeResult<Field> {
        match element.id.as_str() {
            "comment" => Ok(Field::Comment),
            "email" => Ok(Field::Email),
            other => Err(ProbeError::driver(format!("element '{other}' is not editable"))),
        }
    }

    fn write_field(&mut self, field: Field, value: String) -> ProbeResult<()> {
        self.history.push(format!("{field:?}={} chars", value.chars().count()));
        match field {
            Field::Comment => self.widget.set_comment(value),
            Field::Email => self.widget.set_email(value),
        }
    }
}

impl PageDriver for SimulatedPage {
    fn goto(&mut self, url: &str) -> ProbeResult<()> {
        self.widget = RatingWidget::new();
        self.url = url.to_string();
        self.loaded = true;
        self.navigations += 1;
        self.pending_polls = self.idle_after_polls;
        self.history.clear();
        Ok(())
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn title(&mut self) -> ProbeResult<String> {
        if self.has_fault(&PageFault::WrongTitle) {
            Ok("Page Not Found".to_string())
        } else if self.loaded {
            Ok(text::PAGE_TITLE.to_string())
        } else {
            Ok(String::new())
        }
    }

    fn is_network_idle(&mut self) -> ProbeResult<bool> {
        if self.has_fault(&PageFault::SlowNetwork) {
            return Ok(false);
        }
        if self.pending_polls == 0 {
            Ok(true)
        } else {
            self.pending_polls -= 1;
            Ok(false)
        }
    }

    fn query(&mut self, selector: &Selector) -> ProbeResult<Vec<ElementHandle>> {
        Ok(self
            .render()
            .into_iter()
            .filter(|el| selector.matches(el))
            .collect())
    }

    fn click(&mut self, selector: &Selector) -> ProbeResult<()> {
        let element = self.resolve(selector)?;
        if !element.visible || !element.enabled {
            return Err(ProbeError::driver(format!(
                "click on {selector} intercepted"
            )));
        }
        let action = Self::action_for(&element)?;
        self.dispatch(action)
    }

    fn fill(&mut self, selector: &Selector, text: &str) -> ProbeResult<()> {
        let element = self.resolve(selector)?;
        let field = Self::field_for(&element)?;
        self.write_field(field, text.to_string())
    }

    fn press_sequentially(
        &mut self,
        selector: &Selector,
        text: &str,
        delay: Duration,
    ) -> ProbeResult<()> {
        let element = self.resolve(selector)?;
        let field = Self::field_for(&element)?;
        let mut value = element.value;
        for ch in text.chars() {
            value.push(ch);
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }
        self.write_field(field, value)
    }

    fn screenshot(&mut self) -> ProbeResult<Screenshot> {
        let mut frame = format!("[{}] {}\n", self.widget.state(), self.url);
        for el in self.render().iter().filter(|el| el.visible) {
            let label = if el.text.is_empty() {
                &el.accessible_name
            } else {
                &el.text
            };
            frame.push_str(&format!("  <{}> {label}\n", el.tag_name));
        }
        Ok(Screenshot::with_mime(frame.into_bytes(), "text/plain"))
    }

    fn content(&mut self) -> ProbeResult<String> {
        let mut html = String::from("<body>\n");
        for el in self.render() {
            let mut attrs = format!(" id=\"{}\"", el.id);
            if let Some(role) = el.role {
                attrs.push_str(&format!(" role=\"{role}\""));
            }
            if let Some(placeholder) = &el.placeholder {
                attrs.push_str(&format!(" placeholder=\"{placeholder}\""));
            }
            for (name, value) in &el.attributes {
                attrs.push_str(&format!(" {name}=\"{value}\""));
            }
            if !el.enabled {
                attrs.push_str(" disabled");
            }
            if !el.visible {
                attrs.push_str(" hidden");
            }
            html.push_str(&format!("  <{0}{attrs}>{1}</{0}>\n", el.tag_name, el.text));
        }
        html.push_str("</body>\n");
        Ok(html)
    }
}
