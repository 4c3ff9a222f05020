//! Page objects for the documentation site and its rating widget.
//!
//! Each page object borrows the scenario's [`Page`] for as long as it is
//! used; there is no shared or global page handle.

use crate::driver::PageDriver;
use crate::locator::{AriaRole, Page, Selector};
use crate::result::{ProbeError, ProbeResult};
use crate::validation::{
    parse_character_count, CHARACTER_COUNT_LABEL_PREFIX, COMMENT_MAX_CHARS, EMAIL_ALERT_LABEL,
    EMAIL_ALERT_TEXT,
};
use crate::widget::{text, Interest, Polarity, MAX_RATING, MIN_RATING};
use std::time::Duration;

/// Trait for page objects representing a page or component in the UI.
pub trait PageObject<D: PageDriver> {
    /// The page this object drives
    fn page(&mut self) -> &mut Page<D>;

    /// Get the page name for logging/debugging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Click the button whose accessible name is exactly `name`
    ///
    /// # Errors
    ///
    /// `NotFound` or `NotActionable` if the button cannot be clicked
    fn click_button_by_role_and_name(&mut self, name: &str) -> ProbeResult<()> {
        self.page().get_by_role(AriaRole::Button, name).exact().click()
    }
}

/// Site-level navigation
#[derive(Debug)]
pub struct BasePage<'a, D> {
    page: &'a mut Page<D>,
    expected_title: String,
}

impl<'a, D: PageDriver> BasePage<'a, D> {
    /// Wrap a page, expecting the documentation site title
    pub fn new(page: &'a mut Page<D>) -> Self {
        Self {
            page,
            expected_title: text::PAGE_TITLE.to_string(),
        }
    }

    /// Expect a different document title after navigation
    #[must_use]
    pub fn with_expected_title(mut self, title: impl Into<String>) -> Self {
        self.expected_title = title.into();
        self
    }

    /// Load `url`, check the title, and wait for the network to settle
    ///
    /// # Errors
    ///
    /// `AssertionFailed` on a title mismatch, `Timeout` if the network never idles
    pub fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.page.goto_url(url)?;
        self.page.expect_title(&self.expected_title)?;
        let _ = self.page.wait_for_network_idle()?;
        tracing::debug!(url, title = %self.expected_title, "page ready");
        Ok(())
    }

    /// Click the ribbon button that opens the widget
    ///
    /// # Errors
    ///
    /// `NotFound` or `NotActionable` if the button cannot be clicked
    pub fn open_widget(&mut self) -> ProbeResult<()> {
        self.click_button_by_role_and_name(text::OPEN_BUTTON)
    }
}

impl<D: PageDriver> PageObject<D> for BasePage<'_, D> {
    fn page(&mut self) -> &mut Page<D> {
        self.page
    }
}

/// The rating prompt
#[derive(Debug)]
pub struct RatingWidgetPage<'a, D> {
    page: &'a mut Page<D>,
}

impl<'a, D: PageDriver> RatingWidgetPage<'a, D> {
    /// Wrap a page
    pub fn new(page: &'a mut Page<D>) -> Self {
        Self { page }
    }

    /// # Errors
    ///
    /// `AssertionFailed` if the heading is not visible
    pub fn verify_rating_heading(&mut self) -> ProbeResult<()> {
        self.page.get_by_text_exact(text::RATING_HEADING).expect_visible()
    }

    /// # Errors
    ///
    /// `AssertionFailed` if the heading stays visible
    pub fn verify_rating_heading_hidden(&mut self) -> ProbeResult<()> {
        self.page.get_by_text_exact(text::RATING_HEADING).expect_hidden()
    }

    /// Every `button[data-value='n']` for n in 1..=6 is visible
    ///
    /// # Errors
    ///
    /// `AssertionFailed` naming the first missing button
    pub fn verify_all_rating_buttons(&mut self) -> ProbeResult<()> {
        for n in MIN_RATING..=MAX_RATING {
            self.page
                .locator(Selector::attribute(Some("button"), "data-value", n.to_string()))
                .expect_visible()?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// `AssertionFailed` if either end label is missing
    pub fn verify_satisfaction_labels(&mut self) -> ProbeResult<()> {
        self.page.get_by_text_exact(text::NOT_SATISFIED).expect_visible()?;
        self.page.get_by_text_exact(text::VERY_SATISFIED).expect_visible()
    }

    /// Click "Rate n of 6"
    ///
    /// # Errors
    ///
    /// `NotFound` for ratings the prompt does not render
    pub fn click_rating_button(&mut self, n: u8) -> ProbeResult<()> {
        tracing::debug!(rating = n, "clicking rating button");
        self.page
            .get_by_role(AriaRole::Button, &text::rate_button(n))
            .click()
    }

    /// The level-3 "Tell us more" heading is visible
    ///
    /// # Errors
    ///
    /// `AssertionFailed` if it is not
    pub fn verify_tell_us_more_heading(&mut self) -> ProbeResult<()> {
        self.page
            .locator(
                Selector::role(AriaRole::Heading, text::TELL_US_MORE)
                    .exact(true)
                    .level(3),
            )
            .expect_visible()
    }

    /// Close the rating prompt
    ///
    /// # Errors
    ///
    /// `NotFound` if the close button is absent
    pub fn close(&mut self) -> ProbeResult<()> {
        self.click_button_by_role_and_name(text::CLOSE_RATING_BUTTON)
    }
}

impl<D: PageDriver> PageObject<D> for RatingWidgetPage<'_, D> {
    fn page(&mut self) -> &mut Page<D> {
        self.page
    }
}

/// The "Tell us more" feedback form
#[derive(Debug)]
pub struct TellUsMorePage<'a, D> {
    page: &'a mut Page<D>,
    typing_delay: Duration,
}

impl<'a, D: PageDriver> TellUsMorePage<'a, D> {
    /// Wrap a page
    pub fn new(page: &'a mut Page<D>) -> Self {
        Self {
            page,
            typing_delay: Duration::ZERO,
        }
    }

    /// Delay between keystrokes for `type_*` methods
    #[must_use]
    pub const fn with_typing_delay(mut self, delay: Duration) -> Self {
        self.typing_delay = delay;
        self
    }

    /// Every question for `polarity` is visible
    ///
    /// # Errors
    ///
    /// `AssertionFailed` naming the first missing question
    pub fn verify_feedback_form_questions(&mut self, polarity: Polarity) -> ProbeResult<()> {
        for question in [
            text::AREAS_QUESTION,
            text::SELECT_ALL,
            text::INTERESTS_QUESTION,
            polarity.comment_question(),
            text::EMAIL_QUESTION,
        ] {
            self.page.get_by_text(question).expect_visible()?;
        }
        Ok(())
    }

    /// Every answer control for `polarity` is visible
    ///
    /// # Errors
    ///
    /// `AssertionFailed` naming the first missing control
    pub fn verify_form_elements(&mut self, polarity: Polarity) -> ProbeResult<()> {
        for area in polarity.areas() {
            self.page.get_by_text_exact(area).expect_visible()?;
        }
        for interest in Interest::ALL {
            self.page.get_by_label(interest.label()).expect_visible()?;
        }
        self.page
            .get_by_placeholder(text::COMMENT_PLACEHOLDER)
            .expect_visible()?;
        self.page
            .get_by_placeholder(text::EMAIL_PLACEHOLDER)
            .expect_visible()?;
        self.submit_button().expect_visible()
    }

    fn submit_button(&mut self) -> crate::locator::ElementRef<'_, D> {
        self.page.get_by_role(AriaRole::Button, text::SUBMIT).exact()
    }

    /// Click a contributing-area checkbox by its text
    ///
    /// # Errors
    ///
    /// `NotFound` if the area is not offered
    pub fn toggle_area(&mut self, area: &str) -> ProbeResult<()> {
        self.page.get_by_text_exact(area).click()
    }

    /// Click an interest checkbox by its label
    ///
    /// # Errors
    ///
    /// `NotFound` if the checkbox is absent
    pub fn toggle_interest(&mut self, label: &str) -> ProbeResult<()> {
        self.page.get_by_label(label).exact().click()
    }

    /// Tick every optional interest that is not ticked yet
    ///
    /// # Errors
    ///
    /// `NotFound` if a checkbox is absent
    pub fn select_optional_interests(&mut self) -> ProbeResult<()> {
        for interest in Interest::ALL {
            let mut checkbox = self.page.get_by_label(interest.label()).exact();
            if checkbox.get_attribute("checked")?.as_deref() != Some("true") {
                checkbox.click()?;
            }
        }
        Ok(())
    }

    /// Replace the comment
    ///
    /// # Errors
    ///
    /// `NotFound` if the textarea is absent
    pub fn fill_comment(&mut self, comment: &str) -> ProbeResult<()> {
        self.page.get_by_placeholder(text::COMMENT_PLACEHOLDER).fill(comment)
    }

    /// Type the comment key by key
    ///
    /// # Errors
    ///
    /// `NotFound` if the textarea is absent
    pub fn type_comment(&mut self, comment: &str) -> ProbeResult<()> {
        let delay = self.typing_delay;
        self.page
            .get_by_placeholder(text::COMMENT_PLACEHOLDER)
            .press_sequentially(comment, delay)
    }

    /// Replace the email
    ///
    /// # Errors
    ///
    /// `NotFound` if the input is absent
    pub fn fill_email(&mut self, email: &str) -> ProbeResult<()> {
        self.page.get_by_placeholder(text::EMAIL_PLACEHOLDER).fill(email)
    }

    /// Type the email key by key
    ///
    /// # Errors
    ///
    /// `NotFound` if the input is absent
    pub fn type_email(&mut self, email: &str) -> ProbeResult<()> {
        let delay = self.typing_delay;
        self.page
            .get_by_placeholder(text::EMAIL_PLACEHOLDER)
            .press_sequentially(email, delay)
    }

    /// Empty comment and email
    ///
    /// # Errors
    ///
    /// `NotFound` if either field is absent
    pub fn clear_all_fields(&mut self) -> ProbeResult<()> {
        self.page.get_by_placeholder(text::COMMENT_PLACEHOLDER).clear()?;
        self.page.get_by_placeholder(text::EMAIL_PLACEHOLDER).clear()
    }

    /// Current comment value
    ///
    /// # Errors
    ///
    /// `NotFound` if the textarea is absent
    pub fn comment_value(&mut self) -> ProbeResult<String> {
        self.page
            .get_by_placeholder(text::COMMENT_PLACEHOLDER)
            .input_value()
    }

    /// Current email value
    ///
    /// # Errors
    ///
    /// `NotFound` if the input is absent
    pub fn email_value(&mut self) -> ProbeResult<String> {
        self.page
            .get_by_placeholder(text::EMAIL_PLACEHOLDER)
            .input_value()
    }

    /// Count reported by the character-count alert, if it is shown
    ///
    /// # Errors
    ///
    /// Strict-mode violation or driver failure
    pub fn character_count(&mut self) -> ProbeResult<Option<usize>> {
        let mut alert = self
            .page
            .locator(Selector::attribute_contains("aria-label", CHARACTER_COUNT_LABEL_PREFIX));
        if alert.count()? == 0 {
            return Ok(None);
        }
        Ok(alert
            .get_attribute("aria-label")?
            .as_deref()
            .and_then(parse_character_count))
    }

    /// Whether the invalid-email alert is shown right now
    ///
    /// # Errors
    ///
    /// Strict-mode violation or driver failure
    pub fn email_alert_visible(&mut self) -> ProbeResult<bool> {
        self.page
            .locator(Selector::attribute(None, "aria-label", EMAIL_ALERT_LABEL))
            .is_visible()
    }

    /// Wait for both validation alerts to appear
    ///
    /// # Errors
    ///
    /// `AssertionFailed` if either never appears
    pub fn wait_for_validation_messages(&mut self) -> ProbeResult<()> {
        self.page
            .locator(Selector::attribute_contains("aria-label", CHARACTER_COUNT_LABEL_PREFIX))
            .expect_visible()?;
        self.page
            .locator(Selector::attribute(None, "aria-label", EMAIL_ALERT_LABEL))
            .expect_visible()
    }

    /// The character-count alert is visible and reports more than 255
    ///
    /// # Errors
    ///
    /// `AssertionFailed` if the alert is missing or the count is within bounds
    pub fn verify_character_count_exceeded(&mut self) -> ProbeResult<usize> {
        self.page
            .locator(Selector::attribute_contains("aria-label", CHARACTER_COUNT_LABEL_PREFIX))
            .expect_visible()?;
        let count = self.character_count()?.ok_or_else(|| {
            ProbeError::assertion("character count alert has no parsable count")
        })?;
        if count <= COMMENT_MAX_CHARS {
            return Err(ProbeError::assertion(format!(
                "Expected character count above {COMMENT_MAX_CHARS} but got {count}"
            )));
        }
        Ok(count)
    }

    /// The invalid-email alert is visible with its message
    ///
    /// # Errors
    ///
    /// `AssertionFailed` if the alert or its text is missing
    pub fn verify_email_validation(&mut self) -> ProbeResult<()> {
        let mut alert = self
            .page
            .locator(Selector::attribute(None, "aria-label", EMAIL_ALERT_LABEL));
        alert.expect_visible()?;
        alert.expect_text(EMAIL_ALERT_TEXT)
    }

    /// # Errors
    ///
    /// `AssertionFailed` if SUBMIT stays disabled
    pub fn verify_submit_enabled(&mut self) -> ProbeResult<()> {
        self.submit_button().expect_enabled()
    }

    /// # Errors
    ///
    /// `AssertionFailed` if SUBMIT stays enabled
    pub fn verify_submit_disabled(&mut self) -> ProbeResult<()> {
        self.submit_button().expect_disabled()
    }

    /// Whether SUBMIT is enabled right now
    ///
    /// # Errors
    ///
    /// `NotFound` if the button is absent
    pub fn submit_enabled(&mut self) -> ProbeResult<bool> {
        self.submit_button().is_enabled()
    }

    /// Click SUBMIT
    ///
    /// # Errors
    ///
    /// `NotActionable` while the button is disabled
    pub fn submit(&mut self) -> ProbeResult<()> {
        self.submit_button().click()
    }

    /// # Errors
    ///
    /// `AssertionFailed` if the acknowledgment never shows
    pub fn verify_thank_you(&mut self) -> ProbeResult<()> {
        self.page.get_by_text(text::THANK_YOU).expect_visible()
    }

    /// Close the form
    ///
    /// # Errors
    ///
    /// `NotFound` if the close button is absent
    pub fn close(&mut self) -> ProbeResult<()> {
        self.click_button_by_role_and_name(text::CLOSE_FORM_BUTTON)
    }

    /// Type an over-long comment and an invalid email, then check both alerts
    /// and that SUBMIT is disabled. Returns the reported character count.
    ///
    /// # Errors
    ///
    /// `AssertionFailed` at the first check that does not hold
    pub fn perform_combined_validation(
        &mut self,
        long_comment: &str,
        invalid_email: &str,
    ) -> ProbeResult<usize> {
        self.type_comment(long_comment)?;
        self.type_email(invalid_email)?;
        self.wait_for_validation_messages()?;
        let count = self.verify_character_count_exceeded()?;
        self.verify_email_validation()?;
        self.verify_submit_disabled()?;
        Ok(count)
    }
}

impl<D: PageDriver> PageObject<D> for TellUsMorePage<'_, D> {
    fn page(&mut self) -> &mut Page<D> {
        self.page
    }
}
