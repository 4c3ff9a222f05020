//! Reporting of scenario outcomes.
//!
//! [`ReportSink`] receives labels, parameters, steps and attachments as a run
//! progresses. [`Reporter`] is the collecting sink: it keeps everything in
//! memory and renders a JSON results document plus an HTML summary.
//! Attachments are content-addressed by SHA-256 and stored base64-encoded.

use crate::config::EnvProfile;
use crate::result::ProbeResult;
use crate::scenario::{Scenario, ScenarioOutcome, Status};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name of the JSON results document
pub const RESULTS_FILE: &str = "results.json";

/// File name of the HTML summary
pub const HTML_FILE: &str = "index.html";

/// Receives report events
pub trait ReportSink {
    /// A scenario begins
    fn start_scenario(&mut self, scenario: &Scenario);

    /// Attach a label (epic, feature, story, severity, tag, ...)
    fn label(&mut self, name: &str, value: &str);

    /// Record a key/value parameter. Outside a scenario it applies to the run.
    fn record_parameter(&mut self, key: &str, value: &str);

    /// A step begins
    fn begin_step(&mut self, name: &str);

    /// The open step ends
    fn end_step(&mut self, status: Status, duration_ms: u64);

    /// Attach a payload to the current scenario
    fn attach(&mut self, name: &str, payload: &[u8], mime_type: &str);

    /// The current scenario is finished
    fn finish_scenario(&mut self, outcome: &ScenarioOutcome);

    /// Replay a finished outcome as a sequence of events
    fn record_outcome(&mut self, scenario: &Scenario, outcome: &ScenarioOutcome) {
        self.start_scenario(scenario);
        for (name, value) in [
            ("epic", scenario.epic.as_str()),
            ("feature", scenario.feature.as_str()),
            ("story", scenario.story.as_str()),
        ] {
            if !value.is_empty() {
                self.label(name, value);
            }
        }
        self.label("severity", &scenario.severity.to_string());
        for tag in &scenario.tags {
            self.label("tag", tag);
        }
        self.record_parameter("attempts", &outcome.attempts.to_string());

        for step in &outcome.steps {
            self.begin_step(&step.name);
            self.end_step(step.status, step.duration_ms);
        }

        if let Some(diagnostic) = &outcome.diagnostic {
            if let Some((bytes, mime)) = &diagnostic.screenshot {
                self.attach("Failure Screenshot", bytes, mime);
            }
            if let Some(message) = &outcome.error {
                self.attach("Error Details", message.as_bytes(), "text/plain");
            }
            if let Some(content) = &diagnostic.content {
                self.attach("Current Page State", content.as_bytes(), "text/html");
            }
            if let Ok(json) = serde_json::to_vec_pretty(diagnostic) {
                self.attach("Diagnostic", &json, "application/json");
            }
        }
        self.finish_scenario(outcome);
    }
}

/// Record Browser, Environment and Base URL on the run
pub fn attach_env_info(sink: &mut dyn ReportSink, profile: &EnvProfile) {
    sink.record_parameter("Browser", &profile.browser);
    sink.record_parameter("Environment", &profile.env);
    sink.record_parameter("Base URL", &profile.url);
}

/// A name/value label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
    /// Label value
    pub value: String,
}

/// A reported step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Step name
    pub name: String,
    /// Step status; `None` while open
    pub status: Option<Status>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Reference from a scenario to a stored attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Display name
    pub name: String,
    /// SHA-256 of the payload, hex
    pub source: String,
    /// MIME type
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Payload size in bytes
    pub size: usize,
}

/// Everything reported for one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Unique id of this result
    pub uuid: Uuid,
    /// Scenario name
    pub name: String,
    /// Description
    pub description: String,
    /// Final status
    pub status: Option<Status>,
    /// Failure message
    pub error: Option<String>,
    /// Labels
    pub labels: Vec<Label>,
    /// Parameters
    pub parameters: BTreeMap<String, String>,
    /// Steps in order
    pub steps: Vec<StepReport>,
    /// Attachments in order
    pub attachments: Vec<AttachmentRef>,
    /// Start time
    pub start: DateTime<Utc>,
    /// Stop time
    pub stop: Option<DateTime<Utc>>,
}

impl ScenarioReport {
    /// Values of every label named `name`
    #[must_use]
    pub fn labels_named(&self, name: &str) -> Vec<&str> {
        self.labels
            .iter()
            .filter(|l| l.name == name)
            .map(|l| l.value.as_str())
            .collect()
    }
}

/// Serialized form of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    /// Run id
    pub run_id: Uuid,
    /// Suite name
    pub name: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run-level parameters
    pub parameters: BTreeMap<String, String>,
    /// Scenario results in order
    pub results: Vec<ScenarioReport>,
    /// Base64 payloads keyed by SHA-256
    pub attachments: BTreeMap<String, String>,
}

/// Collecting report sink
#[derive(Debug)]
pub struct Reporter {
    run_id: Uuid,
    suite_name: String,
    started_at: DateTime<Utc>,
    parameters: BTreeMap<String, String>,
    results: Vec<ScenarioReport>,
    current: Option<ScenarioReport>,
    attachments: BTreeMap<String, Vec<u8>>,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    /// Create an empty reporter with a fresh run id
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            suite_name: "Feedback Widget Suite".to_string(),
            started_at: Utc::now(),
            parameters: BTreeMap::new(),
            results: Vec::new(),
            current: None,
            attachments: BTreeMap::new(),
        }
    }

    /// Set the suite name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.suite_name = name.into();
        self
    }

    /// Run id
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Run-level parameters
    #[must_use]
    pub const fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Finished scenario reports
    #[must_use]
    pub fn results(&self) -> &[ScenarioReport] {
        &self.results
    }

    /// Stored attachment payload by digest
    #[must_use]
    pub fn attachment(&self, digest: &str) -> Option<&[u8]> {
        self.attachments.get(digest).map(Vec::as_slice)
    }

    /// Number of passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == Some(Status::Passed))
            .count()
    }

    /// Number of scenarios that did not pass
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }

    /// Pass rate (0.0 to 1.0)
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 1.0;
        }
        self.passed_count() as f64 / self.results.len() as f64
    }

    /// One-line summary
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} passed ({:.1}%)",
            self.suite_name,
            self.passed_count(),
            self.results.len(),
            self.pass_rate() * 100.0
        )
    }

    /// Build the serializable document
    #[must_use]
    pub fn document(&self) -> ReportDocument {
        ReportDocument {
            run_id: self.run_id,
            name: self.suite_name.clone(),
            started_at: self.started_at,
            parameters: self.parameters.clone(),
            results: self.results.clone(),
            attachments: self
                .attachments
                .iter()
                .map(|(digest, bytes)| (digest.clone(), BASE64.encode(bytes)))
                .collect(),
        }
    }

    /// Render the JSON results document
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn render_json(&self) -> ProbeResult<String> {
        Ok(serde_json::to_string_pretty(&self.document())?)
    }

    /// Write the JSON results document into `dir`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written
    pub fn write_results(&self, dir: &Path) -> ProbeResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(RESULTS_FILE);
        std::fs::write(&path, self.render_json()?)?;
        tracing::info!(path = %path.display(), results = self.results.len(), "wrote results");
        Ok(path)
    }

    /// Write the HTML summary into `dir`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written
    pub fn write_html(&self, dir: &Path) -> ProbeResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(HTML_FILE);
        std::fs::write(&path, self.render_html())?;
        tracing::info!(path = %path.display(), "wrote report");
        Ok(path)
    }

    /// Render the HTML summary
    #[must_use]
    pub fn render_html(&self) -> String {
        let mut html = String::from(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Feedback Widget Report</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }
        .summary { background: #f5f5f5; padding: 20px; border-radius: 8px; margin-bottom: 20px; }
        .progress-bar { background: #ddd; height: 20px; border-radius: 10px; overflow: hidden; }
        .passed { background: #4caf50; height: 100%; }
        .scenario { padding: 10px; margin: 5px 0; border-radius: 4px; }
        .scenario.pass { background: #e8f5e9; border-left: 4px solid #4caf50; }
        .scenario.fail { background: #ffebee; border-left: 4px solid #f44336; }
        .scenario.broken { background: #fff3e0; border-left: 4px solid #ff9800; }
        .error { color: #d32f2f; font-family: monospace; white-space: pre-wrap; }
        .labels { color: #666; font-size: 0.9em; }
    </style>
</head>
<body>
"#,
        );

        let _ = write!(
            html,
            r#"<div class="summary">
    <h1>{}</h1>
    <h2>Results: {}/{} passed ({:.1}%)</h2>
    <div class="progress-bar">
        <div class="passed" style="width: {:.1}%"></div>
    </div>
"#,
            escape_html(&self.suite_name),
            self.passed_count(),
            self.results.len(),
            self.pass_rate() * 100.0,
            self.pass_rate() * 100.0,
        );
        for (key, value) in &self.parameters {
            let _ = writeln!(
                html,
                "    <p>{}: {}</p>",
                escape_html(key),
                escape_html(value)
            );
        }
        html.push_str("</div>\n<h2>Scenarios</h2>\n");

        for result in &self.results {
            let class = match result.status {
                Some(Status::Passed) => "pass",
                Some(Status::Failed) => "fail",
                _ => "broken",
            };
            let status = result
                .status
                .map_or_else(|| "unknown".to_string(), |s| s.to_string());
            let _ = writeln!(
                html,
                r#"<div class="scenario {class}">
    <strong>{}</strong> - {status}
    <div class="labels">{}</div>"#,
                escape_html(&result.name),
                escape_html(&result.labels_named("story").join(", ")),
            );
            if let Some(error) = &result.error {
                let _ = writeln!(html, r#"    <div class="error">{}</div>"#, escape_html(error));
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    fn current_mut(&mut self) -> Option<&mut ScenarioReport> {
        if self.current.is_none() {
            tracing::warn!("report event outside a scenario ignored");
        }
        self.current.as_mut()
    }
}

impl ReportSink for Reporter {
    fn start_scenario(&mut self, scenario: &Scenario) {
        if let Some(unfinished) = self.current.take() {
            tracing::warn!(scenario = %unfinished.name, "scenario report not finished");
            self.results.push(unfinished);
        }
        self.current = Some(ScenarioReport {
            uuid: Uuid::new_v4(),
            name: scenario.name.clone(),
            description: scenario.description.clone(),
            status: None,
            error: None,
            labels: Vec::new(),
            parameters: BTreeMap::new(),
            steps: Vec::new(),
            attachments: Vec::new(),
            start: Utc::now(),
            stop: None,
        });
    }

    fn label(&mut self, name: &str, value: &str) {
        if let Some(current) = self.current_mut() {
            current.labels.push(Label {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    fn record_parameter(&mut self, key: &str, value: &str) {
        match self.current.as_mut() {
            Some(current) => {
                let _ = current.parameters.insert(key.to_string(), value.to_string());
            }
            None => {
                let _ = self.parameters.insert(key.to_string(), value.to_string());
            }
        }
    }

    fn begin_step(&mut self, name: &str) {
        if let Some(current) = self.current_mut() {
            current.steps.push(StepReport {
                name: name.to_string(),
                status: None,
                duration_ms: 0,
            });
        }
    }

    fn end_step(&mut self, status: Status, duration_ms: u64) {
        let open = self
            .current_mut()
            .and_then(|c| c.steps.iter_mut().rev().find(|s| s.status.is_none()));
        if let Some(step) = open {
            step.status = Some(status);
            step.duration_ms = duration_ms;
        }
    }

    fn attach(&mut self, name: &str, payload: &[u8], mime_type: &str) {
        let digest = hex_digest(payload);
        let reference = AttachmentRef {
            name: name.to_string(),
            source: digest.clone(),
            mime_type: mime_type.to_string(),
            size: payload.len(),
        };
        let Some(current) = self.current_mut() else {
            return;
        };
        current.attachments.push(reference);
        let _ = self
            .attachments
            .entry(digest)
            .or_insert_with(|| payload.to_vec());
    }

    fn finish_scenario(&mut self, outcome: &ScenarioOutcome) {
        if let Some(mut current) = self.current.take() {
            current.status = Some(outcome.status);
            current.error.clone_from(&outcome.error);
            current.start = outcome.started_at;
            current.stop = TimeDelta::from_std(outcome.duration)
                .ok()
                .and_then(|elapsed| outcome.started_at.checked_add_signed(elapsed))
                .or(Some(outcome.started_at));
            self.results.push(current);
        }
    }
}

fn hex_digest(payload: &[u8]) -> String {
    Sha256::digest(payload)
        .iter()
        .fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
