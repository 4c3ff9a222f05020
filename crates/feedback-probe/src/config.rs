//! Environment profiles and run configuration.
//!
//! An [`EnvProfile`] is resolved from a `.env.<name>` file in dotenv syntax,
//! with process environment variables taking precedence over file values. A
//! missing profile file is fatal. [`RunConfig`] holds runner and wait
//! settings and can be loaded from YAML.

use crate::result::{ProbeError, ProbeResult};
use crate::scenario::{RunnerOptions, DEFAULT_RETRIES, DEFAULT_WORKERS};
use crate::wait::{
    WaitOptions, DEFAULT_ACTION_TIMEOUT_MS, DEFAULT_NAVIGATION_TIMEOUT_MS,
    DEFAULT_POLL_INTERVAL_MS,
};
use crate::widget::text;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Profile used when `ENV` is unset
pub const DEFAULT_ENV: &str = "qa";

/// Browser used when `BROWSER` is unset
pub const DEFAULT_BROWSER: &str = "chromium";

/// Base URL used when `URL` is unset
pub const DEFAULT_URL: &str = "https://beta-docs.wogaa.cloud/";

/// Results directory used when `ALLURE_RESULTS_DIR` is unset
pub const DEFAULT_RESULTS_DIR: &str = "target/feedback-probe/results";

/// Report directory used when `ALLURE_REPORT_DIR` is unset
pub const DEFAULT_REPORT_DIR: &str = "target/feedback-probe/report";

/// A resolved environment profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvProfile {
    /// Profile name (`ENV`)
    pub env: String,
    /// Browser name (`BROWSER`)
    pub browser: String,
    /// Base URL under test (`URL`)
    pub url: String,
    /// Where JSON results go (`ALLURE_RESULTS_DIR`)
    pub results_dir: PathBuf,
    /// Where the HTML report goes (`ALLURE_REPORT_DIR`)
    pub report_dir: PathBuf,
    /// Optional YAML run configuration (`RUN_CONFIG`)
    pub run_config: Option<PathBuf>,
}

impl Default for EnvProfile {
    fn default() -> Self {
        Self {
            env: DEFAULT_ENV.to_string(),
            browser: DEFAULT_BROWSER.to_string(),
            url: DEFAULT_URL.to_string(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            report_dir: PathBuf::from(DEFAULT_REPORT_DIR),
            run_config: None,
        }
    }
}

impl EnvProfile {
    /// Path of the profile file for `env` inside `dir`
    #[must_use]
    pub fn path_for(dir: &Path, env: &str) -> PathBuf {
        dir.join(format!(".env.{env}"))
    }

    /// Load the profile named `env` (or `$ENV`, or `qa`) from `dir`
    ///
    /// # Errors
    ///
    /// `ConfigMissing` if the profile file does not exist, `Config` if it
    /// cannot be parsed
    pub fn load(dir: &Path, env: Option<&str>) -> ProbeResult<Self> {
        Self::load_with(dir, env, |key| std::env::var(key).ok())
    }

    /// Like [`Self::load`], reading overrides through `lookup`
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`]
    pub fn load_with<L>(dir: &Path, env: Option<&str>, lookup: L) -> ProbeResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let env = env
            .map(str::to_string)
            .or_else(|| lookup("ENV"))
            .unwrap_or_else(|| DEFAULT_ENV.to_string());
        let path = Self::path_for(dir, &env);
        if !path.is_file() {
            return Err(ProbeError::ConfigMissing {
                path: path.display().to_string(),
            });
        }
        let file = parse_dotenv(&std::fs::read_to_string(&path)?)?;
        let value = |key: &str| lookup(key).or_else(|| file.get(key).cloned());

        let profile = Self {
            browser: value("BROWSER").unwrap_or_else(|| DEFAULT_BROWSER.to_string()),
            url: value("URL").unwrap_or_else(|| DEFAULT_URL.to_string()),
            results_dir: value("ALLURE_RESULTS_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR), PathBuf::from),
            report_dir: value("ALLURE_REPORT_DIR")
                .map_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR), PathBuf::from),
            run_config: value("RUN_CONFIG").map(PathBuf::from),
            env,
        };

        tracing::info!(
            env = %profile.env,
            browser = %profile.browser,
            url = %profile.url,
            results_dir = %profile.results_dir.display(),
            report_dir = %profile.report_dir.display(),
            run_config = ?profile.run_config,
            "loaded environment profile from {}",
            path.display()
        );
        Ok(profile)
    }
}

/// Parse dotenv text: `KEY=VALUE` lines, `#` comments, optional `export`
/// prefix, optional single or double quotes around the value
///
/// # Errors
///
/// `Config` for a non-empty line without `=` or with an empty key
pub fn parse_dotenv(text: &str) -> ProbeResult<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            return Err(ProbeError::config(format!(
                "line {}: expected KEY=VALUE",
                number + 1
            )));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ProbeError::config(format!("line {}: empty key", number + 1)));
        }
        let _ = values.insert(key.to_string(), unquote(value.trim()));
    }
    Ok(values)
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    // Unquoted values end at an inline comment
    value
        .split_once(" #")
        .map_or(value, |(v, _)| v)
        .trim_end()
        .to_string()
}

/// Runner and wait settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Whole-scenario retries
    pub retries: u32,
    /// Worker threads
    pub workers: usize,
    /// Per-scenario budget in milliseconds
    pub scenario_timeout_ms: u64,
    /// Per-action auto-wait budget in milliseconds
    pub action_timeout_ms: u64,
    /// Navigation and network-idle budget in milliseconds
    pub navigation_timeout_ms: u64,
    /// Condition poll interval in milliseconds
    pub poll_interval_ms: u64,
    /// Capture a screenshot into failure diagnostics
    pub screenshot_on_failure: bool,
    /// Title expected after navigation
    pub expected_title: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            workers: DEFAULT_WORKERS,
            scenario_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            screenshot_on_failure: true,
            expected_title: text::PAGE_TITLE.to_string(),
        }
    }
}

impl RunConfig {
    /// Parse and validate YAML; missing keys take defaults
    ///
    /// # Errors
    ///
    /// `Yaml` on malformed input, `Config` if validation fails
    pub fn from_yaml(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file
    ///
    /// # Errors
    ///
    /// `ConfigMissing` if absent, otherwise as [`Self::from_yaml`]
    pub fn load(path: &Path) -> ProbeResult<Self> {
        if !path.is_file() {
            return Err(ProbeError::ConfigMissing {
                path: path.display().to_string(),
            });
        }
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// `Config` describing the first invalid value
    pub fn validate(&self) -> ProbeResult<()> {
        if self.workers == 0 {
            return Err(ProbeError::config("workers must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ProbeError::config("poll_interval_ms must be positive"));
        }
        if self.action_timeout_ms < self.poll_interval_ms {
            return Err(ProbeError::config(
                "action_timeout_ms must not be shorter than poll_interval_ms",
            ));
        }
        Ok(())
    }

    /// Runner settings derived from this config
    #[must_use]
    pub const fn runner_options(&self) -> RunnerOptions {
        RunnerOptions {
            retries: self.retries,
            workers: self.workers,
            scenario_timeout_ms: self.scenario_timeout_ms,
            screenshot_on_failure: self.screenshot_on_failure,
        }
    }

    /// Locator wait settings derived from this config
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.action_timeout_ms)
            .with_poll_interval(self.poll_interval_ms)
    }
}
