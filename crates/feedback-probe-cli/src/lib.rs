//! feedback-probe CLI library
//!
//! Command-line front end for the feedback-probe scenario runner.
//!
//! ## Usage
//!
//! ```bash
//! feedback-probe run                          # Whole catalog against the model
//! feedback-probe run --tag rating-1           # One rating
//! feedback-probe run --target simulated \
//!     --fault submit-always-enabled           # Against a faulty simulated page
//! feedback-probe list --filter negative/      # Show scenario names
//! feedback-probe env --env uat                # Show the resolved profile
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, EnvArgs, FaultArg, FormatArg, ListArgs, ProfileArgs, RunArgs,
    SelectArgs, TargetArg,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{OutputFormat, ProgressReporter};
pub use runner::{
    apply_overrides, load_settings, page_fault, selected_scenarios, selection, RunSummary,
    SuiteRunner,
};
