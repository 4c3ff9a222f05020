//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// feedback-probe: end-to-end checks for the "Help us improve" rating widget
#[derive(Parser, Debug)]
#[command(name = "feedback-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios and write the report
    Run(RunArgs),

    /// List catalog scenarios
    List(ListArgs),

    /// Show the resolved environment profile and run configuration
    Env(EnvArgs),

    /// Check the widget transition table
    Machine,
}

/// Where the environment profile and run configuration come from
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Environment profile name, reads `.env.<name>`
    #[arg(short, long, env = "ENV")]
    pub env: Option<String>,

    /// Directory holding the `.env.*` files
    #[arg(long, default_value = ".")]
    pub env_dir: PathBuf,

    /// YAML run configuration (overrides `RUN_CONFIG`)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Scenario selection shared by `run` and `list`
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Only scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Only scenarios carrying any of these tags
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Profile source
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Scenario selection
    #[command(flatten)]
    pub select: SelectArgs,

    /// What the scenarios drive
    #[arg(long, value_enum, default_value = "model")]
    pub target: TargetArg,

    /// Fault injected into the simulated page
    #[arg(long, value_enum)]
    pub fault: Option<FaultArg>,

    /// Whole-scenario retries
    #[arg(long)]
    pub retries: Option<u32>,

    /// Worker threads
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Per-scenario budget in milliseconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Leave screenshots out of failure diagnostics
    #[arg(long)]
    pub no_screenshot: bool,

    /// Results directory (overrides `ALLURE_RESULTS_DIR`)
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Report directory (overrides `ALLURE_REPORT_DIR`)
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Scenario selection
    #[command(flatten)]
    pub select: SelectArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the env command
#[derive(Parser, Debug)]
pub struct EnvArgs {
    /// Profile source
    #[command(flatten)]
    pub profile: ProfileArgs,
}

/// Scenario target
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetArg {
    /// The pure widget model
    #[default]
    Model,
    /// The in-memory page through the page objects
    Simulated,
}

/// Fault for the simulated page
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultArg {
    /// SUBMIT stays enabled and does nothing
    SubmitAlwaysEnabled,
    /// The network never becomes idle
    SlowNetwork,
    /// The page title is wrong
    WrongTitle,
    /// The open button is hidden
    HiddenOpenButton,
}

/// Output format argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON on stdout
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_run_defaults() {
            let cli = Cli::parse_from(["feedback-probe", "run"]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.target, TargetArg::Model);
            assert!(args.fault.is_none());
            assert!(args.retries.is_none());
            assert_eq!(args.profile.env_dir, PathBuf::from("."));
            assert_eq!(args.format, FormatArg::Text);
        }

        #[test]
        fn test_parse_run_with_selection() {
            let cli = Cli::parse_from([
                "feedback-probe",
                "run",
                "--filter",
                "negative/",
                "--tag",
                "rating-1",
                "--tag",
                "rating-2",
                "-j",
                "4",
            ]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.select.filter.as_deref(), Some("negative/"));
            assert_eq!(args.select.tags, vec!["rating-1", "rating-2"]);
            assert_eq!(args.workers, Some(4));
        }

        #[test]
        fn test_parse_run_with_fault() {
            let cli = Cli::parse_from([
                "feedback-probe",
                "run",
                "--target",
                "simulated",
                "--fault",
                "submit-always-enabled",
                "--retries",
                "0",
            ]);
            let Commands::Run(args) = cli.command else {
                panic!("expected Run command");
            };
            assert_eq!(args.target, TargetArg::Simulated);
            assert_eq!(args.fault, Some(FaultArg::SubmitAlwaysEnabled));
            assert_eq!(args.retries, Some(0));
        }

        #[test]
        fn test_parse_global_flags() {
            let cli = Cli::parse_from(["feedback-probe", "-vv", "--color", "never", "machine"]);
            assert_eq!(cli.verbose, 2);
            assert_eq!(cli.color, ColorArg::Never);
            assert!(matches!(cli.command, Commands::Machine));
        }

        #[test]
        fn test_parse_list_json() {
            let cli = Cli::parse_from(["feedback-probe", "list", "--format", "json"]);
            let Commands::List(args) = cli.command else {
                panic!("expected List command");
            };
            assert_eq!(args.format, FormatArg::Json);
        }

        #[test]
        fn test_unknown_fault_rejected() {
            let result = Cli::try_parse_from(["feedback-probe", "run", "--fault", "nope"]);
            assert!(result.is_err());
        }
    }
}
