//! feedback-probe: run rating-widget scenarios from the command line
//!
//! ## Usage
//!
//! ```bash
//! feedback-probe run --env qa         # Run the catalog with .env.qa
//! feedback-probe list --tag rating-6  # Show matching scenarios
//! feedback-probe machine              # Check the transition table
//! ```

use clap::Parser;
use feedback_probe::{analyze_machine, TRANSITIONS};
use feedback_probe_cli::{
    load_settings, selected_scenarios, Cli, CliConfig, CliError, CliResult, Commands, EnvArgs,
    ListArgs, OutputFormat, RunArgs, SuiteRunner, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    match cli.command {
        Commands::Run(args) => run_scenarios(config, &args),
        Commands::List(args) => run_list(&args),
        Commands::Env(args) => run_env(&args),
        Commands::Machine => run_machine(),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let format = match &cli.command {
        Commands::Run(args) => OutputFormat::from(args.format),
        _ => OutputFormat::Text,
    };
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_format(format)
}

fn init_tracing(verbosity: Verbosity) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity.log_filter())),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_scenarios(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let format = config.format;
    let mut runner = SuiteRunner::new(config);
    let summary = runner.run(args)?;

    if format == OutputFormat::Json {
        println!("{}", summary.report.render_json()?);
    }

    let failed = summary.suite.failed();
    if failed > 0 {
        return Err(CliError::scenario_run(format!(
            "{failed} of {} scenario(s) did not pass",
            summary.suite.total()
        )));
    }
    Ok(())
}

fn run_list(args: &ListArgs) -> CliResult<()> {
    let scenarios = selected_scenarios(&args.select);
    match OutputFormat::from(args.format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&scenarios)?),
        OutputFormat::Text => {
            for scenario in &scenarios {
                println!(
                    "{:<52} {:<9} [{}]",
                    scenario.name,
                    scenario.severity.to_string(),
                    scenario.tags.join(", ")
                );
            }
            println!("{} scenario(s)", scenarios.len());
        }
    }
    Ok(())
}

fn run_env(args: &EnvArgs) -> CliResult<()> {
    let (profile, config) = load_settings(&args.profile)?;
    let shown = serde_json::json!({
        "profile": profile,
        "run_config": config,
    });
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn run_machine() -> CliResult<()> {
    for (from, event, to) in TRANSITIONS {
        println!("{from} --{event:?}--> {to}");
    }

    let report = analyze_machine();
    if report.is_sound() {
        println!("transition table is sound");
        return Ok(());
    }
    Err(CliError::config(format!(
        "transition table defects: dead ends {:?}, cannot return {:?}, non-deterministic {:?}",
        report.dead_ends, report.cannot_return, report.non_deterministic
    )))
}
