use anyhow::{Result, bail};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use petstore_api::{
    ScenarioFilter, ScenarioRunner, Tag,
    config::{SuiteConfig, load_config},
    scenario::{Scenario, ScenarioOutcome, Verdict, catalog},
};

#[derive(Parser, Debug)]
#[command(
    name = "petstore-api",
    version,
    about = "Pet Store store-endpoint verification suite"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scenario catalog against the configured service
    Run(RunArgs),
    /// List the scenarios in the catalog
    List(SelectArgs),
}

#[derive(Args, Debug, Default)]
struct SelectArgs {
    /// Only scenarios with this tag
    #[arg(long, value_enum)]
    tag: Option<Tag>,
    /// Only the named scenario (repeatable)
    #[arg(long = "scenario", value_name = "NAME")]
    scenarios: Vec<String>,
}

impl SelectArgs {
    fn filter(&self) -> ScenarioFilter {
        ScenarioFilter {
            tag: self.tag,
            names: self.scenarios.clone(),
        }
    }

    fn select(&self) -> Result<Vec<Scenario>> {
        let filter = self.filter();
        let scenarios = catalog();
        let unknown = filter.unknown_names(&scenarios);
        if !unknown.is_empty() {
            bail!("unknown scenario name(s): {}", unknown.join(", "));
        }
        Ok(filter.select(&scenarios))
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Path to the configuration file (defaults to config/petstore.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<Utf8PathBuf>,
    /// Override the service base URI
    #[arg(long, value_name = "URI")]
    base_uri: Option<String>,
    /// Append one JSON line per scenario outcome to this file
    #[arg(long, value_name = "PATH")]
    observations: Option<Utf8PathBuf>,
    /// Print the report as JSON instead of a summary
    #[arg(long, default_value_t = false)]
    json: bool,
    #[command(flatten)]
    select: SelectArgs,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args)?,
        Command::List(args) => list(&args)?,
    }

    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);
    info!(base_uri = %config.base_uri, "running store scenarios");

    let scenarios = args.select.select()?;
    if scenarios.is_empty() {
        bail!("no scenarios match the given filter");
    }

    let runner = ScenarioRunner::from_config(&config)?;
    let report = runner.run(&scenarios);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for outcome in &report.outcomes {
            println!("{}", summary_line(outcome));
        }
        println!("{} passed, {} failed", report.passed(), report.failed());
    }

    if !report.is_success() {
        bail!("{} scenario(s) failed", report.failed());
    }
    Ok(())
}

fn apply_overrides(config: &mut SuiteConfig, args: &RunArgs) {
    if let Some(base_uri) = &args.base_uri {
        config.base_uri = base_uri.clone();
    }
    if let Some(path) = &args.observations {
        config.observations = Some(path.clone());
    }
}

fn list(args: &SelectArgs) -> Result<()> {
    for scenario in args.select()? {
        println!(
            "{:<28} {:<9} {}  {}",
            scenario.name,
            format!("{:?}", scenario.tag).to_lowercase(),
            scenario.expected_status,
            scenario.display_name
        );
    }
    Ok(())
}

fn summary_line(outcome: &ScenarioOutcome) -> String {
    match &outcome.verdict {
        Verdict::Passed => format!("PASS {} ({} ms)", outcome.display_name, outcome.duration_ms),
        Verdict::Failed { category, message } => {
            format!("FAIL {} [{category}] {message}", outcome.display_name)
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
