//! republish-npm CLI
//!
//! Republish the historical versions of an npm package under a new name

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use republish_npm::orchestration::confirm_or_skip;
use republish_npm::{
    CliFlags, ConfigLoadOptions, ConfigLoader, ConsoleReporter, NpmPlugin, RepublishError,
    RepublishOptions, Republisher, Reporter,
};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

/// Republish past versions of an npm package under a new name
#[derive(Parser)]
#[command(name = "republish-npm")]
#[command(version)]
#[command(about = "Republish past versions of an npm package under a new name", long_about = None)]
struct Cli {
    /// Source package name
    #[arg(short, long)]
    from: Option<String>,

    /// Target package name
    #[arg(short, long)]
    to: Option<String>,

    /// Registry used for both reading and publishing
    #[arg(short, long)]
    registry: Option<String>,

    /// Registry to read versions from (requires --to-registry)
    #[arg(long)]
    from_registry: Option<String>,

    /// Comma-separated registries to publish to (requires --from-registry)
    #[arg(long)]
    to_registry: Option<String>,

    /// Only these versions (comma-separated)
    #[arg(long)]
    versions: Option<String>,

    /// Skip these versions (comma-separated)
    #[arg(long)]
    exclude_versions: Option<String>,

    /// Do everything except the final publish
    #[arg(long)]
    dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,

    /// Access level (public|restricted)
    #[arg(long)]
    access: Option<String>,

    /// Publish with tag
    #[arg(long)]
    tag: Option<String>,

    /// Keep prepublishOnly/prepublish/prepare/prepack scripts
    #[arg(long)]
    keep_scripts: bool,

    /// Configuration file (defaults to .republish.yaml lookup)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            ConsoleReporter.error(&format!("unexpected error: {:?}", e));
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(exit_code) => return Ok(exit_code),
    };
    let reporter = ConsoleReporter;
    let project_path = std::env::current_dir()?;

    let (options, yes) =
        match prepare(cli, &project_path, std::env::vars().collect(), &reporter).await {
            Ok(prepared) => prepared,
            Err(exit_code) => return Ok(exit_code),
        };

    let manager = NpmPlugin::new(project_path);
    let republisher = Republisher::new(&manager, &reporter);

    if options.dry_run {
        reporter.info("dry run: nothing will be published");
    }

    republisher.check_identity(&options.registries).await;

    let answer = confirm_or_skip(options.dry_run, yes, &options.from, &options.to).await;
    if let Some(exit_code) = confirmation_exit(answer, &reporter) {
        return Ok(exit_code);
    }

    match republisher.run(&options).await {
        Ok(summary) => Ok(summary.exit_code()),
        Err(e) => match e.downcast_ref::<RepublishError>() {
            Some(error) if error.is_fatal() => {
                report_fatal(&reporter, error);
                Ok(1)
            }
            _ => Err(e),
        },
    }
}

/// Parse the command line; `Err` carries the exit code
///
/// Help and version exit 0, every malformed command line exits 1.
fn parse_args<I, T>(args: I) -> Result<Cli, i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => 1,
        }
    })
}

/// Turn the parsed command line and configuration into run options.
///
/// Returns the options and whether confirmation is skipped, or the exit code
/// when validation failed. No npm command runs here.
async fn prepare(
    cli: Cli,
    project_path: &Path,
    env: HashMap<String, String>,
    reporter: &dyn Reporter,
) -> Result<(RepublishOptions, bool), i32> {
    let from = cli.from.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let to = cli.to.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (Some(from), Some(to)) = (from, to) else {
        eprintln!("{}", Cli::command().render_help());
        return Err(1);
    };

    let flags = CliFlags {
        registry: cli.registry.clone(),
        from_registry: cli.from_registry.clone(),
        to_registry: cli.to_registry.clone(),
        access: cli.access.clone(),
        tag: cli.tag.clone(),
        keep_scripts: cli.keep_scripts,
    };

    let loaded = ConfigLoader::load(ConfigLoadOptions {
        project_path: project_path.to_path_buf(),
        explicit_file: cli.config.clone(),
        env,
    })
    .await;
    let settings = match loaded.and_then(|config| config.resolve(&flags)) {
        Ok(settings) => settings,
        Err(e) => {
            report_fatal(reporter, &e);
            return Err(1);
        }
    };

    let mut options = RepublishOptions::new(from, to, settings);
    options.versions = cli.versions;
    options.exclude_versions = cli.exclude_versions;
    options.dry_run = cli.dry_run;

    Ok((options, cli.yes))
}

/// Exit code implied by the confirmation answer, `None` to go on
fn confirmation_exit(answer: Result<bool>, reporter: &dyn Reporter) -> Option<i32> {
    match answer {
        Ok(true) => None,
        Ok(false) => {
            reporter.info("cancelled by user");
            Some(0)
        }
        Err(e) => {
            reporter.error(&format!("could not read confirmation: {:#}", e));
            Some(1)
        }
    }
}

fn report_fatal(reporter: &dyn Reporter, error: &RepublishError) {
    reporter.error(&format!("{} [{}]", error, error.code()));
}
