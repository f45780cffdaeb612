use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;

use consign::locator::RepoLocator;
use consign::publisher::Publisher;
use consign::report::Reporter;
use consign::settings::{Settings, SettingsOverrides};

mod progress;

use progress::PublishProgress;

#[derive(Parser, Debug)]
#[command(name = "consign", version)]
#[command(about = "Publish artifact sets to a consign package repository")]
struct Cli {
    /// Repository locator, e.g. consign+https://api.consign.dev/acme/widgets
    #[arg(long)]
    repo: Option<String>,

    /// Path to a configuration file (default: ./.consign.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// API key. Overrides CONSIGN_API_KEY and the configuration file.
    #[arg(long)]
    api_key: Option<String>,

    /// Log per-file classification and skip decisions.
    #[arg(long)]
    debug: bool,

    /// Fail when a second file claims an already-occupied role.
    #[arg(long)]
    strict_roles: bool,

    /// Interval between sync status polls (e.g. 5s, 2m)
    #[arg(long)]
    sync_interval: Option<String>,

    /// Give up on sync polling after this long (e.g. 10m). Default: wait indefinitely.
    #[arg(long)]
    sync_timeout: Option<String>,

    /// Create the package without waiting for its synchronization.
    #[arg(long)]
    no_sync_wait: bool,

    /// Log sync polls at debug level instead of info.
    #[arg(long)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload files, assemble them into one package, and wait for sync.
    Publish {
        /// Files to publish. Roles are detected from content and file name.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Destination prefix inside the repository, e.g. com/acme/widget/1.0
        #[arg(long)]
        dest: Option<String>,

        /// Extra metadata for package creation, as key=value (repeatable).
        #[arg(long = "meta", value_name = "KEY=VALUE")]
        metadata: Vec<String>,
    },
    /// Show the synchronization status of a published package.
    Status {
        /// Package slug printed by a publish run.
        slug: String,

        /// Emit the status as JSON instead of key: value lines.
        #[arg(long)]
        json: bool,
    },
    /// Download one artifact from the repository CDN.
    Fetch {
        /// Repository path, e.g. com/acme/widget/1.0/widget-1.0.jar
        path: String,

        /// Output file (default: the path's basename in the working directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print repository and configuration diagnostics.
    Doctor,
    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

struct CliReporter {
    debug: bool,
}

impl Reporter for CliReporter {
    fn debug(&mut self, msg: &str) {
        if self.debug {
            eprintln!("[debug] {msg}");
        }
    }

    fn info(&mut self, msg: &str) {
        eprintln!("[info] {msg}");
    }

    fn warn(&mut self, msg: &str) {
        eprintln!("[warn] {msg}");
    }

    fn error(&mut self, msg: &str) {
        eprintln!("[error] {msg}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.cmd {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "consign", &mut io::stdout());
        return Ok(());
    }

    let mut reporter = CliReporter { debug: cli.debug };
    let mut settings = Settings::resolve(cli.config.as_deref(), &mut reporter)?;
    settings.apply_overrides(
        SettingsOverrides {
            debug: cli.debug,
            strict_roles: cli.strict_roles,
            sync_interval: parse_secs(cli.sync_interval.as_deref())?,
            max_sync_wait: parse_secs(cli.sync_timeout.as_deref())?,
            no_sync_wait: cli.no_sync_wait,
            quiet_sync: cli.quiet,
        },
        &mut reporter,
    );
    reporter.debug = settings.debug;

    let repo = cli.repo.as_deref().context("--repo is required")?;
    let locator = RepoLocator::parse(repo)?;
    let mut publisher = Publisher::open(
        locator,
        settings.clone(),
        cli.api_key.as_deref(),
        &mut reporter,
    )?;

    match &cli.cmd {
        Commands::Publish {
            files,
            dest,
            metadata,
        } => {
            for spec in metadata {
                let (key, value) = parse_meta(spec)?;
                publisher.add_metadata(&key, value, &mut reporter);
            }
            run_publish(&mut publisher, files, dest.as_deref(), &mut reporter)?;
        }
        Commands::Status { slug, json } => {
            run_status(&publisher, slug, *json)?;
        }
        Commands::Fetch { path, out } => {
            run_fetch(&mut publisher, path, out.as_deref(), &mut reporter)?;
        }
        Commands::Doctor => {
            run_doctor(&mut publisher, &settings, &mut reporter)?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn parse_duration(s: &str) -> Result<Duration> {
    humantime::parse_duration(s).with_context(|| format!("invalid duration: {s}"))
}

/// Durations below one second land at zero and are clamped back up to one
/// by the settings layer, with a warning.
fn parse_secs(raw: Option<&str>) -> Result<Option<u64>> {
    match raw {
        Some(s) => parse_duration(s).map(|d| Some(d.as_secs())),
        None => Ok(None),
    }
}

fn parse_meta(spec: &str) -> Result<(String, serde_json::Value)> {
    let (key, raw) = spec
        .split_once('=')
        .with_context(|| format!("invalid --meta '{spec}': expected key=value"))?;
    ensure!(!key.is_empty(), "invalid --meta '{spec}': empty key");
    // Values that parse as JSON keep their type; everything else is a string.
    let value = serde_json::from_str(raw)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

fn run_publish(
    publisher: &mut Publisher,
    files: &[PathBuf],
    dest: Option<&str>,
    reporter: &mut CliReporter,
) -> Result<()> {
    let mut progress = PublishProgress::new(files.len());
    for file in files {
        let name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", file.display()))?;
        let destination = match dest {
            Some(prefix) => format!("{}/{name}", prefix.trim_end_matches('/')),
            None => name.clone(),
        };
        progress.begin_file(&name);
        publisher.put(file, &destination, reporter)?;
        progress.finish_file();
    }
    let outcome = publisher.finalize(reporter)?;
    progress.finish();

    if let Some(slug) = publisher.slug() {
        println!("slug: {slug}");
    }
    match outcome {
        Some(status) => {
            println!("status: {}", status.status_str);
            println!("stage: {}", status.stage_str);
        }
        None => println!("status: submitted"),
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusReport<'a> {
    package: String,
    status: &'a str,
    stage: &'a str,
    progress: u8,
    terminal: bool,
}

fn run_status(publisher: &Publisher, slug: &str, json: bool) -> Result<()> {
    let status = publisher.status(slug)?;
    let locator = publisher.locator();
    let package = format!("{}/{}/{slug}", locator.owner, locator.repository);

    if json {
        let report = StatusReport {
            package,
            status: &status.status_str,
            stage: &status.stage_str,
            progress: status.sync_progress,
            terminal: status.is_terminal(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("package: {package}");
    println!("status: {}", status.status_str);
    println!("stage: {}", status.stage_str);
    println!("progress: {}%", status.sync_progress);
    println!("terminal: {}", status.is_terminal());
    Ok(())
}

fn run_fetch(
    publisher: &mut Publisher,
    path: &str,
    out: Option<&Path>,
    reporter: &mut CliReporter,
) -> Result<()> {
    let out = match out {
        Some(out) => out.to_path_buf(),
        None => {
            let basename = path.rsplit('/').next().unwrap_or("");
            ensure!(
                !basename.is_empty(),
                "cannot derive an output file name from '{path}'"
            );
            PathBuf::from(basename)
        }
    };
    if publisher.get(path, &out, reporter)? {
        println!("fetched: {}", out.display());
    } else {
        reporter.warn(&format!("{path} was not downloaded"));
    }
    Ok(())
}

fn run_doctor(
    publisher: &mut Publisher,
    settings: &Settings,
    reporter: &mut CliReporter,
) -> Result<()> {
    let locator = publisher.locator();
    println!("repository: {}/{}", locator.owner, locator.repository);
    println!("api_base: {}", locator.api_base);
    println!("api_key_detected: {}", publisher.is_authenticated());

    match publisher.cdn_base(reporter) {
        Ok(base) => println!("cdn_base: {base}"),
        Err(err) => reporter.warn(&format!("unable to resolve the CDN base: {err:#}")),
    }

    println!();
    println!("effective configuration:");
    // Never print the credential itself, only whether one resolved.
    let mut shown = settings.clone();
    shown.api_key = publisher.is_authenticated().then(|| "<set>".to_string());
    print!(
        "{}",
        toml::to_string_pretty(&shown).context("failed to render configuration")?
    );
    Ok(())
}
