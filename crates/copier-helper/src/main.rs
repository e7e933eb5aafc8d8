//! copier-helper - Generate and update projects from Copier templates

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use copier_core::runtime::check_tools;
use copier_core::tui::CreateArgs;
use copier_core::update::is_template_project;
use copier_core::{
    fetch_template_schema, CancelToken, CopierExecutor, GitRemote, Settings, UpdateChecker,
    UpdateVerdict,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "copier-helper")]
#[command(about = "Generate, inspect and update projects from Copier templates")]
#[command(version)]
pub struct Args {
    /// Settings file (defaults to $COPIER_HELPER_CONFIG or the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the tags and branches a template offers
    Versions(TemplateArgs),
    /// Show the questions a template asks
    Variables(VariablesArgs),
    /// Generate a new project from a template
    Copy(CopyArgs),
    /// Update a generated project to its template's latest version
    Update(ProjectArgs),
    /// Check whether a generated project is behind its template
    Check(ProjectArgs),
    /// List configured templates
    Templates,
    /// Check that git and copier are available
    Doctor(DoctorArgs),
}

#[derive(Parser, Debug)]
pub struct TemplateArgs {
    /// Template URL or configured template name
    pub template: String,
}

#[derive(Parser, Debug)]
pub struct VariablesArgs {
    /// Template URL or configured template name
    pub template: String,

    /// Tag, branch or commit to read the questions from
    #[arg(long = "vcs-ref")]
    pub vcs_ref: Option<String>,
}

#[derive(Parser, Debug)]
pub struct CopyArgs {
    /// Template URL or configured template name
    pub template: Option<String>,

    /// Project directory to create
    pub directory: Option<PathBuf>,

    /// Tag, branch or commit to generate from
    #[arg(long = "vcs-ref")]
    pub vcs_ref: Option<String>,

    /// Answer a question up front (repeatable)
    #[arg(short = 'd', long = "data", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub data: Vec<(String, String)>,

    /// Accept defaults for every remaining question (non-interactive mode)
    #[arg(short, long)]
    pub yes: bool,
}

impl From<CopyArgs> for CreateArgs {
    fn from(args: CopyArgs) -> Self {
        CreateArgs {
            template: args.template,
            directory: args.directory,
            vcs_ref: args.vcs_ref,
            data: args.data.into_iter().collect::<BTreeMap<_, _>>(),
            yes: args.yes,
        }
    }
}

#[derive(Parser, Debug)]
pub struct ProjectArgs {
    /// Generated project directory
    #[arg(default_value = ".")]
    pub directory: PathBuf,
}

#[derive(Parser, Debug)]
pub struct DoctorArgs {
    /// Open the documentation of missing tools
    #[arg(long)]
    pub docs: bool,
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn setup_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        })
    });

    let formatter = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };
    Ok(settings)
}

/// Whether `err` means the user interrupted the run
fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<copier_core::Error>()
            .is_some_and(copier_core::Error::is_cancelled)
            || cause
                .downcast_ref::<std::io::Error>()
                .is_some_and(|e| e.kind() == std::io::ErrorKind::Interrupted)
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // First Ctrl+C cancels the running operation, a second one exits at once
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        if handler_token.is_cancelled() {
            std::process::exit(130);
        }
        handler_token.cancel();
    })
    .ok();

    let args = Args::parse();
    setup_logging(args.verbose, args.quiet);

    let settings = load_settings(args.config.as_ref())?;
    tracing::debug!(?settings, "loaded settings");

    let result = match args.command {
        Some(command) => dispatch(command, &settings, &cancel).await,
        None => copier_core::run(&settings, CreateArgs::default(), &cancel).await,
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    match result {
        Err(e) if is_interrupted(&e) => {
            eprintln!("{}", "Cancelled".yellow());
            std::process::exit(130);
        }
        other => other,
    }
}

async fn dispatch(command: Command, settings: &Settings, cancel: &CancelToken) -> Result<()> {
    match command {
        Command::Versions(args) => versions(settings, &args.template, cancel).await,
        Command::Variables(args) => {
            variables(settings, &args.template, args.vcs_ref.as_deref(), cancel).await
        }
        Command::Copy(args) => copier_core::run(settings, args.into(), cancel).await,
        Command::Update(args) => update(settings, &args.directory, cancel).await,
        Command::Check(args) => check(settings, &args.directory, cancel).await,
        Command::Templates => templates(settings),
        Command::Doctor(args) => doctor(settings, args.docs, cancel).await,
    }
}

async fn versions(settings: &Settings, template: &str, cancel: &CancelToken) -> Result<()> {
    let url = settings.resolve_template(template);
    let remote = GitRemote::from_settings(settings).with_cancel(cancel.clone());
    let versions = remote.list_versions(url).await;
    if cancel.is_cancelled() {
        return Err(copier_core::Error::Cancelled.into());
    }

    if versions.is_empty() {
        println!("{}", format!("No tags or branches found for {}", url).yellow());
        return Ok(());
    }

    let mut tags = versions.tags.clone();
    tags.sort_by(|a, b| b.cmp(a));
    println!("{}", "Tags".bold());
    for tag in &tags {
        println!("  {}", tag);
    }
    println!("{}", "Branches".bold());
    for branch in &versions.branches {
        println!("  {}", branch);
    }
    Ok(())
}

async fn variables(
    settings: &Settings,
    template: &str,
    vcs_ref: Option<&str>,
    cancel: &CancelToken,
) -> Result<()> {
    let url = settings.resolve_template(template);
    let schema = fetch_template_schema(settings, url, vcs_ref, cancel).await?;

    if schema.is_empty() {
        println!("{}", "The template asks no questions.".green());
        return Ok(());
    }

    for variable in schema.sorted() {
        println!("{} {}", variable.name.bold(), format!("({})", variable.kind).dimmed());
        if !variable.help.is_empty() {
            println!("    {}", variable.help);
        }
        if !variable.default_value.is_empty() {
            println!("    default: {}", variable.default_value.cyan());
        }
        if variable.has_choices() {
            println!("    choices: {}", variable.choices.join(", "));
        }
    }
    Ok(())
}

async fn update(settings: &Settings, directory: &Path, cancel: &CancelToken) -> Result<()> {
    let executor = CopierExecutor::from_settings(settings);
    let output = executor.update(directory, cancel).await?;
    if !output.stdout.trim().is_empty() {
        println!("{}", output.stdout.trim_end());
    }
    println!("{} {}", "✓".green(), "Project updated".bold());
    Ok(())
}

async fn check(settings: &Settings, directory: &Path, cancel: &CancelToken) -> Result<()> {
    if !is_template_project(directory) {
        anyhow::bail!(copier_core::Error::NotATemplateProject {
            dir: directory.to_path_buf(),
        });
    }

    let remote = GitRemote::from_settings(settings).with_cancel(cancel.clone());
    let report = UpdateChecker::new(remote).check_project(directory).await;
    if cancel.is_cancelled() {
        return Err(copier_core::Error::Cancelled.into());
    }

    let unknown = "unknown".to_string();
    println!(
        "{} {}",
        "Template:".bold(),
        report.record.source_path.as_ref().unwrap_or(&unknown)
    );
    println!(
        "{} {}",
        "Version: ".bold(),
        report.record.current_version.as_ref().unwrap_or(&unknown)
    );

    match &report.verdict {
        UpdateVerdict::UpToDate => println!("{} {}", "✓".green(), "Up to date".green()),
        UpdateVerdict::UpdateAvailable { newest_version } => {
            println!(
                "{} Update available: {}",
                "↑".yellow(),
                newest_version.yellow().bold()
            );
            println!("  Run `copier-helper update` to apply it.");
        }
        UpdateVerdict::Indeterminate { reason } => {
            println!("{} Cannot determine update status: {}", "?".dimmed(), reason)
        }
    }
    Ok(())
}

fn templates(settings: &Settings) -> Result<()> {
    if settings.default_templates.is_empty() {
        println!("{}", "No templates configured.".yellow());
        if let Some(path) = Settings::default_path() {
            println!("Add `default_templates` entries to {}", path.display());
        }
        return Ok(());
    }

    for entry in &settings.default_templates {
        println!("{}  {}", entry.name.bold(), entry.url.dimmed());
    }
    Ok(())
}

async fn doctor(settings: &Settings, open_docs: bool, cancel: &CancelToken) -> Result<()> {
    let mut missing = 0;
    for (tool, status) in check_tools(settings, cancel).await {
        if status.available {
            println!("{} {}", "✓".green(), status);
        } else {
            missing += 1;
            println!("{} {}", "✗".red(), status);
            println!("    install: {}", tool.config().install_hint);
            println!("    docs:    {}", tool.config().docs_url);
            if open_docs {
                tool.open_docs()?;
            }
        }
    }

    match Settings::default_path() {
        Some(path) if path.is_file() => println!("Settings: {}", path.display()),
        Some(path) => println!("Settings: {} {}", path.display(), "(not found, using defaults)".dimmed()),
        None => println!("Settings: {}", "defaults".dimmed()),
    }

    if missing > 0 {
        anyhow::bail!("{} required tool(s) missing", missing);
    }
    Ok(())
}
