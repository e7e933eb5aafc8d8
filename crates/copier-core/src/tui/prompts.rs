//! Guided project generation: template, version, answers, directory

use crate::config::Settings;
use crate::executor::{CopierExecutor, CopyRequest};
use crate::git::{GitRemote, RemoteVersionSet};
use crate::runtime::command::CancelToken;
use crate::runtime::tool::copier_tool;
use crate::templates::schema::{VariableKind, VariableSchema};
use crate::templates::version::requested_version;
use crate::templates::TemplateCloner;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const TAGS_HEADER: &str = "--- Tags ---";
const BRANCHES_HEADER: &str = "--- Branches ---";

/// Arguments for the guided `copy` flow
#[derive(Debug, Clone, Default)]
pub struct CreateArgs {
    /// Template URL or the name of a configured template
    pub template: Option<String>,

    /// Project directory to generate into
    pub directory: Option<PathBuf>,

    /// Tag, branch or commit to generate from; skips the version prompt
    pub vcs_ref: Option<String>,

    /// Answers given up front; those questions are not asked
    pub data: BTreeMap<String, String>,

    /// Accept defaults for every remaining question
    pub yes: bool,
}

/// Run the guided generation flow
pub async fn run(settings: &Settings, args: CreateArgs, cancel: &CancelToken) -> Result<()> {
    cliclack::intro("copier-helper")?;

    handle_tool_check(settings, &args, cancel).await?;

    let template_url = select_template(settings, args.template.as_deref(), args.yes)?;
    let version = select_version(settings, &template_url, &args, cancel).await?;

    let spinner = cliclack::spinner();
    spinner.start("Cloning template...");
    let cloner = TemplateCloner::from_settings(settings);
    let schema = match cloner.fetch_schema(&template_url, version.as_deref(), cancel).await {
        Ok((_checkout, schema)) => {
            spinner.stop(format!("Template has {} questions", schema.len()));
            schema
        }
        Err(e) => {
            spinner.stop("Failed to read template");
            return Err(e.into());
        }
    };

    let project_dir = select_directory(settings, &args)?;
    let variables = collect_variables(&schema, &args.data, args.yes)?;

    let spinner = cliclack::spinner();
    spinner.start("Generating project...");
    let executor = CopierExecutor::from_settings(settings);
    let mut request = CopyRequest::new(&template_url, &project_dir).variables(variables);
    request.version = version;
    match executor.run(&request, cancel).await {
        Ok(_) => spinner.stop(format!("Project generated in {}", project_dir.display())),
        Err(e) => {
            spinner.stop("Generation failed");
            return Err(e.into());
        }
    }

    print_next_steps(&project_dir)?;
    Ok(())
}

async fn handle_tool_check(settings: &Settings, args: &CreateArgs, cancel: &CancelToken) -> Result<()> {
    let tool = copier_tool(settings);
    let status = tool.status(cancel).await;

    if status.available {
        cliclack::log::success(status.to_string())?;
        return Ok(());
    }

    cliclack::log::warning(format!("{} is not installed", tool.config().display_name))?;

    if args.yes {
        anyhow::bail!(
            "{} is required. Install it with: {}",
            tool.config().display_name,
            tool.config().install_hint
        );
    }

    let action: &str = cliclack::select("What would you like to do?")
        .item(
            "docs",
            format!("Open documentation ({})", tool.config().docs_url),
            "",
        )
        .item("abort", "Abort", tool.config().install_hint)
        .interact()?;

    if action == "docs" {
        tool.open_docs()?;
        cliclack::outro(format!(
            "After installing {}, run this command again.",
            tool.config().display_name
        ))?;
    }
    anyhow::bail!("{} is not available.", tool.config().display_name)
}

/// With `--yes` nothing is asked, so a value that would be prompted for is an error
fn require_unattended<T>(value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| anyhow::anyhow!("no {what} given; it is required with --yes"))
}

fn select_template(settings: &Settings, specified: Option<&str>, yes: bool) -> Result<String> {
    let specified = if yes {
        Some(require_unattended(specified, "template")?)
    } else {
        specified
    };
    if let Some(reference) = specified {
        let url = settings.resolve_template(reference).to_string();
        cliclack::log::info(format!("Template: {}", url))?;
        return Ok(url);
    }

    if !settings.default_templates.is_empty() {
        let mut select = cliclack::select("Select a template");
        for (idx, entry) in settings.default_templates.iter().enumerate() {
            select = select.item(Some(idx), &entry.name, &entry.url);
        }
        select = select.item(None, "Other", "enter a URL");

        if let Some(idx) = select.interact()? {
            if let Some(entry) = settings.default_templates.get(idx) {
                return Ok(entry.url.clone());
            }
        }
    }

    let url: String = cliclack::input("Template URL")
        .placeholder("https://github.com/org/template.git")
        .validate(|input: &String| {
            if input.trim().is_empty() {
                Err("Please enter a template URL.")
            } else {
                Ok(())
            }
        })
        .interact()?;
    Ok(url.trim().to_string())
}

/// Options for the version prompt: section headers, newest tags first, then branches
pub fn version_options(versions: &RemoteVersionSet) -> Vec<String> {
    let mut options = Vec::new();
    if !versions.tags.is_empty() {
        let mut tags = versions.tags.clone();
        tags.sort_by(|a, b| b.cmp(a));
        options.push(TAGS_HEADER.to_string());
        options.extend(tags);
    }
    if !versions.branches.is_empty() {
        options.push(BRANCHES_HEADER.to_string());
        options.extend(versions.branches.iter().cloned());
    }
    options
}

async fn select_version(
    settings: &Settings,
    template_url: &str,
    args: &CreateArgs,
    cancel: &CancelToken,
) -> Result<Option<String>> {
    if let Some(vcs_ref) = requested_version(args.vcs_ref.as_deref()) {
        cliclack::log::info(format!("Version: {}", vcs_ref))?;
        return Ok(Some(vcs_ref.to_string()));
    }

    let spinner = cliclack::spinner();
    spinner.start("Fetching versions...");
    let remote = GitRemote::from_settings(settings).with_cancel(cancel.clone());
    let versions = remote.list_versions(template_url).await;
    if cancel.is_cancelled() {
        spinner.stop("Cancelled");
        return Err(crate::error::Error::Cancelled.into());
    }
    spinner.stop(format!(
        "Found {} tags and {} branches",
        versions.tags.len(),
        versions.branches.len()
    ));

    let options = version_options(&versions);
    let initial = options
        .iter()
        .find(|o| requested_version(Some(o.as_str())).is_some())
        .cloned();

    let Some(initial) = initial else {
        cliclack::log::info("No versions found, using the default branch")?;
        return Ok(None);
    };
    if args.yes {
        cliclack::log::info(format!("Version: {}", initial))?;
        return Ok(Some(initial));
    }

    let mut select = cliclack::select("Select a version").initial_value(initial);
    for option in &options {
        select = select.item(option.clone(), option, "");
    }
    let selected: String = select.interact()?;

    Ok(requested_version(Some(&selected)).map(str::to_string))
}

fn select_directory(settings: &Settings, args: &CreateArgs) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let base = settings
        .default_output_folder
        .clone()
        .unwrap_or_else(|| current_dir.clone());

    let directory = if args.yes {
        Some(require_unattended(args.directory.as_ref(), "project directory")?)
    } else {
        args.directory.as_ref()
    };

    let path = if let Some(dir) = directory {
        let p = if dir.is_absolute() {
            dir.clone()
        } else {
            current_dir.join(dir)
        };
        cliclack::log::info(format!("Using directory: {}", p.display()))?;
        p
    } else {
        let input: String = cliclack::input("Project directory")
            .placeholder(&base.display().to_string())
            .default_input(&base.display().to_string())
            .interact()?;
        let p = PathBuf::from(input.trim());
        if p.is_absolute() {
            p
        } else {
            base.join(p)
        }
    };

    if path.is_dir() {
        if let Ok(entries) = std::fs::read_dir(&path) {
            let count = entries.count();
            if count > 0 {
                cliclack::log::warning(format!("Directory has {} existing items", count))?;

                let confirm = if args.yes {
                    true
                } else {
                    cliclack::confirm("Continue anyway?")
                        .initial_value(true)
                        .interact()?
                };

                if !confirm {
                    anyhow::bail!("Generation cancelled.");
                }
            }
        }
    }

    Ok(path)
}

/// Answers used when nothing is asked: presets win, then schema defaults
pub fn default_answers(
    schema: &VariableSchema,
    preset: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut answers = preset.clone();
    for variable in schema.iter() {
        answers
            .entry(variable.name.clone())
            .or_insert_with(|| variable.default_value.clone());
    }
    answers
}

/// Ask every schema question not already answered by `preset`
///
/// With `yes`, nothing is asked and defaults are used.
pub fn collect_variables(
    schema: &VariableSchema,
    preset: &BTreeMap<String, String>,
    yes: bool,
) -> Result<BTreeMap<String, String>> {
    if yes || schema.is_empty() {
        return Ok(default_answers(schema, preset));
    }

    let mut answers = preset.clone();
    for variable in schema.sorted() {
        if answers.contains_key(&variable.name) {
            continue;
        }

        let label = if variable.help.is_empty() {
            variable.name.clone()
        } else {
            format!("{} ({})", variable.help, variable.name)
        };

        let value = if variable.has_choices() {
            let mut select = cliclack::select(label);
            if variable.choices.contains(&variable.default_value) {
                select = select.initial_value(variable.default_value.clone());
            }
            for choice in &variable.choices {
                select = select.item(choice.clone(), choice, "");
            }
            select.interact()?
        } else if variable.kind == VariableKind::Bool {
            let confirmed: bool = cliclack::confirm(label)
                .initial_value(variable.default_value.eq_ignore_ascii_case("true"))
                .interact()?;
            confirmed.to_string()
        } else {
            let mut input = cliclack::input(label).required(false);
            if !variable.default_value.is_empty() {
                input = input.default_input(&variable.default_value);
            }
            if variable.kind == VariableKind::Number {
                input = input.validate(|input: &String| {
                    if input.is_empty() || input.trim().parse::<f64>().is_ok() {
                        Ok(())
                    } else {
                        Err("Please enter a number.")
                    }
                });
            }
            input.interact::<String>()?
        };

        answers.insert(variable.name.clone(), value);
    }

    Ok(answers)
}

fn print_next_steps(project_dir: &Path) -> Result<()> {
    let current = std::env::current_dir().ok();
    let mut steps = Vec::new();
    if current.as_deref() != Some(project_dir) {
        steps.push(format!("cd {}", project_dir.display()));
    }
    steps.push("git init && git add -A && git commit -m \"Initial commit\"".to_string());
    steps.push("copier-helper check".to_string());

    println!();
    println!("  {}", console::style("Next steps").bold());
    println!();

    for (i, step) in steps.iter().enumerate() {
        println!("  {}.  {}", i + 1, step);
    }

    cliclack::outro("Done!")?;

    Ok(())
}
