use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;

use monover::config;
use monover::domain::{PreReleaseType, SemVer};
use monover::git::{CachedHistory, Git2History};
use monover::resolver::ProjectSpec;
use monover::{runner, ui};

#[derive(clap::Parser)]
#[command(
    name = "monover",
    about = "Compute deterministic versions from git history and branch context"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, default_value = ".", help = "Repository root to analyze")]
    repo: String,

    #[arg(short, long, help = "Resolve only these projects (repeatable)")]
    project: Vec<String>,

    #[arg(short, long, help = "Resolve against this branch instead of HEAD")]
    branch: Option<String>,

    #[arg(long, help = "Prerelease label for main/dev branches (alpha|beta|rc|custom)")]
    prerelease: Option<String>,

    #[arg(long, help = "Skip computation and emit exactly this version")]
    force_version: Option<String>,

    #[arg(long, help = "Approve a major version bump for constrained projects")]
    approve_major: bool,

    #[arg(long, help = "Fixed date for calendar versioning (YYYY-MM-DD)")]
    as_of: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    // Layer stack, lowest precedence first: user config, repo config, -c file
    let mut layers = config::discover_layers(&args.repo)?;
    if let Some(path) = &args.config {
        layers.push(config::load_layer(path)?);
    }
    let config = config::merge_layers(&layers)?;

    // One cache per run keeps the git walks O(history) regardless of how
    // many projects resolve against the same ranges
    let history = match Git2History::open(&args.repo) {
        Ok(history) => CachedHistory::new(history),
        Err(e) => {
            ui::display_error(&e.to_string());
            std::process::exit(1);
        }
    };

    // A repository without configured projects is one implicit root project
    let projects: Vec<ProjectSpec> = if config.projects.is_empty() {
        vec![ProjectSpec {
            name: "default".to_string(),
            dir: String::new(),
            dependencies: Vec::new(),
        }]
    } else {
        config.projects.clone()
    };

    let selected: Vec<&ProjectSpec> = if args.project.is_empty() {
        projects.iter().collect()
    } else {
        let selected: Vec<&ProjectSpec> = projects
            .iter()
            .filter(|p| args.project.contains(&p.name))
            .collect();
        if selected.len() != args.project.len() {
            for name in &args.project {
                if !projects.iter().any(|p| &p.name == name) {
                    ui::display_error(&format!("Unknown project: {}", name));
                }
            }
            std::process::exit(1);
        }
        selected
    };

    let prerelease = args
        .prerelease
        .as_deref()
        .map(PreReleaseType::parse)
        .transpose()?;
    let force_version = args
        .force_version
        .as_deref()
        .map(SemVer::parse)
        .transpose()?;
    let as_of = args
        .as_of
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?;

    let requests: Vec<_> = selected
        .iter()
        .map(|spec| {
            let mut request = config.request_for(&spec.name);
            request.dependencies = spec.dependencies.clone();
            request.branch = args.branch.clone();
            request.major_approved = args.approve_major;
            if prerelease.is_some() {
                request.prerelease = prerelease.clone();
            }
            request.force_version = force_version.clone();
            request.as_of = as_of;
            request
        })
        .collect();

    let outcomes = runner::resolve_all(&history, &projects, &requests, &config.policy);

    let mut failed = false;
    for (project, outcome) in &outcomes {
        match outcome {
            Ok(result) => ui::display_result(result),
            Err(e) => {
                failed = true;
                ui::display_failure(project, e);
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}
