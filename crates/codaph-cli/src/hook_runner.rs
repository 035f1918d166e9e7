use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use codaph_runtime::RunSummary;
use codaph_sdk::Client;
use codaph_types::TriggerSource;
use serde::Deserialize;

/// Optional JSON object a caller (editor extension, agent runtime) pipes on
/// stdin to override the working directory for this one hook invocation.
#[derive(Debug, Default, Deserialize)]
struct StdinOverrides {
    cwd: Option<String>,
    project_path: Option<String>,
    worktree: Option<String>,
}

impl StdinOverrides {
    fn project_root_override(&self) -> Option<&str> {
        self.project_path.as_deref().or(self.worktree.as_deref()).or(self.cwd.as_deref())
    }
}

pub struct HookRunOptions {
    pub trigger: TriggerSource,
    pub cwd_flag: Option<String>,
    pub quiet: bool,
    pub json: bool,
}

pub async fn run_hook(options: HookRunOptions) -> Result<()> {
    let overrides = read_stdin_overrides();
    let project_root = resolve_project_root(options.cwd_flag.as_deref(), overrides.as_ref())?;

    let client = Client::connect(&project_root).with_context(|| format!("connecting to {}", project_root.display()))?;
    let summary = client.sync(options.trigger).await.context("running sync workflow")?;

    if options.json {
        println!("{}", serde_json::to_string(&SummaryView::from(&summary))?);
    } else if !options.quiet {
        print_summary(&summary);
    }
    Ok(())
}

fn resolve_project_root(cwd_flag: Option<&str>, overrides: Option<&StdinOverrides>) -> Result<PathBuf> {
    if let Some(cwd) = cwd_flag {
        return Ok(PathBuf::from(cwd));
    }
    if let Some(path) = overrides.and_then(StdinOverrides::project_root_override) {
        return Ok(PathBuf::from(path));
    }
    std::env::current_dir().context("resolving current directory")
}

fn read_stdin_overrides() -> Option<StdinOverrides> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf).ok()?;
    let trimmed = buf.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

fn print_summary(summary: &RunSummary) {
    if summary.skipped {
        println!("codaph: skipped ({})", summary.skip_reason.as_deref().unwrap_or("unknown reason"));
        return;
    }
    if let Some(note) = &summary.push_note {
        println!("codaph: push: {note}");
    }
    match (&summary.skip_reason, summary.pull_imported) {
        (Some(reason), _) => println!("codaph: pull skipped ({reason})"),
        (None, Some(imported)) => println!("codaph: pull: imported {imported} event(s)"),
        (None, None) => {}
    }
}

#[derive(Debug, serde::Serialize)]
struct SummaryView {
    skipped: bool,
    skip_reason: Option<String>,
    push_note: Option<String>,
    pull_imported: Option<u64>,
}

impl From<&RunSummary> for SummaryView {
    fn from(summary: &RunSummary) -> Self {
        Self {
            skipped: summary.skipped,
            skip_reason: summary.skip_reason.clone(),
            push_note: summary.push_note.clone(),
            pull_imported: summary.pull_imported,
        }
    }
}
