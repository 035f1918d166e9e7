use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "codaph")]
#[command(about = "Capture, mirror, and replay AI coding-agent session transcripts", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage and run the git/agent lifecycle hooks that drive sync.
    Hooks {
        #[command(subcommand)]
        command: HooksCommand,
    },
}

#[derive(Subcommand)]
pub enum HooksCommand {
    /// Run one named hook now: push provider history, then pull the remote timeline.
    Run {
        name: HookNameArg,
        /// Suppress the human-readable summary line.
        #[arg(long)]
        quiet: bool,
        /// Project root to operate on; defaults to the current directory.
        #[arg(long)]
        cwd: Option<String>,
        /// Emit the run summary as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Install (or refresh) the managed block for one hook in a git hook script.
    Install {
        name: HookNameArg,
        /// Path to the git hook file to manage, e.g. `.git/hooks/post-commit`.
        #[arg(long)]
        path: String,
        /// Project root whose `.codaph` binary name is assumed on PATH; defaults to `codaph`.
        #[arg(long, default_value = "codaph")]
        binary_name: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum HookNameArg {
    #[value(name = "post-commit")]
    PostCommit,
    #[value(name = "post-push")]
    PostPush,
    #[value(name = "agent-complete")]
    AgentComplete,
}

impl HookNameArg {
    pub fn into_hook_name(self) -> codaph_runtime::HookName {
        match self {
            HookNameArg::PostCommit => codaph_runtime::HookName::PostCommit,
            HookNameArg::PostPush => codaph_runtime::HookName::PostPush,
            HookNameArg::AgentComplete => codaph_runtime::HookName::AgentComplete,
        }
    }

    pub fn into_trigger_source(self) -> codaph_types::TriggerSource {
        match self {
            HookNameArg::PostCommit => codaph_types::TriggerSource::HookPostCommit,
            HookNameArg::PostPush => codaph_types::TriggerSource::HookPostPush,
            HookNameArg::AgentComplete => codaph_types::TriggerSource::HookAgentComplete,
        }
    }
}
