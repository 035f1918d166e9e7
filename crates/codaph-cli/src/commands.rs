use std::path::PathBuf;

use anyhow::Result;

use crate::args::{Cli, Commands, HooksCommand};
use crate::hook_runner::{self, HookRunOptions};

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Hooks { command } => run_hooks(command).await,
    }
}

async fn run_hooks(command: HooksCommand) -> Result<()> {
    match command {
        HooksCommand::Run { name, quiet, cwd, json } => {
            let options = HookRunOptions { trigger: name.into_trigger_source(), cwd_flag: cwd, quiet, json };
            hook_runner::run_hook(options).await
        }
        HooksCommand::Install { name, path, binary_name } => {
            codaph_runtime::hooks::install(&PathBuf::from(path), &binary_name, name.into_hook_name())?;
            Ok(())
        }
    }
}
