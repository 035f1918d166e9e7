mod args;
mod commands;
mod hook_runner;

pub use args::{Cli, Commands, HookNameArg, HooksCommand};
pub use commands::run;
