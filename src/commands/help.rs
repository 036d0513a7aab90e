// help.rs - Help Command Module
// Provides help information for every registered command.
//
// Key Features:
// - `help` lists every command's name and usage in registration order
// - `help <verb>` shows one command's description, usage and all of its verbs
// - Everything is generated from the registry, so new commands show up automatically
//
// Used by: commands/mod.rs (registration)

use async_trait::async_trait;

use crate::context::{CommandContext, CommandOutput, CommandResult};
use crate::registry::{Command, CommandHandler, Registry};

pub const NOT_A_COMMAND: &str = "That isn't a valid command.";

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn run(&self, args: &[String], ctx: &dyn CommandContext) -> CommandResult {
        let prefix = &ctx.config().prefix;

        let Some(verb) = args.first() else {
            return Ok(CommandOutput::text(command_listing(ctx.registry(), prefix)));
        };

        match ctx.registry().resolve(verb) {
            Some(command) => Ok(CommandOutput::text(command_details(command, prefix))),
            None => Ok(CommandOutput::text(NOT_A_COMMAND)),
        }
    }
}

/// Name and usage of every command, in registration order
pub fn command_listing(registry: &Registry, prefix: &str) -> String {
    let mut output = format!("**Sunbot {}**\n\n__Commands:__\n\n", env!("CARGO_PKG_VERSION"));
    for command in registry.commands() {
        output.push_str(&format!("{}\n`{}{}`\n", command.name, prefix, command.usage));
    }
    output
}

pub fn command_details(command: &Command, prefix: &str) -> String {
    let verbs = command
        .verbs
        .iter()
        .map(|verb| format!("`{}{}`", prefix, verb))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "**{}**\n{}\n\nUsage:\n`{}{}`\nVerbs:\n{}",
        command.name, command.description, prefix, command.usage, verbs
    )
}
