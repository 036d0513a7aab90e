// commands/mod.rs - Command Module Registry
// This file declares all command modules and builds the registry the router reads.
// The order of the list below is the order the help command displays.

pub mod derpi;          // Derpibooru tag search
pub mod exec;           // Shell execution (administrators only)
pub mod help;           // Help listing and per-command details
pub mod ping;           // Test command
pub mod posts;          // Per-user post counters (needs the database)
pub mod sun;            // Static image reply
pub mod voice;          // Voice channel join/leave

use log::debug;

use crate::context::{CommandContext, CommandResult};
use crate::error::{CommandError, RegistryError};
use crate::registry::{Command, Registry};

/// Every command the bot ships with, in display order
pub fn all_commands() -> Vec<Command> {
    vec![
        Command::new("Test command", &["test", "ping"], ping::Ping)
            .description("A simple command for testing the bot.")
            .usage("test [message]"),
        Command::new("Display help", &["help", "commands"], help::Help)
            .description("Lists all commands and their purposes.\nCan also display detailed info about a given command.")
            .usage("help [verb]"),
        Command::new("Derpibooru search", &["derpi", "derpibooru", "db"], derpi::Derpi)
            .description("Posts a random image from Derpibooru matching the given tags.\nOutside of NSFW channels only safe images are searched.")
            .usage("derpi <tags>"),
        Command::new("Shell", &["exec", "sh"], exec::Exec)
            .description("Runs a shell command on the host and posts its output.\nAdministrators only.")
            .usage("exec <command>"),
        Command::new("Join voice", &["join", "summon"], voice::Join)
            .description("Joins the voice channel you are in.")
            .usage("join"),
        Command::new("Leave voice", &["leave", "disconnect"], voice::Leave)
            .description("Leaves the current voice channel.")
            .usage("leave"),
        Command::new("Sun", &["sun", "sunny"], sun::Sun)
            .description("Posts a picture of the sun.")
            .usage("sun"),
        Command::new("Post count", &["posts", "stats"], posts::Posts)
            .description("Shows how many commands a user has sent.\nDefaults to you when nobody is mentioned.")
            .usage("posts [@user]")
            .needs_store(),
    ]
}

pub fn build_registry() -> Result<Registry, RegistryError> {
    Registry::register(all_commands())
}

/// Run a resolved command, refusing storage-backed commands when persistence is off
pub async fn execute(command: &Command, args: &[String], ctx: &dyn CommandContext) -> CommandResult {
    if command.needs_store && ctx.store().is_none() {
        debug!("[COMMANDS] '{}' needs the database, which is disabled", command.name);
        return Err(CommandError::StorageDisabled);
    }
    command.handler().run(args, ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::FakeContext;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_registry_builds() {
        let registry = build_registry().unwrap();
        assert_eq!(registry.len(), 8);
        for command in registry.commands() {
            assert!(!command.usage.is_empty(), "{} has no usage", command.name);
            for verb in command.verbs {
                assert!(std::ptr::eq(registry.resolve(verb).unwrap(), command));
            }
        }
    }

    #[tokio::test]
    async fn test_storage_gate() {
        let ctx = FakeContext::new();
        let command = ctx.registry.resolve("posts").unwrap();
        let err = execute(command, &[], &ctx).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(matches!(err, CommandError::StorageDisabled));
    }

    #[tokio::test]
    async fn test_execute_runs_handler() {
        let ctx = FakeContext::new();
        let command = ctx.registry.resolve("test").unwrap();
        let out = execute(command, &[], &ctx).await.unwrap();
        assert_eq!(out.text, "Pong!");
    }
}
