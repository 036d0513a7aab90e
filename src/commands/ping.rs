// ping.rs - Test Command Module
// Replies "Pong!" so users can check the bot is alive.
//
// Used by: commands/mod.rs (registration)

use async_trait::async_trait;

use crate::context::{CommandContext, CommandOutput, CommandResult};
use crate::registry::CommandHandler;

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn run(&self, args: &[String], _ctx: &dyn CommandContext) -> CommandResult {
        let mut output = String::from("Pong!");
        if !args.is_empty() {
            output.push_str("\nAnd you included a message! Thanks <3");
        }
        Ok(CommandOutput::text(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::FakeContext;

    #[tokio::test]
    async fn test_ping() {
        let ctx = FakeContext::new();
        assert_eq!(Ping.run(&[], &ctx).await.unwrap().text, "Pong!");

        let out = Ping.run(&["hi".to_string()], &ctx).await.unwrap();
        assert!(out.text.starts_with("Pong!\n"));
        assert!(out.text.contains("Thanks"));
    }
}
