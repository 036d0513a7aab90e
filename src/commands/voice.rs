// voice.rs - Voice Channel Commands
// Join and leave are registered so they show up in help and answer sensibly, but
// this build carries no voice transport, so neither actually connects.

use async_trait::async_trait;

use crate::context::{CommandContext, CommandResult};
use crate::error::CommandError;
use crate::registry::CommandHandler;

pub const NOT_IN_VOICE: &str = "You need to be in a voice channel first.";
pub const VOICE_UNSUPPORTED: &str = "Voice isn't supported in this build.";

pub struct Join;

#[async_trait]
impl CommandHandler for Join {
    async fn run(&self, _args: &[String], ctx: &dyn CommandContext) -> CommandResult {
        if ctx.channel().guild_id.is_none() {
            return Err(CommandError::InvalidArgs("Voice only works in a server.".to_string()));
        }
        match ctx.author_voice_channel().await {
            None => Err(CommandError::InvalidArgs(NOT_IN_VOICE.to_string())),
            Some(_) => Err(CommandError::Unsupported(VOICE_UNSUPPORTED.to_string())),
        }
    }
}

pub struct Leave;

#[async_trait]
impl CommandHandler for Leave {
    async fn run(&self, _args: &[String], _ctx: &dyn CommandContext) -> CommandResult {
        Err(CommandError::Unsupported(VOICE_UNSUPPORTED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::FakeContext;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_join_requires_voice_channel() {
        let ctx = FakeContext::new();
        let err = Join.run(&[], &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), NOT_IN_VOICE);
    }

    #[tokio::test]
    async fn test_join_and_leave_unsupported() {
        let mut ctx = FakeContext::new();
        ctx.voice_channel = Some(42);
        assert_eq!(Join.run(&[], &ctx).await.unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(Leave.run(&[], &ctx).await.unwrap_err().kind(), ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn test_join_outside_guild() {
        let mut ctx = FakeContext::new();
        ctx.channel.guild_id = None;
        assert_eq!(Join.run(&[], &ctx).await.unwrap_err().kind(), ErrorKind::Usage);
    }
}
