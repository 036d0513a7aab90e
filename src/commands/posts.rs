// posts.rs - Post Count Command
// Shows a user's stored record as an embed. Needs the database.

use async_trait::async_trait;

use crate::context::{CommandContext, CommandOutput, CommandResult, EmbedPayload};
use crate::error::CommandError;
use crate::registry::CommandHandler;
use crate::store::UserRecord;

const EMBED_COLOR: u32 = 0xF5B942;

pub struct Posts;

#[async_trait]
impl CommandHandler for Posts {
    async fn run(&self, _args: &[String], ctx: &dyn CommandContext) -> CommandResult {
        let store = ctx.store().ok_or(CommandError::StorageDisabled)?;

        // First mention wins, otherwise the caller
        let target = ctx.mentions().first().unwrap_or(ctx.author());
        let record = store.find_user(target.id).await?;

        Ok(CommandOutput::embed(record_embed(&record)))
    }
}

fn record_embed(record: &UserRecord) -> EmbedPayload {
    let mut embed = EmbedPayload::titled(format!("{}'s stats", record.username))
        .field("Posts", record.posts.to_string(), true);
    if record.bot {
        embed = embed.field("Bot", "yes", true);
    }
    embed.color = Some(EMBED_COLOR);
    embed.footer = record
        .last_seen
        .map(|seen| format!("Last seen {}", seen.format("%Y-%m-%d %H:%M UTC")));
    embed
}
