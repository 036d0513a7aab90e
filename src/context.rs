// context.rs - Command Context and Output Types
// Everything a command handler sees of the outside world goes through the
// CommandContext trait, and everything it produces is a CommandOutput.
//
// Key Features:
// - CommandContext: one capability-bearing value per invocation (channel, author,
//   registry, config, store, image board, guild lookups)
// - CommandOutput: text body, optional embed payload, optional file attachment
// - FakeContext (tests only) for exercising handlers without a gateway
//
// Used by: commands/*, session.rs

use async_trait::async_trait;

use crate::booru::ImageBoard;
use crate::config::BotConfig;
use crate::error::CommandError;
use crate::registry::Registry;
use crate::store::UserStore;

/// Result type returned by every command handler
pub type CommandResult = Result<CommandOutput, CommandError>;

// ============================================================================
// INVOCATION DATA
// ============================================================================

/// Snapshot of the user who sent a message (or was mentioned in one)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    pub username: String,
    pub bot: bool,
}

/// Channel the command was invoked in
#[derive(Debug, Clone, Default)]
pub struct ChannelInfo {
    pub id: u64,
    pub guild_id: Option<u64>,
    pub nsfw: bool,
}

// ============================================================================
// OUTPUT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Rich embed payload, rendered by the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
    pub color: Option<u32>,
    pub image_url: Option<String>,
    pub footer: Option<String>,
}

impl EmbedPayload {
    pub fn titled(title: impl Into<String>) -> Self {
        EmbedPayload {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileAttachment {
    pub filename: String,
    pub data: Vec<u8>,
}

/// What a successful command sends back to the channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub text: String,
    pub embed: Option<EmbedPayload>,
    pub attachment: Option<FileAttachment>,
}

impl CommandOutput {
    pub fn text(text: impl Into<String>) -> Self {
        CommandOutput {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn embed(embed: EmbedPayload) -> Self {
        CommandOutput {
            embed: Some(embed),
            ..Default::default()
        }
    }

    pub fn file(filename: impl Into<String>, data: Vec<u8>) -> Self {
        CommandOutput {
            attachment: Some(FileAttachment {
                filename: filename.into(),
                data,
            }),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.embed.is_none() && self.attachment.is_none()
    }
}

// ============================================================================
// CONTEXT TRAIT
// ============================================================================

/// Capabilities handed to every command handler for one invocation.
/// New external capabilities are added here, not to handler signatures.
#[async_trait]
pub trait CommandContext: Send + Sync {
    fn config(&self) -> &BotConfig;
    fn registry(&self) -> &Registry;
    fn author(&self) -> &Author;
    fn channel(&self) -> &ChannelInfo;
    fn mentions(&self) -> &[Author];

    /// None when persistence is disabled
    fn store(&self) -> Option<&UserStore>;

    fn image_board(&self) -> &dyn ImageBoard;

    /// Whether any of the author's roles in the current guild grants administrator
    async fn author_is_admin(&self) -> Result<bool, CommandError>;

    /// Voice channel the author is currently connected to, if any
    async fn author_voice_channel(&self) -> Option<u64>;
}

// ============================================================================
// TEST SUPPORT
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::booru::testing::FakeBoard;
    use crate::commands;
    use crate::store::{MemoryStore, UserStore};
    use std::sync::Arc;

    pub fn test_config() -> BotConfig {
        BotConfig::from_lookup(|key| match key {
            "DISCORD_AUTH_TOKEN" => Some("test-token".to_string()),
            _ => None,
        })
        .expect("test config")
    }

    pub fn author(id: u64, name: &str) -> Author {
        Author {
            id,
            username: name.to_string(),
            bot: false,
        }
    }

    /// In-process stand-in for the gateway session
    pub struct FakeContext {
        pub config: BotConfig,
        pub registry: Registry,
        pub author: Author,
        pub channel: ChannelInfo,
        pub mentions: Vec<Author>,
        pub store: Option<UserStore>,
        pub board: FakeBoard,
        pub admin: bool,
        pub voice_channel: Option<u64>,
    }

    impl FakeContext {
        pub fn new() -> Self {
            FakeContext {
                config: test_config(),
                registry: commands::build_registry().expect("default registry"),
                author: author(1, "tester"),
                channel: ChannelInfo {
                    id: 10,
                    guild_id: Some(100),
                    nsfw: false,
                },
                mentions: Vec::new(),
                store: None,
                board: FakeBoard::default(),
                admin: false,
                voice_channel: None,
            }
        }

        pub fn with_store(mut self) -> Self {
            self.store = Some(UserStore::new(Arc::new(MemoryStore::default())));
            self
        }
    }

    #[async_trait]
    impl CommandContext for FakeContext {
        fn config(&self) -> &BotConfig {
            &self.config
        }

        fn registry(&self) -> &Registry {
            &self.registry
        }

        fn author(&self) -> &Author {
            &self.author
        }

        fn channel(&self) -> &ChannelInfo {
            &self.channel
        }

        fn mentions(&self) -> &[Author] {
            &self.mentions
        }

        fn store(&self) -> Option<&UserStore> {
            self.store.as_ref()
        }

        fn image_board(&self) -> &dyn ImageBoard {
            &self.board
        }

        async fn author_is_admin(&self) -> Result<bool, CommandError> {
            Ok(self.admin)
        }

        async fn author_voice_channel(&self) -> Option<u64> {
            self.voice_channel
        }
    }
}
