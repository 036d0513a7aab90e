// session.rs - Gateway Session Shim
// Connects serenity's message events to the router and relays command output back
// to the channel.
//
// Key Features:
// - process_message: the gateway-independent part (boundary checks, routing,
//   post counting, silly replies, error formatting)
// - SerenityContext: CommandContext backed by a live serenity Context/Message
// - Handler: serenity EventHandler; each event already runs in its own task
//
// Used by: main.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serenity::{
    builder::{CreateEmbed, CreateMessage},
    client::{Context, EventHandler},
    model::{
        channel::{AttachmentType, Message},
        gateway::Ready,
        id::{ChannelId, RoleId},
        permissions::Permissions,
    },
};

use crate::booru::ImageBoard;
use crate::commands;
use crate::config::BotConfig;
use crate::context::{Author, ChannelInfo, CommandContext, CommandOutput, EmbedPayload};
use crate::error::{CommandError, ErrorKind};
use crate::registry::Registry;
use crate::router::{route, RouterDecision};
use crate::store::UserStore;

pub const UNKNOWN_COMMAND: &str = "I don't understand that command.";

static EEE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^eee").expect("valid regex"));

/// Everything built at startup and shared by every event
pub struct BotState {
    pub config: BotConfig,
    pub registry: Registry,
    pub store: Option<UserStore>,
    pub board: Box<dyn ImageBoard>,
}

// ============================================================================
// MESSAGE PROCESSING
// ============================================================================

/// Decide what (if anything) to send back for one inbound message
pub async fn process_message(text: &str, ctx: &dyn CommandContext) -> Option<CommandOutput> {
    if text.is_empty() {
        debug!("[SESSION] Message received; did not contain text.");
        return None;
    }
    // Ignore all messages created by any bot (including itself)
    if ctx.author().bot {
        return None;
    }

    debug!(
        "[SESSION] Message received in {}: {}: {}",
        ctx.channel().id,
        ctx.author().username,
        text
    );
    let config = ctx.config();

    match route(text, &config.prefix, ctx.registry()) {
        RouterDecision::NotACommand => {
            debug!("[SESSION] Message is not a command.");
            if config.silly_replies {
                silly_reply(text).map(CommandOutput::text)
            } else {
                None
            }
        }
        RouterDecision::UnknownCommand { verb, quiet } => {
            debug!("[SESSION] Unknown command '{}'", verb);
            if quiet {
                None
            } else {
                Some(CommandOutput::text(UNKNOWN_COMMAND))
            }
        }
        RouterDecision::Command { command, args } => {
            debug!("[SESSION] Running '{}' with {} args", command.name, args.len());
            record_post(ctx).await;

            let output = match commands::execute(command, &args, ctx).await {
                Ok(output) => output,
                Err(e) => {
                    log_command_error(command.name, ctx.author(), &e);
                    error_output(&e)
                }
            };
            if output.is_empty() {
                None
            } else {
                Some(output)
            }
        }
    }
}

/// Easter-egg replies for plain chat
pub fn silly_reply(text: &str) -> Option<String> {
    // This is an inside joke.
    if text == "h" {
        return Some("h".to_string());
    }
    if EEE.is_match(text) {
        return Some(text.to_string());
    }
    None
}

pub fn error_output(err: &CommandError) -> CommandOutput {
    CommandOutput::text(format!("❌ {}", err))
}

fn log_command_error(name: &str, author: &Author, err: &CommandError) {
    match err.kind() {
        ErrorKind::Usage | ErrorKind::NotFound | ErrorKind::Permission => {
            debug!("[SESSION] '{}' for {} ({}): {}", name, author.username, author.id, err)
        }
        _ => warn!("[SESSION] '{}' failed for {} ({}): {:?}", name, author.username, author.id, err),
    }
}

async fn record_post(ctx: &dyn CommandContext) {
    let Some(store) = ctx.store() else {
        return;
    };
    match store.record_post(ctx.author()).await {
        Ok(record) => debug!("[SESSION] {} now has {} posts", record.username, record.posts),
        Err(e) => warn!("[SESSION] Failed to record post for {}: {}", ctx.author().id, e),
    }
}

// ============================================================================
// SERENITY BINDING
// ============================================================================

fn author_of(user: &serenity::model::user::User) -> Author {
    Author {
        id: user.id.0,
        username: user.name.clone(),
        bot: user.bot,
    }
}

/// CommandContext for one live message
struct SerenityContext<'a> {
    state: &'a BotState,
    ctx: &'a Context,
    msg: &'a Message,
    author: Author,
    channel: ChannelInfo,
    mentions: Vec<Author>,
}

#[async_trait]
impl<'a> CommandContext for SerenityContext<'a> {
    fn config(&self) -> &BotConfig {
        &self.state.config
    }

    fn registry(&self) -> &Registry {
        &self.state.registry
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
        self.state.store.as_ref()
    }

    fn image_board(&self) -> &dyn ImageBoard {
        self.state.board.as_ref()
    }

    async fn author_is_admin(&self) -> Result<bool, CommandError> {
        let Some(guild_id) = self.msg.guild_id else {
            return Ok(false);
        };

        let member = guild_id
            .member(self.ctx, self.msg.author.id)
            .await
            .map_err(|e| CommandError::Execution(format!("couldn't look up your roles ({})", e)))?;
        let roles = guild_id
            .roles(&self.ctx.http)
            .await
            .map_err(|e| CommandError::Execution(format!("couldn't look up the server's roles ({})", e)))?;

        let permissions: HashMap<RoleId, Permissions> =
            roles.iter().map(|(id, role)| (*id, role.permissions)).collect();
        Ok(roles_grant_admin(&member.roles, &permissions))
    }

    async fn author_voice_channel(&self) -> Option<u64> {
        let guild = self.msg.guild(&self.ctx.cache)?;
        guild
            .voice_states
            .get(&self.msg.author.id)
            .and_then(|state| state.channel_id)
            .map(|channel| channel.0)
    }
}

/// True when any of the member's roles carries ADMINISTRATOR. Role ids the guild
/// doesn't know about grant nothing.
fn roles_grant_admin(member_roles: &[RoleId], guild_roles: &HashMap<RoleId, Permissions>) -> bool {
    member_roles
        .iter()
        .filter_map(|id| guild_roles.get(id))
        .any(|permissions| permissions.contains(Permissions::ADMINISTRATOR))
}

async fn channel_is_nsfw(ctx: &Context, msg: &Message) -> bool {
    match msg.channel_id.to_channel(ctx).await {
        Ok(channel) => channel.guild().map(|gc| gc.nsfw).unwrap_or(false),
        Err(e) => {
            warn!("[SESSION] Couldn't look up channel {}: {}", msg.channel_id, e);
            false
        }
    }
}

fn build_embed<'e>(e: &'e mut CreateEmbed, payload: &EmbedPayload) -> &'e mut CreateEmbed {
    if let Some(title) = &payload.title {
        e.title(title);
    }
    if let Some(description) = &payload.description {
        e.description(description);
    }
    for field in &payload.fields {
        e.field(&field.name, &field.value, field.inline);
    }
    if let Some(color) = payload.color {
        e.color(color);
    }
    if let Some(url) = &payload.image_url {
        e.image(url);
    }
    if let Some(footer) = &payload.footer {
        e.footer(|f| f.text(footer));
    }
    e
}

/// Text only when non-empty, plus the embed and attachment if present
fn build_message<'a, 'b>(m: &'b mut CreateMessage<'a>, output: CommandOutput) -> &'b mut CreateMessage<'a> {
    let CommandOutput { text, embed, attachment } = output;

    if !text.is_empty() {
        m.content(&text);
    }
    if let Some(payload) = &embed {
        m.embed(|e| build_embed(e, payload));
    }
    if let Some(file) = attachment {
        debug!("[SESSION] Response contains a file, uploading now");
        m.add_file(AttachmentType::Bytes {
            data: file.data.into(),
            filename: file.filename,
        });
    }
    m
}

/// Send text, embed and attachment as a single message
async fn send_output(ctx: &Context, channel_id: ChannelId, output: CommandOutput) -> serenity::Result<Message> {
    channel_id
        .send_message(&ctx.http, |m| build_message(m, output))
        .await
}

pub struct Handler {
    state: Arc<BotState>,
}

impl Handler {
    pub fn new(state: Arc<BotState>) -> Self {
        Handler { state }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _: Context, ready: Ready) {
        println!("✅ Bot connected as {}!", ready.user.name);
        debug!("[SESSION] Connected to {} guilds", ready.guilds.len());
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Cheap rejections first, before any channel lookup
        if msg.content.is_empty() || msg.author.bot {
            return;
        }

        // Only commands care about the channel's NSFW flag
        let nsfw = if msg.content.starts_with(&self.state.config.prefix) {
            channel_is_nsfw(&ctx, &msg).await
        } else {
            false
        };

        let invocation = SerenityContext {
            state: &self.state,
            ctx: &ctx,
            msg: &msg,
            author: author_of(&msg.author),
            channel: ChannelInfo {
                id: msg.channel_id.0,
                guild_id: msg.guild_id.map(|g| g.0),
                nsfw,
            },
            mentions: msg.mentions.iter().map(author_of).collect(),
        };

        let Some(output) = process_message(&msg.content, &invocation).await else {
            return;
        };
        if let Err(e) = send_output(&ctx, msg.channel_id, output).await {
            error!("[SESSION] Failed to send reply to channel {}: {}", msg.channel_id, e);
        }
    }
}
