//! # Bot Module
//!
//! Serenity glue for DMasik.
//!
//! - [`router`]: the prefix command table, parsing and reply texts
//! - [`handlers`]: one async function per command
//!
//! All voice state lives in the [`SessionController`]; this module only
//! translates chat messages into controller calls and results back into
//! chat replies.

use serenity::{
    all::{ActivityData, ChannelId, Context, EventHandler, GuildId, Message, Ready, UserId},
    async_trait,
};
use std::sync::Arc;
use tracing::{error, info};

pub mod handlers;
pub mod router;

use crate::{
    audio::{driver::SongbirdGateway, SessionController},
    config::Config,
    sources::MusicLibrary,
};

pub type Controller = SessionController<SongbirdGateway>;

/// Main Discord event handler.
///
/// Ignores messages from bots (itself included) and routes prefix commands.
pub struct DMasikBot {
    pub config: Arc<Config>,
    pub controller: Controller,
    pub library: MusicLibrary,
}

impl DMasikBot {
    pub fn new(config: Arc<Config>, controller: Controller) -> Self {
        let library = MusicLibrary::new(config.music_dir.clone());

        Self {
            config,
            controller,
            library,
        }
    }

    /// Voice channel the user is currently in, from the guild cache.
    pub fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
        let guild = ctx.cache.guild(guild_id)?;
        guild
            .voice_states
            .get(&user_id)
            .and_then(|state| state.channel_id)
    }
}

#[async_trait]
impl EventHandler for DMasikBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        ctx.set_activity(Some(ActivityData::listening(format!(
            "{}help",
            self.config.command_prefix
        ))));
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if let Err(e) = handlers::handle_message(&ctx, &msg, self).await {
            error!("Error manejando mensaje {}: {:?}", msg.id, e);
        }
    }
}
