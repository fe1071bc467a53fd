use anyhow::Result;
use serenity::{
    builder::{CreateEmbed, CreateMessage},
    model::{
        channel::Message,
        id::{ChannelId, GuildId},
    },
    prelude::Context,
};
use std::path::PathBuf;
use tracing::{info, warn};

use super::{
    router::{self, Command, LibraryAction, Route},
    DMasikBot,
};
use crate::{
    audio::PlayInput,
    sources::LibraryPage,
    ui::embeds,
};

/// Entry point for every non-bot message.
pub async fn handle_message(ctx: &Context, msg: &Message, bot: &DMasikBot) -> Result<()> {
    let prefix = bot.config.command_prefix.as_str();

    if let Some(reply) = router::auto_reply(&msg.content) {
        say(ctx, msg.channel_id, reply).await?;
    }

    let (command, args) = match router::route(prefix, &msg.content) {
        Route::Ignore => return Ok(()),
        Route::Unknown(name) => {
            info!("❓ Comando desconocido {:?} de {}", name, msg.author.name);
            return say(ctx, msg.channel_id, router::unknown_command_reply(prefix, name)).await;
        }
        Route::Invoke { command, args } => (command, args),
    };

    info!(
        "📝 Comando {:?} usado por {} en guild {:?}",
        command, msg.author.name, msg.guild_id
    );

    match command {
        Command::Ping => say(ctx, msg.channel_id, "Pong!").await,
        Command::Pong => say(ctx, msg.channel_id, "Ping!").await,
        Command::Help => send_embed(ctx, msg.channel_id, embeds::create_help_embed(prefix)).await,
        Command::Flex => say(ctx, msg.channel_id, router::FLEX_REPLY).await,
        Command::Text => {
            let avatar = ctx.cache.current_user().face();
            send_embed(ctx, msg.channel_id, embeds::create_sample_embed(&avatar)).await?;
            say(ctx, msg.channel_id, "text").await
        }
        _ => {
            let Some(guild_id) = msg.guild_id else {
                return say(ctx, msg.channel_id, "This command only works in a server.").await;
            };
            handle_guild_command(ctx, msg, bot, guild_id, command, &args).await
        }
    }
}

async fn handle_guild_command(
    ctx: &Context,
    msg: &Message,
    bot: &DMasikBot,
    guild_id: GuildId,
    command: Command,
    args: &[&str],
) -> Result<()> {
    let prefix = bot.config.command_prefix.as_str();

    match command {
        Command::Connect => handle_connect(ctx, msg, bot, guild_id).await,
        Command::Disconnect => handle_disconnect(ctx, msg, bot, guild_id).await,
        Command::Play | Command::Youtube => {
            let Some(url) = args.first() else {
                return say(ctx, msg.channel_id, router::missing_url_reply(prefix, command)).await;
            };
            let input = if command == Command::Play {
                PlayInput::Direct(url.to_string())
            } else {
                PlayInput::Link(url.to_string())
            };
            handle_play(ctx, msg, bot, guild_id, input).await
        }
        Command::Library => match router::parse_library_args(prefix, args) {
            Ok(LibraryAction::List { page }) => handle_library_list(ctx, msg, bot, page).await,
            Ok(LibraryAction::Play { number }) => {
                handle_library_play(ctx, msg, bot, guild_id, number).await
            }
            Err(hint) => say(ctx, msg.channel_id, hint).await,
        },
        Command::Bruh => {
            let input = PlayInput::Local(bot.config.bruh_sound.clone());
            handle_play(ctx, msg, bot, guild_id, input).await
        }
        Command::Stal => {
            let input = PlayInput::Local(bot.config.stal_sound.clone());
            handle_play(ctx, msg, bot, guild_id, input).await
        }
        Command::Stop => {
            let reply = match bot.controller.stop(guild_id) {
                Ok(outcome) => router::stop_reply(outcome).to_string(),
                Err(e) => router::error_reply(prefix, &e),
            };
            say(ctx, msg.channel_id, reply).await
        }
        Command::Skip => {
            let reply = match bot.controller.skip(guild_id) {
                Ok(outcome) => router::skip_reply(&outcome),
                Err(e) => router::error_reply(prefix, &e),
            };
            say(ctx, msg.channel_id, reply).await
        }
        Command::Queue => {
            let session = bot.controller.lookup(guild_id, None);
            let queued = bot.controller.queued();
            let embed = embeds::create_queue_embed(session.as_ref(), &queued);
            send_embed(ctx, msg.channel_id, embed).await
        }
        Command::Ping | Command::Pong | Command::Help | Command::Flex | Command::Text => Ok(()),
    }
}

async fn handle_connect(ctx: &Context, msg: &Message, bot: &DMasikBot, guild_id: GuildId) -> Result<()> {
    let Some(voice_channel) = DMasikBot::user_voice_channel(ctx, guild_id, msg.author.id) else {
        return say(ctx, msg.channel_id, "Join a voice channel first.").await;
    };

    let reply = match bot.controller.connect(guild_id, voice_channel).await {
        Ok(session) => format!("🔊 Connected to <#{}>", session.channel_id),
        Err(e) => {
            warn!("{}", e);
            router::error_reply(&bot.config.command_prefix, &e)
        }
    };
    say(ctx, msg.channel_id, reply).await
}

async fn handle_disconnect(ctx: &Context, msg: &Message, bot: &DMasikBot, guild_id: GuildId) -> Result<()> {
    let reply = match bot.controller.disconnect(guild_id).await {
        Ok(true) => "👋 Disconnected".to_string(),
        Ok(false) => "I'm not in a voice channel.".to_string(),
        Err(e) => {
            warn!("{}", e);
            router::error_reply(&bot.config.command_prefix, &e)
        }
    };
    say(ctx, msg.channel_id, reply).await
}

/// The target channel is the author's; lookup is guild-scoped, so a user in
/// another channel still plays into the bot's current one.
async fn handle_play(
    ctx: &Context,
    msg: &Message,
    bot: &DMasikBot,
    guild_id: GuildId,
    input: PlayInput,
) -> Result<()> {
    let channel_id = DMasikBot::user_voice_channel(ctx, guild_id, msg.author.id)
        .or_else(|| bot.controller.lookup(guild_id, None).map(|s| s.channel_id));
    let Some(channel_id) = channel_id else {
        return say(ctx, msg.channel_id, "Join a voice channel first.").await;
    };

    if matches!(input, PlayInput::Link(_)) {
        // yt-dlp puede tardar varios segundos
        let _ = msg.channel_id.broadcast_typing(&ctx.http).await;
    }

    let reply = match bot.controller.request_play(input, guild_id, channel_id).await {
        Ok(outcome) => router::play_reply(&outcome),
        Err(e) => {
            warn!("{}", e);
            router::error_reply(&bot.config.command_prefix, &e)
        }
    };
    say(ctx, msg.channel_id, reply).await
}

async fn handle_library_list(ctx: &Context, msg: &Message, bot: &DMasikBot, page: usize) -> Result<()> {
    let entries = match bot.library.scan().await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "⚠️ No se pudo leer la librería en {}: {:?}",
                bot.library.root().display(),
                e
            );
            return say(ctx, msg.channel_id, "The music library is unavailable right now.").await;
        }
    };

    let page = LibraryPage::new(&entries, page, bot.config.library_page_size);
    if page.is_empty() {
        return say(
            ctx,
            msg.channel_id,
            format!(
                "Sorry, page {} is too big for my small music library ({} pages).",
                page.current_page, page.total_pages
            ),
        )
        .await;
    }

    send_embed(ctx, msg.channel_id, embeds::create_library_embed(&page)).await
}

async fn handle_library_play(
    ctx: &Context,
    msg: &Message,
    bot: &DMasikBot,
    guild_id: GuildId,
    number: usize,
) -> Result<()> {
    let path: PathBuf = match bot.library.get(number).await {
        Ok(Some(entry)) => entry.path,
        Ok(None) => {
            let reply = format!(
                "There is no track {number}, see `{}library list 1`",
                bot.config.command_prefix
            );
            return say(ctx, msg.channel_id, reply).await;
        }
        Err(e) => {
            warn!("⚠️ No se pudo leer la librería: {:?}", e);
            return say(ctx, msg.channel_id, "The music library is unavailable right now.").await;
        }
    };

    info!("📀 Librería #{} → {}", number, path.display());
    handle_play(ctx, msg, bot, guild_id, PlayInput::Local(path)).await
}

async fn say(ctx: &Context, channel_id: ChannelId, text: impl Into<String>) -> Result<()> {
    channel_id.say(&ctx.http, text).await?;
    Ok(())
}

async fn send_embed(ctx: &Context, channel_id: ChannelId, embed: CreateEmbed) -> Result<()> {
    channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await?;
    Ok(())
}
