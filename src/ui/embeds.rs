use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};

use crate::{
    audio::{PlaybackRequest, SessionInfo},
    bot::router::{status_label, Command},
    sources::LibraryPage,
};

/// Paleta de colores del bot
pub mod colors {
    use serenity::all::Colour;

    pub const LIBRARY_BLACK: Colour = Colour::from_rgb(0, 0, 0);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const SAMPLE_GREEN: Colour = Colour::from_rgb(0, 255, 0);
}

const STANDARD_FOOTER: &str = "🎵 DMasik";

/// Cuántos pedidos de la cola se muestran como máximo
const QUEUE_PREVIEW: usize = 15;

pub fn create_library_embed(page: &LibraryPage) -> CreateEmbed {
    CreateEmbed::default()
        .title(library_title(page))
        .description(page.render())
        .color(colors::LIBRARY_BLACK)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

fn library_title(page: &LibraryPage) -> String {
    format!(
        "Music Library Page: [{} / {}]",
        page.current_page, page.total_pages
    )
}

pub fn create_help_embed(prefix: &str) -> CreateEmbed {
    let mut embed = CreateEmbed::default()
        .title("📋 Commands")
        .color(colors::INFO_BLUE);

    for command in Command::all() {
        let names = command
            .names()
            .iter()
            .map(|name| format!("`{prefix}{name}`"))
            .collect::<Vec<_>>()
            .join(" ");
        embed = embed.field(names, command.usage(), false);
    }

    embed.footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Showcase embed for the `text` command.
pub fn create_sample_embed(avatar_url: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("I am an Embed")
        .description("This is a serenity embed")
        .color(colors::SAMPLE_GREEN)
        .field("I am a field1", "I am a value2", true)
        .image(avatar_url)
        .thumbnail(avatar_url)
        .timestamp(Timestamp::now())
}

pub fn create_queue_embed(session: Option<&SessionInfo>, queued: &[PlaybackRequest]) -> CreateEmbed {
    let now_playing = match session {
        Some(SessionInfo {
            now_playing: Some(request),
            ..
        }) => request.to_string(),
        Some(info) => status_label(info.status).to_string(),
        None => "not connected".to_string(),
    };

    CreateEmbed::default()
        .title("🎶 Queue")
        .color(colors::MUSIC_PURPLE)
        .field("Now", now_playing, false)
        .description(queue_description(queued))
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(format!(
            "{STANDARD_FOOTER} • one queue shared by every server"
        )))
}

fn queue_description(queued: &[PlaybackRequest]) -> String {
    if queued.is_empty() {
        return "The queue is empty".to_string();
    }

    let mut lines: Vec<String> = queued
        .iter()
        .take(QUEUE_PREVIEW)
        .enumerate()
        .map(|(i, request)| format!("{}) {} (server {})", i + 1, request, request.guild_id()))
        .collect();

    if queued.len() > QUEUE_PREVIEW {
        lines.push(format!("… and {} more", queued.len() - QUEUE_PREVIEW));
    }

    lines.join("\n")
}
