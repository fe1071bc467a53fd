use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info, warn};

mod audio;
mod bot;
mod config;
mod sources;
mod ui;

use crate::audio::{
    driver::{SongbirdEncoder, SongbirdGateway},
    SessionController,
};
use crate::bot::DMasikBot;
use crate::config::Config;
use crate::sources::YtDlpResolver;

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dmasik=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando DMasik v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::load()?);
    info!("⚙️ {}", config.summary());

    let resolver = YtDlpResolver::new(config.ytdlp_path.clone());

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&resolver).await;
    }

    match resolver.verify().await {
        Ok(version) => info!("✅ yt-dlp {}", version),
        Err(e) => warn!("⚠️ yt-dlp no disponible, los enlaces fallarán: {:?}", e),
    }

    let songbird = Songbird::serenity();
    let controller = SessionController::new(
        SongbirdGateway::new(songbird.clone()),
        SongbirdEncoder::new()?,
        resolver,
        config.resolve_timeout,
    );

    // Configurar intents mínimos necesarios
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = DMasikBot::new(config.clone(), controller.clone());

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // Manejar shutdown graceful
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Error al registrar Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Señal de shutdown recibida, cerrando...");
        controller.shutdown().await;
        shard_manager.shutdown_all().await;
    });

    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
    }

    Ok(())
}

async fn health_check(resolver: &YtDlpResolver) -> Result<()> {
    resolver.verify().await?;
    println!("OK");
    Ok(())
}
