//! Songbird implementations of the voice seams.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    error::JoinError,
    input::{File, HttpRequest, Input},
    tracks::PlayMode,
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{
    backend::{AudioEncoder, VoiceConnection, VoiceGateway},
    queue::{PlaybackRequest, SourceKind},
};

/// Joins voice channels through the shared songbird manager.
#[derive(Clone)]
pub struct SongbirdGateway {
    manager: Arc<Songbird>,
}

impl SongbirdGateway {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl VoiceGateway for SongbirdGateway {
    type Connection = SongbirdConnection;

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<SongbirdConnection> {
        let call = self
            .manager
            .join(guild_id, channel_id)
            .await
            .with_context(|| format!("songbird no pudo unirse al canal {channel_id}"))?;

        // Igual que antes: entrar ensordecido, el bot no escucha
        if let Err(e) = call.lock().await.deafen(true).await {
            warn!("⚠️ No se pudo ensordecer en guild {}: {:?}", guild_id, e);
        }

        Ok(SongbirdConnection {
            manager: self.manager.clone(),
            guild_id,
            call,
        })
    }
}

pub struct SongbirdConnection {
    manager: Arc<Songbird>,
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    async fn disconnect(&self) -> Result<()> {
        match self.manager.remove(self.guild_id).await {
            Ok(()) => Ok(()),
            // Ya expulsado del canal: no queda nada que liberar
            Err(JoinError::NoCall) => {
                debug!("Sin llamada activa en guild {}", self.guild_id);
                Ok(())
            }
            Err(e) => Err(e).context("songbird no pudo abandonar el canal"),
        }
    }
}

#[derive(Debug)]
enum TrackOutcome {
    Ended,
    Failed(String),
}

/// Forwards the first end/error event of a track to the waiting encoder call.
struct TrackOutcomeNotifier {
    tx: flume::Sender<TrackOutcome>,
}

#[async_trait]
impl VoiceEventHandler for TrackOutcomeNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            for (state, _handle) in *tracks {
                let outcome = match &state.playing {
                    PlayMode::Errored(e) => TrackOutcome::Failed(format!("{e:?}")),
                    _ => TrackOutcome::Ended,
                };
                let _ = self.tx.send(outcome);
            }
        }

        None
    }
}

/// Plays files with symphonia and remote URLs over HTTP via songbird's driver.
pub struct SongbirdEncoder {
    http: reqwest::Client,
}

impl SongbirdEncoder {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self { http })
    }

    fn input_for(&self, request: &PlaybackRequest) -> Input {
        match request.source_kind() {
            SourceKind::Local => File::new(PathBuf::from(request.source_ref())).into(),
            SourceKind::Remote => {
                HttpRequest::new(self.http.clone(), request.source_ref().to_string()).into()
            }
        }
    }
}

#[async_trait]
impl AudioEncoder<SongbirdConnection> for SongbirdEncoder {
    async fn stream(
        &self,
        connection: &SongbirdConnection,
        request: &PlaybackRequest,
        stop: CancellationToken,
    ) -> Result<()> {
        let input = self.input_for(request);
        let track = connection.call.lock().await.play_input(input);

        let (tx, rx) = flume::unbounded();
        for event in [TrackEvent::End, TrackEvent::Error] {
            let registered = track.add_event(
                Event::Track(event),
                TrackOutcomeNotifier { tx: tx.clone() },
            );
            if let Err(e) = registered {
                let _ = track.stop();
                return Err(anyhow!("no se pudo registrar el evento {event:?}: {e:?}"));
            }
        }
        drop(tx);

        // Pistas muy cortas pueden terminar antes de registrar los eventos
        if track.get_info().await.is_err() {
            debug!("Pista {} ya terminada", request);
            return Ok(());
        }

        tokio::select! {
            _ = stop.cancelled() => {
                let _ = track.stop();
                debug!("⏹️ Pista {} detenida en guild {}", request, connection.guild_id);
                Ok(())
            }
            outcome = rx.recv_async() => match outcome {
                Ok(TrackOutcome::Ended) => Ok(()),
                Ok(TrackOutcome::Failed(reason)) => Err(anyhow!("error de reproducción: {reason}")),
                Err(_) => Err(anyhow!("el driver de voz cerró la pista sin evento de fin")),
            },
        }
    }
}
