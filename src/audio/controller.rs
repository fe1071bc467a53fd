//! Session controller: the only code that mutates voice sessions and the queue.
//!
//! Registry and queue sit behind one coarse [`parking_lot::Mutex`]; every
//! read-modify-write of a session's status happens under it, so two concurrent
//! `request_play` calls for the same guild can never both see `Idle`. The lock
//! is never held across an `.await`.
//!
//! Connect/disconnect additionally serialize on an async lifecycle lock, because
//! they await the gateway and the encoder task while a session is in flux.

use anyhow::anyhow;
use futures::future::join_all;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{
    backend::{AudioEncoder, VoiceConnection, VoiceGateway},
    error::{PlaybackError, PlaybackResult},
    queue::{PlayInput, PlaybackQueue, PlaybackRequest, SourceKind},
    registry::{ActivePlayback, PlayerStatus, SessionInfo, VoiceRegistry, VoiceSession},
};
use crate::sources::{parse_remote_url, LinkResolver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// Position in the global queue, 1 = next.
    Queued { position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NothingPlaying,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    /// The queue head is playing now (or will as soon as its guild's current track stops).
    Skipped(PlaybackRequest),
    /// The queue head belonged to a guild without a session and was dropped.
    Discarded(PlaybackRequest),
    NothingToSkip,
}

struct ControllerState<C> {
    registry: VoiceRegistry<C>,
    queue: PlaybackQueue,
}

pub struct SessionController<G: VoiceGateway> {
    state: Arc<Mutex<ControllerState<G::Connection>>>,
    lifecycle: Arc<tokio::sync::Mutex<()>>,
    gateway: Arc<G>,
    encoder: Arc<dyn AudioEncoder<G::Connection>>,
    resolver: Arc<dyn LinkResolver>,
    resolve_timeout: Duration,
    ids: Arc<AtomicU64>,
}

// Implementar Clone manualmente: G no tiene por qué ser Clone
impl<G: VoiceGateway> Clone for SessionController<G> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            lifecycle: self.lifecycle.clone(),
            gateway: self.gateway.clone(),
            encoder: self.encoder.clone(),
            resolver: self.resolver.clone(),
            resolve_timeout: self.resolve_timeout,
            ids: self.ids.clone(),
        }
    }
}

impl<G: VoiceGateway> SessionController<G> {
    pub fn new(
        gateway: G,
        encoder: impl AudioEncoder<G::Connection>,
        resolver: impl LinkResolver,
        resolve_timeout: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                registry: VoiceRegistry::new(),
                queue: PlaybackQueue::new(),
            })),
            lifecycle: Arc::new(tokio::sync::Mutex::new(())),
            gateway: Arc::new(gateway),
            encoder: Arc::new(encoder),
            resolver: Arc::new(resolver),
            resolve_timeout,
            ids: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Joins `channel_id`, replacing any session the guild already has.
    ///
    /// The old connection is released before the new one is opened. If the
    /// join fails, the guild is left without a session.
    pub async fn connect(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> PlaybackResult<SessionInfo> {
        let _lifecycle = self.lifecycle.lock().await;

        let previous = self.state.lock().registry.remove(guild_id);
        if let Some(previous) = previous {
            info!(
                "🔁 Reemplazando sesión de voz en guild {} (canal {})",
                guild_id, previous.channel_id
            );
            if let Err(e) = self.release(previous).await {
                warn!("⚠️ No se pudo liberar la conexión anterior en guild {}: {:?}", guild_id, e);
            }
        }

        let connection = self
            .gateway
            .join(guild_id, channel_id)
            .await
            .map_err(|source| PlaybackError::Connection { guild_id, source })?;

        let session = VoiceSession::new(self.next_id(), guild_id, channel_id, connection);
        let info = session.info();

        let displaced = self.state.lock().registry.insert(session);
        debug_assert!(displaced.is_none(), "lifecycle lock must serialize connects");

        info!("🔊 Conectado al canal {} en guild {}", channel_id, guild_id);
        Ok(info)
    }

    /// Guild-scoped lookup; `channel_id` is informational.
    pub fn lookup(&self, guild_id: GuildId, channel_id: Option<ChannelId>) -> Option<SessionInfo> {
        self.state
            .lock()
            .registry
            .lookup(guild_id, channel_id)
            .map(VoiceSession::info)
    }

    /// Stops playback, waits for the encoder task, then releases the connection.
    ///
    /// Returns `Ok(false)` when the guild had no session. A failed release is
    /// reported, but the session is gone either way.
    pub async fn disconnect(&self, guild_id: GuildId) -> PlaybackResult<bool> {
        let _lifecycle = self.lifecycle.lock().await;

        let removed = self.state.lock().registry.remove(guild_id);
        let Some(session) = removed else {
            debug!("Sin sesión que desconectar en guild {}", guild_id);
            return Ok(false);
        };

        self.release(session)
            .await
            .map_err(|source| PlaybackError::Disconnect { guild_id, source })?;

        info!("👋 Desconectado del canal de voz en guild {}", guild_id);
        Ok(true)
    }

    /// Plays `input` now if the guild is idle, otherwise queues it.
    ///
    /// Links are resolved before anything is touched: a resolution failure
    /// leaves the queue and the session exactly as they were.
    pub async fn request_play(
        &self,
        input: PlayInput,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> PlaybackResult<PlayOutcome> {
        // Evitar llamar al resolver si no hay sesión
        if self.lookup(guild_id, Some(channel_id)).is_none() {
            return Err(PlaybackError::NoActiveSession(guild_id));
        }

        debug!("Pedido {:?} en guild {}", input.kind(), guild_id);
        let request = self.resolve(input, guild_id, channel_id).await?;

        let mut guard = self.state.lock();
        self.start_or_enqueue(&mut guard, request)
    }

    /// Signals the running track to stop. A no-op when nothing is playing.
    pub fn stop(&self, guild_id: GuildId) -> PlaybackResult<StopOutcome> {
        let state = self.state.lock();
        let session = state
            .registry
            .lookup(guild_id, None)
            .ok_or(PlaybackError::NoActiveSession(guild_id))?;

        match &session.playback {
            Some(playback) => {
                info!("⏹️ Deteniendo {} en guild {}", playback.request, guild_id);
                playback.stop.cancel();
                Ok(StopOutcome::Stopped)
            }
            None => {
                debug!("Nada que detener en guild {}", guild_id);
                Ok(StopOutcome::NothingPlaying)
            }
        }
    }

    /// Pops the global queue head and plays it on its own guild's session.
    ///
    /// The head may belong to a different guild than `guild_id`. If that
    /// guild is busy, its current track is stopped and the head plays next.
    pub fn skip(&self, guild_id: GuildId) -> PlaybackResult<SkipOutcome> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.registry.lookup(guild_id, None).is_none() {
            return Err(PlaybackError::NoActiveSession(guild_id));
        }

        let Some(next) = state.queue.dequeue_front() else {
            debug!("Nada que saltar (pedido desde guild {})", guild_id);
            return Ok(SkipOutcome::NothingToSkip);
        };

        let target = next.guild_id();
        if target != guild_id {
            debug!(
                "⏭️ Skip en guild {} avanza la cola global hacia guild {}",
                guild_id, target
            );
        }

        let Some(session) = state.registry.get_mut(target) else {
            warn!("🗑️ Descartado {}: guild {} ya no tiene sesión", next, target);
            return Ok(SkipOutcome::Discarded(next));
        };

        match &session.playback {
            Some(current) => {
                info!("⏭️ Saltando {} en guild {}", current.request, target);
                current.stop.cancel();
                if let Some(replaced) = session.pending.replace(next.clone()) {
                    info!("⏭️ {} también saltado antes de sonar", replaced);
                }
            }
            None => self.spawn_playback(session, next.clone()),
        }

        Ok(SkipOutcome::Skipped(next))
    }

    /// Snapshot of the global queue, head first.
    pub fn queued(&self) -> Vec<PlaybackRequest> {
        self.state.lock().queue.snapshot()
    }

    /// Disconnects every session, cancelling and awaiting their encoder tasks.
    pub async fn shutdown(&self) {
        let _lifecycle = self.lifecycle.lock().await;

        let sessions = self.state.lock().registry.drain();
        if sessions.is_empty() {
            return;
        }

        info!("⚠️ Cerrando {} sesiones de voz", sessions.len());
        let releases = sessions.into_iter().map(|session| async move {
            let guild_id = session.guild_id;
            if let Err(e) = self.release(session).await {
                error!("Error al liberar la sesión de guild {}: {:?}", guild_id, e);
            }
        });
        join_all(releases).await;
    }

    async fn resolve(
        &self,
        input: PlayInput,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> PlaybackResult<PlaybackRequest> {
        let source_ref = match input {
            PlayInput::Local(path) => {
                return Ok(PlaybackRequest::new(
                    path.to_string_lossy(),
                    SourceKind::Local,
                    guild_id,
                    channel_id,
                ))
            }
            PlayInput::Direct(url) => parse_remote_url(&url)
                .map(String::from)
                .map_err(|source| PlaybackError::Resolution { url, source })?,
            PlayInput::Link(url) => {
                debug!("🔍 Resolviendo {} para guild {}", url, guild_id);
                let lookup = self.resolver.resolve(&url);
                let resolved = match tokio::time::timeout(self.resolve_timeout, lookup).await {
                    Ok(result) => result,
                    Err(_) => Err(anyhow!(
                        "sin respuesta tras {}",
                        humantime::format_duration(self.resolve_timeout)
                    )),
                };
                resolved.map_err(|source| PlaybackError::Resolution { url, source })?
            }
        };

        Ok(PlaybackRequest::new(source_ref, SourceKind::Remote, guild_id, channel_id))
    }

    fn start_or_enqueue(
        &self,
        state: &mut ControllerState<G::Connection>,
        request: PlaybackRequest,
    ) -> PlaybackResult<PlayOutcome> {
        let guild_id = request.guild_id();
        let session = state
            .registry
            .get_mut(guild_id)
            .ok_or(PlaybackError::NoActiveSession(guild_id))?;

        match session.status {
            PlayerStatus::Idle => {
                self.spawn_playback(session, request);
                Ok(PlayOutcome::Started)
            }
            PlayerStatus::Playing => {
                let position = state.queue.enqueue(request);
                Ok(PlayOutcome::Queued { position })
            }
        }
    }

    /// Must be called with the state lock held and the session idle.
    fn spawn_playback(&self, session: &mut VoiceSession<G::Connection>, request: PlaybackRequest) {
        let guild_id = session.guild_id;
        let session_id = session.id;
        let playback_id = self.next_id();
        let stop = CancellationToken::new();

        let controller = self.clone();
        let connection = session.connection.clone();
        let task_request = request.clone();
        let task_stop = stop.clone();

        info!("▶️ Reproduciendo {} en guild {}", request, guild_id);

        let task = tokio::spawn(async move {
            // Tarea interna: un pánico del encoder no debe dejar la sesión en Playing
            let encoder = controller.encoder.clone();
            let stream_request = task_request.clone();
            let streaming = tokio::spawn(async move {
                encoder
                    .stream(&*connection, &stream_request, task_stop)
                    .await
            });

            match streaming.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("⚠️ Reproducción de {} terminó con error: {:?}", task_request, e)
                }
                Err(e) => error!(
                    "💥 El encoder falló con {} en guild {}: {}",
                    task_request, guild_id, e
                ),
            }
            controller.finish_playback(guild_id, session_id, playback_id);
        });

        session.status = PlayerStatus::Playing;
        session.playback = Some(ActivePlayback {
            id: playback_id,
            request,
            stop,
            task,
        });
    }

    /// Runs on the encoder task once streaming returned, for whatever reason.
    fn finish_playback(&self, guild_id: GuildId, session_id: u64, playback_id: u64) {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let Some(session) = state.registry.get_mut(guild_id) else {
            debug!("Sesión de guild {} ya liberada", guild_id);
            return;
        };
        let current = session.playback.as_ref().map(|p| p.id);
        if session.id != session_id || current != Some(playback_id) {
            debug!("Tarea obsoleta en guild {}, ignorada", guild_id);
            return;
        }

        session.playback = None;
        session.status = PlayerStatus::Idle;
        debug!("Reproducción terminada en guild {}", guild_id);

        if let Some(pending) = session.pending.take() {
            self.spawn_playback(session, pending);
            return;
        }

        self.advance_queue(state);
    }

    /// Starts the global head if its guild is idle. A head whose guild is busy
    /// goes back to the front; heads of departed guilds are dropped.
    fn advance_queue(&self, state: &mut ControllerState<G::Connection>) {
        while let Some(next) = state.queue.dequeue_front() {
            let target = next.guild_id();
            match state.registry.get_mut(target) {
                None => warn!("🗑️ Descartado {}: guild {} ya no tiene sesión", next, target),
                Some(session) if session.status == PlayerStatus::Playing => {
                    state.queue.requeue_front(next);
                    return;
                }
                Some(session) => {
                    self.spawn_playback(session, next);
                    return;
                }
            }
        }
    }

    async fn release(&self, mut session: VoiceSession<G::Connection>) -> anyhow::Result<()> {
        session.pending = None;

        if let Some(playback) = session.playback.take() {
            playback.stop.cancel();
            if let Err(e) = playback.task.await {
                error!("La tarea de reproducción en guild {} falló: {:?}", session.guild_id, e);
            }
        }

        session.connection.disconnect().await
    }

    fn next_id(&self) -> u64 {
        self.ids.fetch_add(1, Ordering::Relaxed)
    }
}
