use serenity::model::id::{ChannelId, GuildId};
use std::{collections::VecDeque, fmt, path::PathBuf};
use tracing::{debug, info};

/// Where a request's audio comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A file on disk (library or sound shortcut).
    Local,
    /// A URL the encoder fetches over HTTP.
    Remote,
}

/// What a command asked to play, before link resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayInput {
    Local(PathBuf),
    /// A URL that is already streamable.
    Direct(String),
    /// A shareable page URL that must go through the link resolver first.
    Link(String),
}

impl PlayInput {
    pub fn kind(&self) -> SourceKind {
        match self {
            PlayInput::Local(_) => SourceKind::Local,
            PlayInput::Direct(_) | PlayInput::Link(_) => SourceKind::Remote,
        }
    }
}

/// A resolved, immutable playback request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    source_ref: String,
    source_kind: SourceKind,
    guild_id: GuildId,
    channel_id: ChannelId,
}

impl PlaybackRequest {
    pub fn new(
        source_ref: impl Into<String>,
        source_kind: SourceKind,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Self {
        Self {
            source_ref: source_ref.into(),
            source_kind,
            guild_id,
            channel_id,
        }
    }

    pub fn source_ref(&self) -> &str {
        &self.source_ref
    }
    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }
}

impl fmt::Display for PlaybackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source_kind {
            SourceKind::Local => write!(f, "{}", self.source_ref),
            SourceKind::Remote => write!(f, "<{}>", self.source_ref),
        }
    }
}

/// Global FIFO of pending requests, shared by every guild.
///
/// Not partitioned per guild: the head may belong to any guild, and whoever
/// advances the queue plays it on that guild's session.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    items: VecDeque<PlaybackRequest>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega al final y devuelve la posición (1 = siguiente)
    pub fn enqueue(&mut self, request: PlaybackRequest) -> usize {
        info!(
            "➕ Agregado a la cola global: {} (guild {})",
            request, request.guild_id
        );
        self.items.push_back(request);
        self.items.len()
    }

    /// Saca el primero de la cola (FIFO estricto)
    pub fn dequeue_front(&mut self) -> Option<PlaybackRequest> {
        let next = self.items.pop_front();
        match &next {
            Some(request) => debug!("➡️ Siguiente en cola: {} (guild {})", request, request.guild_id),
            None => debug!("📭 Cola vacía"),
        }
        next
    }

    /// Devuelve a la cabeza un pedido recién sacado que todavía no puede sonar
    pub fn requeue_front(&mut self, request: PlaybackRequest) {
        debug!(
            "↩️ {} vuelve a la cabeza de la cola (guild {} ocupado)",
            request, request.guild_id
        );
        self.items.push_front(request);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn snapshot(&self) -> Vec<PlaybackRequest> {
        self.items.iter().cloned().collect()
    }
}
