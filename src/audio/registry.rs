use serenity::model::id::{ChannelId, GuildId};
use std::{collections::HashMap, sync::Arc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::queue::PlaybackRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Idle,
    Playing,
}

/// The encoder task currently streaming into a session.
pub(super) struct ActivePlayback {
    pub id: u64,
    pub request: PlaybackRequest,
    pub stop: CancellationToken,
    pub task: JoinHandle<()>,
}

/// One guild's voice connection plus its playback state.
///
/// `status == Playing` exactly when `playback` is `Some`.
pub struct VoiceSession<C> {
    pub(super) id: u64,
    pub(super) guild_id: GuildId,
    pub(super) channel_id: ChannelId,
    pub(super) connection: Arc<C>,
    pub(super) status: PlayerStatus,
    pub(super) playback: Option<ActivePlayback>,
    /// Picked by `skip` while this session was busy; plays instead of the queue head.
    pub(super) pending: Option<PlaybackRequest>,
}

impl<C> VoiceSession<C> {
    pub(super) fn new(id: u64, guild_id: GuildId, channel_id: ChannelId, connection: C) -> Self {
        Self {
            id,
            guild_id,
            channel_id,
            connection: Arc::new(connection),
            status: PlayerStatus::Idle,
            playback: None,
            pending: None,
        }
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            guild_id: self.guild_id,
            channel_id: self.channel_id,
            status: self.status,
            now_playing: self.playback.as_ref().map(|p| p.request.clone()),
        }
    }
}

/// Read-only view of a session handed out of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub status: PlayerStatus,
    pub now_playing: Option<PlaybackRequest>,
}

/// Guild → session map. At most one session per guild.
pub struct VoiceRegistry<C> {
    sessions: HashMap<GuildId, VoiceSession<C>>,
}

impl<C> Default for VoiceRegistry<C> {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }
}

impl<C> VoiceRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `session`, returning whatever it displaced for the same guild.
    pub fn insert(&mut self, session: VoiceSession<C>) -> Option<VoiceSession<C>> {
        self.sessions.insert(session.guild_id, session)
    }

    /// Lookup is guild-scoped; the channel is informational only.
    pub fn lookup(&self, guild_id: GuildId, _channel_id: Option<ChannelId>) -> Option<&VoiceSession<C>> {
        self.sessions.get(&guild_id)
    }

    pub fn get_mut(&mut self, guild_id: GuildId) -> Option<&mut VoiceSession<C>> {
        self.sessions.get_mut(&guild_id)
    }

    pub fn remove(&mut self, guild_id: GuildId) -> Option<VoiceSession<C>> {
        self.sessions.remove(&guild_id)
    }

    pub fn drain(&mut self) -> Vec<VoiceSession<C>> {
        self.sessions.drain().map(|(_, session)| session).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
