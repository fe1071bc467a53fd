//! Seams between the session controller and the outside world.
//!
//! The controller never talks to Discord directly: it joins channels through a
//! [`VoiceGateway`], owns the resulting [`VoiceConnection`] and hands it to an
//! [`AudioEncoder`] for the duration of one track. The songbird-backed versions
//! live in [`super::driver`]; tests plug in fakes.

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use tokio_util::sync::CancellationToken;

use super::queue::PlaybackRequest;

/// Opens voice connections.
#[async_trait]
pub trait VoiceGateway: Send + Sync + 'static {
    type Connection: VoiceConnection;

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> Result<Self::Connection>;
}

/// A live voice transport, exclusively owned by one session.
#[async_trait]
pub trait VoiceConnection: Send + Sync + 'static {
    async fn disconnect(&self) -> Result<()>;
}

/// Streams one source into a connection.
#[async_trait]
pub trait AudioEncoder<C: VoiceConnection>: Send + Sync + 'static {
    /// Blocks until the source reaches EOF or `stop` is cancelled.
    ///
    /// Implementations must observe `stop` between frames and return promptly
    /// once it fires; a stopped stream is not an error.
    async fn stream(
        &self,
        connection: &C,
        request: &PlaybackRequest,
        stop: CancellationToken,
    ) -> Result<()>;
}
