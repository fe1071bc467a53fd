//! Error taxonomy surfaced by the session controller.

use serenity::model::id::GuildId;
use thiserror::Error;

/// Errors reported to the command router.
///
/// None of these are fatal: every variant ends up as a chat reply.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Joining the voice channel failed. No session was registered.
    #[error("could not join voice channel in guild {guild_id}: {source}")]
    Connection {
        guild_id: GuildId,
        #[source]
        source: anyhow::Error,
    },

    /// Releasing the voice connection failed. The session is gone regardless.
    #[error("could not release voice connection in guild {guild_id}: {source}")]
    Disconnect {
        guild_id: GuildId,
        #[source]
        source: anyhow::Error,
    },

    /// A remote link could not be turned into a streamable URL.
    #[error("could not resolve {url}: {source}")]
    Resolution {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no active voice session in guild {0}")]
    NoActiveSession(GuildId),
}

pub type PlaybackResult<T> = Result<T, PlaybackError>;
