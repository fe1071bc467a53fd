//! # Audio Module
//!
//! Voice sessions and the playback queue.
//!
//! ## Architecture
//!
//! ### [`registry`] - Voice Registry
//! - One [`registry::VoiceSession`] per guild, keyed by guild id
//! - Each session owns its voice connection and playback status
//!
//! ### [`queue`] - Playback Queue
//! - A single FIFO shared by every guild
//! - Requests are immutable once accepted
//!
//! ### [`controller`] - Session Controller
//! - connect / disconnect / play / stop / skip, serialized under one lock
//! - One tracked encoder task per session, cancelled through a
//!   [`tokio_util::sync::CancellationToken`] and awaited before the
//!   connection is released
//!
//! ### [`driver`] - Songbird
//! - [`backend`] traits implemented on top of songbird's `Call`
//!
//! ## Example
//!
//! ```rust,ignore
//! # async fn example(controller: dmasik::audio::SessionController<dmasik::audio::driver::SongbirdGateway>) -> anyhow::Result<()> {
//! use dmasik::audio::PlayInput;
//! use serenity::all::{ChannelId, GuildId};
//!
//! let guild_id = GuildId::new(123456789);
//! let channel_id = ChannelId::new(987654321);
//!
//! controller.connect(guild_id, channel_id).await?;
//! controller
//!     .request_play(PlayInput::Local("./audio/bruh.opus".into()), guild_id, channel_id)
//!     .await?;
//! controller.stop(guild_id)?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod controller;
pub mod driver;
pub mod error;
pub mod queue;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{PlayOutcome, SessionController, SkipOutcome, StopOutcome};
pub use error::{PlaybackError, PlaybackResult};
pub use queue::{PlayInput, PlaybackRequest, SourceKind};
pub use registry::{PlayerStatus, SessionInfo};
