//! In-memory collaborators for controller tests.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;

use super::{
    backend::{AudioEncoder, VoiceConnection, VoiceGateway},
    queue::PlaybackRequest,
};
use crate::sources::LinkResolver;

/// Polls `condition` until it holds, failing the test after a few seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let wait = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("condition never became true");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    Joined { connection: u64, guild: GuildId },
    Released { connection: u64 },
}

#[derive(Default)]
struct GatewayState {
    events: Mutex<Vec<GatewayEvent>>,
    violations: Mutex<Vec<String>>,
    next_connection: AtomicU64,
    fail_joins: AtomicBool,
    fail_disconnects: AtomicBool,
}

#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<GatewayState>,
}

impl FakeGateway {
    pub fn fail_joins(&self, fail: bool) {
        self.state.fail_joins.store(fail, Ordering::SeqCst);
    }

    pub fn fail_disconnects(&self, fail: bool) {
        self.state.fail_disconnects.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<GatewayEvent> {
        self.state.events.lock().clone()
    }

    pub fn released(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, GatewayEvent::Released { .. }))
            .count()
    }

    /// Connections released while an encoder was still streaming into them.
    pub fn violations(&self) -> Vec<String> {
        self.state.violations.lock().clone()
    }
}

#[async_trait]
impl VoiceGateway for FakeGateway {
    type Connection = FakeConnection;

    async fn join(&self, guild_id: GuildId, _channel_id: ChannelId) -> Result<FakeConnection> {
        if self.state.fail_joins.load(Ordering::SeqCst) {
            anyhow::bail!("voice server unreachable");
        }

        let id = self.state.next_connection.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.events.lock().push(GatewayEvent::Joined {
            connection: id,
            guild: guild_id,
        });

        Ok(FakeConnection {
            id,
            gateway: self.state.clone(),
            streaming: AtomicUsize::new(0),
            released: AtomicBool::new(false),
        })
    }
}

pub struct FakeConnection {
    id: u64,
    gateway: Arc<GatewayState>,
    streaming: AtomicUsize,
    released: AtomicBool,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    async fn disconnect(&self) -> Result<()> {
        if self.streaming.load(Ordering::SeqCst) > 0 {
            self.gateway
                .violations
                .lock()
                .push(format!("connection {} released mid-stream", self.id));
        }
        self.released.store(true, Ordering::SeqCst);
        self.gateway
            .events
            .lock()
            .push(GatewayEvent::Released { connection: self.id });

        if self.gateway.fail_disconnects.load(Ordering::SeqCst) {
            anyhow::bail!("voice websocket already closed");
        }
        Ok(())
    }
}

#[derive(Default)]
struct EncoderState {
    started: Mutex<Vec<String>>,
    stopped: Mutex<Vec<String>>,
    /// Fuente en curso → token para terminarla "naturalmente"
    active: Mutex<HashMap<String, CancellationToken>>,
    failing: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
}

/// Streams until the test calls [`FakeEncoder::finish`] or the stop token fires.
#[derive(Clone, Default)]
pub struct FakeEncoder {
    state: Arc<EncoderState>,
}

impl FakeEncoder {
    pub fn fail_on(&self, source: &str) {
        self.state.failing.lock().insert(source.to_string());
    }

    pub fn panic_on(&self, source: &str) {
        self.state.panicking.lock().insert(source.to_string());
    }

    /// Simulates EOF on a source that is currently streaming.
    pub fn finish(&self, source: &str) {
        let token = self.state.active.lock().get(source).cloned();
        token
            .unwrap_or_else(|| panic!("{source} is not streaming"))
            .cancel();
    }

    pub fn started(&self) -> Vec<String> {
        self.state.started.lock().clone()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.state.stopped.lock().clone()
    }

    pub fn streaming(&self) -> Vec<String> {
        self.state.active.lock().keys().cloned().collect()
    }
}

#[async_trait]
impl AudioEncoder<FakeConnection> for FakeEncoder {
    async fn stream(
        &self,
        connection: &FakeConnection,
        request: &PlaybackRequest,
        stop: CancellationToken,
    ) -> Result<()> {
        let source = request.source_ref().to_string();
        if connection.released.load(Ordering::SeqCst) {
            anyhow::bail!("stream started on released connection {}", connection.id);
        }
        self.state.started.lock().push(source.clone());

        if self.state.failing.lock().contains(&source) {
            anyhow::bail!("decoder error in {source}");
        }
        if self.state.panicking.lock().contains(&source) {
            panic!("decoder crashed on {source}");
        }

        let eof = CancellationToken::new();
        connection.streaming.fetch_add(1, Ordering::SeqCst);
        self.state.active.lock().insert(source.clone(), eof.clone());

        tokio::select! {
            _ = stop.cancelled() => self.state.stopped.lock().push(source.clone()),
            _ = eof.cancelled() => {}
        }

        self.state.active.lock().remove(&source);
        connection.streaming.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Resolver that never answers in time.
pub struct SlowResolver(pub Duration);

#[async_trait]
impl LinkResolver for SlowResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        tokio::time::sleep(self.0).await;
        Ok(url.to_string())
    }
}
