pub mod library;
pub mod youtube;

use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

pub use library::{LibraryEntry, LibraryPage, MusicLibrary};
pub use youtube::YtDlpResolver;

/// Turns a shareable media URL into a directly streamable audio URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkResolver: Send + Sync + 'static {
    async fn resolve(&self, url: &str) -> Result<String>;
}

/// Acepta solo URLs http(s) absolutas
pub fn parse_remote_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("URL mal formada: {raw}"))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => anyhow::bail!("esquema no soportado ({scheme}): {raw}"),
    }
}
