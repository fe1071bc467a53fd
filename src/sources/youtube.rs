use anyhow::{Context, Result};
use async_process::Command;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use super::{parse_remote_url, LinkResolver};

static YOUTUBE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.|m\.)?(youtube\.com/(watch\?v=|embed/|v/|shorts/)|youtu\.be/|music\.youtube\.com/)")
        .expect("static regex")
});

/// Resolves shareable links to a direct audio URL by asking yt-dlp.
pub struct YtDlpResolver {
    executable: String,
    // Limitar procesos yt-dlp concurrentes para evitar rate limiting
    rate_limiter: Semaphore,
}

impl YtDlpResolver {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            rate_limiter: Semaphore::new(3),
        }
    }

    pub fn is_youtube_url(url: &str) -> bool {
        YOUTUBE_URL.is_match(url)
    }

    /// Verifica que yt-dlp esté instalado
    pub async fn verify(&self) -> Result<String> {
        let output = Command::new(&self.executable)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("no se pudo ejecutar {}", self.executable))?;

        if !output.status.success() {
            anyhow::bail!("{} --version terminó con {}", self.executable, output.status);
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl LinkResolver for YtDlpResolver {
    async fn resolve(&self, url: &str) -> Result<String> {
        let url = parse_remote_url(url)?;
        if !Self::is_youtube_url(url.as_str()) {
            debug!("URL no es de YouTube, se intenta igualmente: {}", url);
        }

        let _permit = self.rate_limiter.acquire().await?;
        debug!("🎵 Obteniendo URL de stream para: {}", url);

        let output = Command::new(&self.executable)
            .args([
                "--no-playlist",
                "-f",
                "bestaudio/best",
                "--get-url",
                "--no-warnings",
                url.as_str(),
            ])
            .kill_on_drop(true)
            .output()
            .await
            .context("Error al ejecutar yt-dlp")?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp error: {}", error.trim());
        }

        let stream_url = first_url(&String::from_utf8_lossy(&output.stdout))
            .context("yt-dlp no devolvió ninguna URL de audio")?;

        info!("✅ URL de audio obtenida para {}", url);
        Ok(stream_url)
    }
}

/// yt-dlp prints one URL per selected format; audio-only selection yields one.
fn first_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("http"))
        .map(str::to_string)
}
