use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};

/// Runtime configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,

    // Librería local
    pub music_dir: PathBuf,
    pub library_page_size: usize,
    pub bruh_sound: PathBuf,
    pub stal_sound: PathBuf,

    // Resolución de enlaces
    pub ytdlp_path: String,
    /// humantime syntax in the environment ("30s", "1m 30s")
    pub resolve_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            discord_token: std::env::var("DISCORD_TOKEN")
                .context("DISCORD_TOKEN no encontrado en el entorno ni en .env")?,
            command_prefix: std::env::var("COMMAND_PREFIX").unwrap_or(defaults.command_prefix),

            music_dir: std::env::var("MUSIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.music_dir),
            library_page_size: match std::env::var("LIBRARY_PAGE_SIZE") {
                Ok(val) if !val.trim().is_empty() => val.trim().parse()?,
                _ => defaults.library_page_size,
            },
            bruh_sound: std::env::var("BRUH_SOUND")
                .map(PathBuf::from)
                .unwrap_or(defaults.bruh_sound),
            stal_sound: std::env::var("STAL_SOUND")
                .map(PathBuf::from)
                .unwrap_or(defaults.stal_sound),

            ytdlp_path: std::env::var("YTDLP_PATH").unwrap_or(defaults.ytdlp_path),
            resolve_timeout: match std::env::var("RESOLVE_TIMEOUT") {
                Ok(val) if !val.trim().is_empty() => parse_timeout(&val)?,
                _ => defaults.resolve_timeout,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - The token must not be empty
    /// - The command prefix must be non-empty and contain no whitespace
    /// - Library page size and resolve timeout must be greater than zero
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN is empty");
        }

        if self.command_prefix.is_empty() {
            anyhow::bail!("Command prefix must not be empty");
        }

        if self.command_prefix.chars().any(char::is_whitespace) {
            anyhow::bail!(
                "Command prefix must not contain whitespace, got: {:?}",
                self.command_prefix
            );
        }

        if self.library_page_size == 0 {
            anyhow::bail!("Library page size must be greater than 0");
        }

        if self.resolve_timeout.is_zero() {
            anyhow::bail!("Resolve timeout must be greater than 0");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The token is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Prefix: {:?}\n  \
            Library: {} ({} per page)\n  \
            Resolver: {} (timeout {})",
            self.command_prefix,
            self.music_dir.display(),
            self.library_page_size,
            self.ytdlp_path,
            humantime::format_duration(self.resolve_timeout),
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (sin default - debe proveerse)
            discord_token: String::new(),
            command_prefix: ".".to_string(),

            music_dir: "./audio".into(),
            library_page_size: 10,
            bruh_sound: "./audio/bruh.opus".into(),
            stal_sound: "./audio/stal.opus".into(),

            ytdlp_path: "yt-dlp".to_string(),
            resolve_timeout: Duration::from_secs(30),
        }
    }
}

/// Parses a humantime duration such as `30s` or `1m 30s`.
fn parse_timeout(raw: &str) -> Result<Duration> {
    humantime::parse_duration(raw.trim())
        .with_context(|| format!("RESOLVE_TIMEOUT inválido: {raw}"))
}
