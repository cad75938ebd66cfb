use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your-secret-key",
];

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub frontend_url: Option<String>,
    pub upload_dir: PathBuf,
    pub default_channel: String,
    pub trust_proxy: bool,
    pub thumbnail_timeout: Duration,
    /// (slug, name) pairs created at startup if missing.
    pub channels: Vec<(String, String)>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("DOGSO_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("DOGSO_JWT_SECRET is unset or still a placeholder; set it in .env and restart");
        }

        let port: u16 = var_or("DOGSO_PORT", "5000")
            .parse()
            .context("DOGSO_PORT must be a port number")?;
        let thumbnail_timeout_secs: u64 = var_or("DOGSO_THUMBNAIL_TIMEOUT_SECS", "5")
            .parse()
            .context("DOGSO_THUMBNAIL_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            jwt_secret,
            db_path: var_or("DOGSO_DB_PATH", "dogso.db").into(),
            host: var_or("DOGSO_HOST", "0.0.0.0"),
            port,
            frontend_url: std::env::var("DOGSO_FRONTEND_URL").ok().filter(|v| !v.is_empty()),
            upload_dir: var_or("DOGSO_UPLOAD_DIR", "./uploads").into(),
            default_channel: var_or("DOGSO_DEFAULT_CHANNEL", "general"),
            trust_proxy: matches!(
                var_or("DOGSO_TRUST_PROXY", "false").to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            ),
            thumbnail_timeout: Duration::from_secs(thumbnail_timeout_secs),
            channels: parse_channels(&var_or("DOGSO_CHANNELS", ""))?,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// `"urawa-reds=Urawa Reds;j-league=J.League"` -> `[(slug, name), ...]`
fn parse_channels(raw: &str) -> anyhow::Result<Vec<(String, String)>> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (slug, name) = entry
                .split_once('=')
                .with_context(|| format!("DOGSO_CHANNELS entry '{}' is not slug=Name", entry))?;
            let (slug, name) = (slug.trim(), name.trim());
            if slug.is_empty() || name.is_empty() {
                bail!("DOGSO_CHANNELS entry '{}' has an empty slug or name", entry);
            }
            Ok((slug.to_string(), name.to_string()))
        })
        .collect()
}
