use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Application configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // ── Server ──────────────────────────────────────────────────────────
    pub host: String,
    pub port: u16,

    // ── Token store ─────────────────────────────────────────────────────
    /// PostgreSQL connection string. Without it tokens live in memory.
    pub database_url: Option<String>,
    /// 32-byte base64-encoded key for AES-256-GCM encryption of stored tokens.
    pub token_encryption_key: Option<String>,

    // ── Google OAuth client ─────────────────────────────────────────────
    pub google: GoogleClientConfig,

    // ── Assistant ───────────────────────────────────────────────────────
    pub assistant_endpoint: String,
    pub assistant_locale: String,
    pub assistant_device_id: String,
    pub assistant_device_model_id: String,
}

/// Credentials of the OAuth client registered with Google.
#[derive(Debug, Clone)]
pub struct GoogleClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub token_url: String,
}

// Layout of the client secrets file downloaded from the Google Cloud console
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    web: WebClientSecrets,
}

#[derive(Debug, Deserialize)]
struct WebClientSecrets {
    client_id: Option<String>,
    client_secret: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// OAuth client fields found in a client secrets file. Any may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSecrets {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// First entry of `redirect_uris`.
    pub redirect_uri: Option<String>,
}

impl ClientSecrets {
    /// Read a Google "web" client secrets JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read client secrets file {}", path.display()))?;
        let secrets: ClientSecretsFile = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid client secrets file {}", path.display()))?;

        Ok(Self {
            client_id: secrets.web.client_id,
            client_secret: secrets.web.client_secret,
            redirect_uri: secrets.web.redirect_uris.into_iter().next(),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").ok();
        let token_encryption_key = std::env::var("TOKEN_ENCRYPTION_KEY").ok();
        if database_url.is_some() && token_encryption_key.is_none() {
            anyhow::bail!("TOKEN_ENCRYPTION_KEY is required when DATABASE_URL is set (32 bytes, base64)");
        }

        Ok(Config {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("Invalid PORT")?,

            database_url,
            token_encryption_key,

            google: GoogleClientConfig::from_env()?,

            assistant_endpoint: std::env::var("ASSISTANT_ENDPOINT")
                .context("ASSISTANT_ENDPOINT is required (assistant query URL)")?,
            assistant_locale: std::env::var("ASSISTANT_LOCALE").unwrap_or_else(|_| "es-ES".into()),
            assistant_device_id: std::env::var("ASSISTANT_DEVICE_ID")
                .unwrap_or_else(|_| "default-device".into()),
            assistant_device_model_id: std::env::var("ASSISTANT_DEVICE_MODEL_ID")
                .unwrap_or_else(|_| "default-device-model".into()),
        })
    }
}

impl GoogleClientConfig {
    fn from_env() -> Result<Self> {
        let file = match std::env::var("GOOGLE_CLIENT_SECRETS_FILE") {
            Ok(path) => ClientSecrets::from_file(Path::new(&path))?,
            Err(_) => ClientSecrets::default(),
        };

        Self::resolve(file, |var| std::env::var(var).ok())
    }

    /// Combine the secrets file with `GOOGLE_*` overrides read through `var`.
    ///
    /// A field is only missing when neither source provides it.
    pub fn resolve(file: ClientSecrets, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let pick = |name: &str, fallback: Option<String>| -> Result<String> {
            var(name)
                .filter(|v| !v.is_empty())
                .or(fallback)
                .with_context(|| format!("{name} is required (or set it in GOOGLE_CLIENT_SECRETS_FILE)"))
        };

        Ok(Self {
            client_id: pick("GOOGLE_CLIENT_ID", file.client_id)?,
            client_secret: pick("GOOGLE_CLIENT_SECRET", file.client_secret)?,
            redirect_uri: pick("GOOGLE_REDIRECT_URI", file.redirect_uri)?,
            token_url: var("GOOGLE_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.into()),
        })
    }
}
