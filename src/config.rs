use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

pub const SECRET_KEY_ENV: &str = "MURMUR_SECRET_KEY";

/// Upper bound on `auth.token_ttl_minutes` (one year).
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Parser, Debug)]
#[command(name = "murmur", about = "A minimal social network backend")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC key for session tokens. Generated per process when unset.
    pub secret_key: Option<String>,
    /// Request header carrying the session token.
    pub token_header: String,
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            token_header: "x-access-token".to_string(),
            token_ttl_minutes: 120,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

// Keeps the signing key out of logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("token_header", &self.token_header)
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl AuthConfig {
    /// Token lifetime, held to `1..=MAX_TOKEN_TTL_MINUTES` minutes.
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes.clamp(1, MAX_TOKEN_TTL_MINUTES))
    }

    /// Fill in a random signing key if none was configured.
    /// Returns true when a key had to be generated.
    pub fn ensure_secret_key(&mut self) -> bool {
        if self.secret_key.as_deref().is_some_and(|k| !k.is_empty()) {
            return false;
        }
        use rand::Rng;
        let bytes: [u8; 32] = rand::thread_rng().gen();
        self.secret_key = Some(bytes.iter().map(|b| format!("{:02x}", b)).collect());
        true
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        if let Ok(secret) = std::env::var(SECRET_KEY_ENV) {
            if !secret.is_empty() {
                config.auth.secret_key = Some(secret);
            }
        }

        let ttl = config.auth.token_ttl_minutes;
        if ttl <= 0 {
            anyhow::bail!("auth.token_ttl_minutes must be positive");
        }
        if ttl > MAX_TOKEN_TTL_MINUTES || chrono::Duration::try_minutes(ttl).is_none() {
            anyhow::bail!(
                "auth.token_ttl_minutes must be at most {} (got {})",
                MAX_TOKEN_TTL_MINUTES,
                ttl
            );
        }

        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("murmur.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match cli.data_dir.clone() {
            Some(dir) => Ok(dir),
            None => dirs::home_dir()
                .map(|home| home.join(".murmur"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory")),
        }
    }

    pub fn db_path(&self) -> Option<&PathBuf> {
        self.database.path.as_ref()
    }
}
