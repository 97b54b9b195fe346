/// Server configuration from command-line flags and environment variables
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "deck-server", version, about = "Pokémon TCG deck builder backend")]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// DuckDB file; in-memory when unset
    #[arg(long, env = "DATABASE_PATH")]
    pub database: Option<PathBuf>,

    /// Card catalog cache directory
    #[arg(long, env = "CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Secret used to sign login tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    #[arg(long, env = "JWT_EXPIRATION_HOURS", default_value_t = 1)]
    pub jwt_expiration_hours: u64,

    /// Public address used in verification links
    #[arg(long, env = "BASE_URL", default_value = "http://localhost:5000")]
    pub base_url: String,

    /// pokemontcg.io API key
    #[arg(long, env = "POKEMONTCG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Only use a previously cached catalog
    #[arg(long, env = "OFFLINE")]
    pub offline: bool,
}

impl ServerConfig {
    /// Parse flags, falling back to the environment after loading `.env`.
    pub fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();
        Self::try_parse()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    /// Verification link sent to a freshly registered user.
    pub fn verification_link(base_url: &str, token: &str) -> String {
        format!("{}/verify-email?token={}", base_url.trim_end_matches('/'), token)
    }
}
