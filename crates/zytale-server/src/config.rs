use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    #[serde(default = "default_server_name")]
    pub server_name: String,
    #[serde(default = "default_motd")]
    pub motd: String,
    #[serde(default = "default_view_radius")]
    pub view_radius: i32,
    #[serde(default = "default_assets_path")]
    pub assets_path: String,
    #[serde(default)]
    pub cert_path: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
    /// Whether the Session Service auth flow is configured. Off by
    /// default; identity tokens are then ignored and clients join
    /// straight into setup.
    #[serde(default)]
    pub auth_enabled: bool,
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    // Debug overrides, read from the environment at startup.
    #[serde(skip)]
    pub no_compress: bool,
    #[serde(skip)]
    pub minimal_blocks: bool,
    #[serde(skip)]
    pub hex_dump: bool,
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5520
}

fn default_max_players() -> u32 {
    100
}

fn default_server_name() -> String {
    "Zytale Server".into()
}

fn default_motd() -> String {
    "A Zytale Server".into()
}

fn default_view_radius() -> i32 {
    6
}

fn default_assets_path() -> String {
    "Assets.zip".into()
}

fn default_idle_timeout_ms() -> u64 {
    30_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_players: default_max_players(),
            server_name: default_server_name(),
            motd: default_motd(),
            view_radius: default_view_radius(),
            assets_path: default_assets_path(),
            cert_path: None,
            key_path: None,
            auth_enabled: false,
            idle_timeout_ms: default_idle_timeout_ms(),
            no_compress: false,
            minimal_blocks: false,
            hex_dump: false,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.no_compress = env_flag("ZYTALE_NO_COMPRESS");
        self.minimal_blocks = env_flag("ZYTALE_MINIMAL_BLOCKS");
        self.hex_dump = env_flag("ZYTALE_HEX_DUMP");
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| v == "1").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5520);
        assert_eq!(config.view_radius, 6);
        assert_eq!(config.idle_timeout_ms, 30_000);
        assert!(!config.auth_enabled);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: ServerConfig = toml::from_str("port = 6000\nmotd = \"hi\"").unwrap();
        assert_eq!(config.port, 6000);
        assert_eq!(config.motd, "hi");
        assert_eq!(config.max_players, 100);
        assert_eq!(config.bind, "0.0.0.0");
    }
}
