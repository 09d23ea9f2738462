//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Default config path used when no environment override is present.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/concrnt/config/apconfig.yaml";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// ActivityPub bridge configuration.
    pub ap_config: ApConfig,
    /// Server/backend configuration.
    pub server: ServerConfig,
    /// NodeInfo metadata served at `/ap/nodeinfo/2.0`.
    #[serde(default)]
    pub node_info: NodeInfoConfig,
}

/// ActivityPub bridge configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApConfig {
    /// Public FQDN this bridge is reachable at.
    pub fqdn: String,
    /// Hex-encoded private key used to sign documents minted on behalf of
    /// remote AP authors.
    pub proxy_priv: String,
    /// Derived at startup from `proxy_priv`; never read from config.
    #[serde(default)]
    pub proxy_ccid: String,
}

/// Backend connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// `PostgreSQL` connection string.
    pub dsn: String,
    /// Address of the Native gateway.
    pub gateway_addr: String,
    /// Redis connection URL (pub/sub timelines and the Person cache).
    pub redis_addr: String,
    /// Redis logical database index.
    #[serde(default)]
    pub redis_db: i64,
    /// Whether to announce the tracing endpoint at startup.
    #[serde(default)]
    pub enable_trace: bool,
    /// OTLP collector endpoint, forwarded to the external exporter.
    #[serde(default)]
    pub trace_endpoint: String,
}

/// NodeInfo metadata block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfoConfig {
    #[serde(default)]
    pub node_name: String,
    #[serde(default)]
    pub node_description: String,
    #[serde(default)]
    pub maintainer_name: String,
    #[serde(default)]
    pub maintainer_email: String,
    #[serde(default)]
    pub theme_color: String,
}

impl Config {
    /// Load configuration from the paths named by the environment.
    ///
    /// `CCWORLD_AP_BRIDGE_CONFIG` names a single file;
    /// `CCWORLD_AP_BRIDGE_CONFIGS` names a colon-separated list merged in
    /// order (later files override earlier ones). When neither is set the
    /// default path is used.
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut paths: Vec<String> = Vec::new();

        if let Ok(path) = std::env::var("CCWORLD_AP_BRIDGE_CONFIG") {
            paths.push(path);
        }
        if let Ok(list) = std::env::var("CCWORLD_AP_BRIDGE_CONFIGS") {
            paths.extend(list.split(':').map(str::to_string));
        }
        if paths.is_empty() {
            paths.push(DEFAULT_CONFIG_PATH.to_string());
        }

        Self::from_files(&paths)
    }

    /// Load configuration from an explicit list of files, merged in order.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        for path in paths {
            builder = builder.add_source(config::File::from(path.as_ref()));
        }
        builder.build()?.try_deserialize()
    }
}

/// Listen port, `CC_AP_PORT` overriding the default of 8000.
#[must_use]
pub fn listen_port() -> u16 {
    std::env::var("CC_AP_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_files_merges_in_order() {
        let dir = std::env::temp_dir();
        let base = dir.join("ccbridge-config-base.yaml");
        let over = dir.join("ccbridge-config-override.yaml");

        let mut f = std::fs::File::create(&base).unwrap();
        writeln!(
            f,
            "apConfig:\n  fqdn: example.com\n  proxyPriv: \"00\"\nserver:\n  dsn: postgres://base\n  gatewayAddr: gateway:8080\n  redisAddr: redis://localhost\n"
        )
        .unwrap();

        let mut f = std::fs::File::create(&over).unwrap();
        writeln!(f, "server:\n  dsn: postgres://override\n  gatewayAddr: gateway:8080\n  redisAddr: redis://localhost\n").unwrap();

        let config = Config::from_files(&[&base, &over]).unwrap();
        assert_eq!(config.ap_config.fqdn, "example.com");
        assert_eq!(config.server.dsn, "postgres://override");
        assert!(!config.server.enable_trace);

        std::fs::remove_file(base).ok();
        std::fs::remove_file(over).ok();
    }
}
