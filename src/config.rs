use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::str::FromStr;

use crate::error::{BoardError, Result};
use crate::state::{MarketDuration, UserSelection};

const DEFAULT_STAGING_RPC: &str = "https://hxro.rpcpool.com/";
const DEFAULT_DEVNET_RPC: &str = "https://hxro-hxro-b289.devnet.rpcpool.com/";
const DEFAULT_ORACLE_WS: &str = "wss://hermes.pyth.network/ws";

/// Deployment environment, read once from `APP_ENV`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEnv {
    Dev,
    Staging,
    Other(String),
}

impl AppEnv {
    /// Read `APP_ENV`. Unset counts as a non-dev deployment so access checks stay on.
    pub fn from_env() -> Self {
        Self::from_var(std::env::var("APP_ENV").ok().as_deref())
    }

    pub fn from_var(value: Option<&str>) -> Self {
        match value {
            Some(v) => v.parse().unwrap_or(AppEnv::Other(String::new())),
            None => AppEnv::Other(String::new()),
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, AppEnv::Dev)
    }
}

impl FromStr for AppEnv {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "dev" => AppEnv::Dev,
            "staging" => AppEnv::Staging,
            _ => AppEnv::Other(s.trim().to_string()),
        })
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppEnv::Dev => f.write_str("dev"),
            AppEnv::Staging => f.write_str("staging"),
            AppEnv::Other(name) => f.write_str(name),
        }
    }
}

/// Deployment target the market directory is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    /// Name `[[markets]]` entries refer to, e.g. "devnet"
    pub name: String,
    /// Solana cluster the markets live on
    pub cluster: String,
}

impl NetworkConfig {
    pub fn dev() -> Self {
        Self {
            name: "devnet".to_string(),
            cluster: "devnet".to_string(),
        }
    }

    pub fn staging() -> Self {
        Self {
            name: "staging".to_string(),
            cluster: "mainnet-beta".to_string(),
        }
    }
}

/// Pick the network for an environment. Anything but dev/staging gets `fallback`.
pub fn resolve_network_config(env: &AppEnv, fallback: NetworkConfig) -> NetworkConfig {
    match env {
        AppEnv::Dev => NetworkConfig::dev(),
        AppEnv::Staging => NetworkConfig::staging(),
        AppEnv::Other(_) => fallback,
    }
}

/// Pick the RPC endpoint for an environment. Only staging uses the pooled URL.
pub fn resolve_rpc_url<'a>(env: &AppEnv, urls: &'a RpcUrls) -> &'a str {
    match env {
        AppEnv::Staging => &urls.staging_url,
        _ => &urls.devnet_url,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcUrls {
    #[serde(default = "default_staging_rpc")]
    pub staging_url: String,
    #[serde(default = "default_devnet_rpc")]
    pub devnet_url: String,
}

impl Default for RpcUrls {
    fn default() -> Self {
        Self {
            staging_url: default_staging_rpc(),
            devnet_url: default_devnet_rpc(),
        }
    }
}

fn default_staging_rpc() -> String {
    DEFAULT_STAGING_RPC.to_string()
}

fn default_devnet_rpc() -> String {
    DEFAULT_DEVNET_RPC.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct General {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessSettings {
    /// List service URL, e.g. "https://host/api/sheet". Without it the
    /// static lists below are used as-is.
    pub list_endpoint: Option<String>,
    #[serde(default)]
    pub geo_blocked: bool,
    #[serde(default)]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub blacklist: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    /// JSON endpoint returning the live market records
    pub markets_url: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleSettings {
    #[serde(default = "default_oracle_ws")]
    pub ws_url: String,
    /// Pair symbol -> price feed id
    #[serde(default)]
    pub feeds: HashMap<String, String>,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            ws_url: default_oracle_ws(),
            feeds: HashMap::new(),
        }
    }
}

fn default_oracle_ws() -> String {
    DEFAULT_ORACLE_WS.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewSettings {
    #[serde(flatten)]
    pub selection: UserSelection,
    /// Column key to sort on at start, e.g. "pool_size"
    pub sort_column: Option<String>,
    /// "asc" or "desc"
    pub sort_direction: Option<String>,
}

/// One canonical market as published for a network.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketEntry {
    pub network: String,
    pub pair: String,
    pub duration: MarketDuration,
    pub pubkey: String,
}

/// Everything the board needs, loaded once at start.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub rpc: RpcUrls,
    #[serde(default)]
    pub access: AccessSettings,
    pub feed: FeedSettings,
    #[serde(default)]
    pub oracle: OracleSettings,
    pub view: ViewSettings,
    /// Network used when `APP_ENV` is neither dev nor staging
    pub network: Option<NetworkConfig>,
    #[serde(default)]
    pub markets: Vec<MarketEntry>,
    #[serde(skip, default = "default_env")]
    pub env: AppEnv,
}

fn default_env() -> AppEnv {
    AppEnv::Other(String::new())
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut settings = Self::parse(&contents)?;
        settings.apply_env(
            std::env::var("APP_ENV").ok().as_deref(),
            std::env::var("GEO_BLOCKED").ok().as_deref(),
        );
        Ok(settings)
    }

    /// Apply `APP_ENV` and `GEO_BLOCKED`. A set `GEO_BLOCKED` wins over the file.
    pub fn apply_env(&mut self, app_env: Option<&str>, geo_blocked: Option<&str>) {
        self.env = AppEnv::from_var(app_env);
        if let Some(flag) = geo_blocked {
            self.access.geo_blocked = parse_flag(flag);
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn network_config(&self) -> Result<NetworkConfig> {
        match (&self.env, &self.network) {
            (AppEnv::Other(name), None) => Err(BoardError::Config(format!(
                "APP_ENV '{}' needs a [network] table",
                name
            ))),
            (env, network) => Ok(resolve_network_config(
                env,
                network.clone().unwrap_or_else(NetworkConfig::dev),
            )),
        }
    }

    pub fn rpc_url(&self) -> &str {
        resolve_rpc_url(&self.env, &self.rpc)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[general]
log_level = "debug"

[access]
list_endpoint = "https://example.org/api/sheet"
whitelist = ["A"]

[feed]
markets_url = "https://example.org/markets"

[oracle.feeds]
"BTC-USD" = "e62df6c8b4a85fe1a67db44dc12de5db330f7ac66b72dc658afedf0f4a415b43"

[view]
pair = "BTC-USD"
durations = [60, 3600]
sort_column = "pool_size"
sort_direction = "desc"

[[markets]]
network = "devnet"
pair = "BTC-USD"
duration = 60
pubkey = "X"
"#;

    #[test]
    fn test_env_parse() {
        assert_eq!("dev".parse::<AppEnv>().unwrap(), AppEnv::Dev);
        assert_eq!("STAGING".parse::<AppEnv>().unwrap(), AppEnv::Staging);
        assert_eq!(
            "mainnet".parse::<AppEnv>().unwrap(),
            AppEnv::Other("mainnet".to_string())
        );
    }

    #[test]
    fn test_resolve_network_config() {
        let fallback = NetworkConfig {
            name: "mainnet".to_string(),
            cluster: "mainnet-beta".to_string(),
        };
        assert_eq!(resolve_network_config(&AppEnv::Dev, fallback.clone()), NetworkConfig::dev());
        assert_eq!(
            resolve_network_config(&AppEnv::Staging, fallback.clone()),
            NetworkConfig::staging()
        );
        assert_eq!(
            resolve_network_config(&AppEnv::Other("mainnet".into()), fallback.clone()),
            fallback
        );
    }

    #[test]
    fn test_resolve_rpc_url() {
        let urls = RpcUrls::default();
        assert_eq!(resolve_rpc_url(&AppEnv::Staging, &urls), DEFAULT_STAGING_RPC);
        assert_eq!(resolve_rpc_url(&AppEnv::Dev, &urls), DEFAULT_DEVNET_RPC);
        assert_eq!(resolve_rpc_url(&AppEnv::Other("x".into()), &urls), DEFAULT_DEVNET_RPC);
    }

    #[test]
    fn test_parse_sample() {
        let settings = Settings::parse(SAMPLE).unwrap();
        assert_eq!(settings.general.log_level, "debug");
        assert_eq!(settings.feed.poll_interval_secs, 5);
        assert_eq!(settings.oracle.ws_url, DEFAULT_ORACLE_WS);
        assert_eq!(settings.oracle.feeds.len(), 1);
        assert_eq!(settings.view.selection.selected_pair, "BTC-USD");
        assert!(settings.view.selection.includes(MarketDuration::ONE_HOUR));
        assert_eq!(settings.view.sort_column.as_deref(), Some("pool_size"));
        assert_eq!(settings.markets.len(), 1);
        assert_eq!(settings.markets[0].duration, MarketDuration::ONE_MIN);
        assert!(!settings.access.geo_blocked);
    }

    #[test]
    fn test_other_env_needs_network_table() {
        let mut settings = Settings::parse(SAMPLE).unwrap();
        settings.env = AppEnv::Other("mainnet".into());
        assert!(matches!(settings.network_config(), Err(BoardError::Config(_))));

        settings.env = AppEnv::Dev;
        assert_eq!(settings.network_config().unwrap(), NetworkConfig::dev());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("no"));
    }

    #[test]
    fn test_app_env_from_var() {
        assert_eq!(AppEnv::from_var(Some("dev")), AppEnv::Dev);
        assert_eq!(AppEnv::from_var(Some("staging")), AppEnv::Staging);
        assert_eq!(AppEnv::from_var(None), AppEnv::Other(String::new()));
        assert!(!AppEnv::from_var(None).is_dev());
    }

    #[test]
    fn test_apply_env_sets_environment() {
        let mut settings = Settings::parse(SAMPLE).unwrap();
        settings.apply_env(Some("dev"), None);
        assert!(settings.env.is_dev());

        settings.apply_env(None, None);
        assert_eq!(settings.env, AppEnv::Other(String::new()));
    }

    #[test]
    fn test_geo_blocked_override() {
        let mut settings = Settings::parse(SAMPLE).unwrap();
        let from_file = settings.access.geo_blocked;

        settings.apply_env(None, None);
        assert_eq!(settings.access.geo_blocked, from_file);

        settings.apply_env(None, Some("true"));
        assert!(settings.access.geo_blocked);

        settings.apply_env(None, Some("0"));
        assert!(!settings.access.geo_blocked);
    }
}
