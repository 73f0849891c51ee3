use serde::Deserialize;

/// Root application configuration. Loaded from an optional
/// `campaign-pulse.toml` and environment variables with the prefix
/// `CAMPAIGN_PULSE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_source_path")]
    pub source_path: String,
    /// CSV of `network-offer,cap` rows. Caps are display-only.
    #[serde(default)]
    pub caps_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_window")]
    pub default_window: String,
    #[serde(default = "default_group_by")]
    pub default_group_by: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_source_path() -> String {
    "data/performance.csv".to_string()
}
fn default_interval_secs() -> u64 {
    300
}
fn default_window() -> String {
    "7d".to_string()
}
fn default_group_by() -> String {
    "buyer".to_string()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            caps_path: None,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_window: default_window(),
            default_group_by: default_group_by(),
        }
    }
}

#[allow(clippy::derivable_impls)]
impl Default for LogConfig {
    fn default() -> Self {
        Self { json: false }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ingest: IngestConfig::default(),
            refresh: RefreshConfig::default(),
            report: ReportConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the named file (extension optional) layered
    /// under environment variables.
    pub fn load_from(file: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("CAMPAIGN_PULSE")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
