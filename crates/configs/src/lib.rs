use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub printify: PrintifyConfig,
    #[serde(default)]
    pub mockups: MockupConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir() }
    }
}

/// Credentials are optional at load time; routes that need the upstream
/// answer 401 when they are missing.
#[derive(Debug, Clone, Deserialize)]
pub struct PrintifyConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub shop_id: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for PrintifyConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            shop_id: None,
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockupConfig {
    #[serde(default = "default_mockup_ttl")]
    pub ttl_hours: i64,
}

impl Default for MockupConfig {
    fn default() -> Self {
        Self { ttl_hours: default_mockup_ttl() }
    }
}

fn default_data_dir() -> String { "data".into() }
fn default_base_url() -> String { "https://api.printify.com/v1".into() }
fn default_timeout() -> u64 { 30 }
fn default_user_agent() -> String { format!("storefront/{}", env!("CARGO_PKG_VERSION")) }
fn default_mockup_ttl() -> i64 { 24 }

/// Ten years.
pub const MAX_MOCKUP_TTL_HOURS: i64 = 87_600;

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` when present, otherwise start from defaults; env
    /// overrides are applied either way.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.apply_env_overrides();
        self.server.normalize()?;
        self.storage.validate()?;
        self.printify.normalize()?;
        self.mockups.validate()?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Ok(dir) = std::env::var("DATA_DIR") {
            self.storage.data_dir = dir;
        }
        if let Ok(url) = std::env::var("PRINTIFY_BASE_URL") {
            self.printify.base_url = url;
        }
        // 若 TOML 中未提供凭据，则尝试从环境变量填充
        if self.printify.api_token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            self.printify.api_token = std::env::var("PRINTIFY_API_TOKEN").ok();
        }
        if self.printify.shop_id.as_deref().map_or(true, |s| s.trim().is_empty()) {
            self.printify.shop_id = std::env::var("PRINTIFY_SHOP_ID").ok();
        }
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .map(|io| io.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        Ok(())
    }
}

impl PrintifyConfig {
    fn normalize(&mut self) -> Result<()> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(anyhow!("printify.base_url must start with http(s)"));
        }
        self.base_url = trimmed;
        if self.timeout_secs == 0 {
            return Err(anyhow!("printify.timeout_secs must be a positive number of seconds"));
        }
        // blank strings count as absent credentials
        self.api_token = self.api_token.take().filter(|t| !t.trim().is_empty());
        self.shop_id = self.shop_id.take().filter(|s| !s.trim().is_empty());
        Ok(())
    }

    pub fn has_credentials(&self) -> bool {
        self.api_token.is_some() && self.shop_id.is_some()
    }
}

impl MockupConfig {
    fn validate(&self) -> Result<()> {
        if self.ttl_hours <= 0 || self.ttl_hours > MAX_MOCKUP_TTL_HOURS {
            return Err(anyhow!("mockups.ttl_hours must be within 1..={MAX_MOCKUP_TTL_HOURS}"));
        }
        Ok(())
    }
}
