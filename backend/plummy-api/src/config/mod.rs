use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub accounts: AccountsConfig,
    pub cloudinary: CloudinaryConfig,
    pub tavily: TavilyConfig,
    pub http: HttpClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Marks the session cookie `Secure`; off for local http development.
    #[serde(default)]
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountsConfig {
    /// Password given to users created from the admin console.
    pub default_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TavilyConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientConfig {
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    10
}

fn default_ttl_hours() -> u64 {
    24 * 7
}

fn default_cookie_name() -> String {
    "plummy_session".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_builder(config::Config::builder().add_source(config::Environment::default().separator("__")))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let config = builder
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "postgres://localhost/plummy")?
            .set_default("database.max_connections", 10)?
            .set_default("redis.url", "redis://localhost:6379")?
            .set_default("session.secret", "development-secret-change-in-production")?
            .set_default("session.ttl_hours", 24 * 7)?
            .set_default("session.cookie_name", "plummy_session")?
            .set_default("session.secure", false)?
            .set_default("accounts.default_password", "admin2025")?
            .set_default("cloudinary.cloud_name", "")?
            .set_default("cloudinary.api_key", "")?
            .set_default("cloudinary.api_secret", "")?
            .set_default("cloudinary.base_url", "https://api.cloudinary.com")?
            .set_default("tavily.api_key", "")?
            .set_default("tavily.base_url", "https://api.tavily.com")?
            .set_default("http.timeout_secs", 30)?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Defaults only, no environment. Used by tests and tools.
    pub fn defaults() -> anyhow::Result<Self> {
        Self::from_builder(config::Config::builder())
    }
}
