use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    /// Public origin used to build verification URLs and QR codes
    pub base_url: String,
    pub host: String,
    pub port: u16,

    // Bearer token required on operator routes
    pub operator_token: Secret<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        let base_url: String = config.get("base_url")?;
        url::Url::parse(&base_url).map_err(|e| {
            config::ConfigError::Message(format!("BASE_URL is not a valid URL: {}", e))
        })?;

        Ok(Self {
            database_url: config.get("database_url")?,
            base_url,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            operator_token: Secret::new(config.get("operator_token")?),
        })
    }
}
