use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::imaging::NormalizeOptions;
use crate::utils::dates::DateLocale;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub root: String,
    /// Path prefix under which stored files are served, e.g. `/media/`.
    pub media_url: String,
    /// When set, image URLs are absolute (`{public_base_url}{media_url}{path}`).
    pub public_base_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    /// Per-file limit in bytes.
    pub max_file_size: u64,
    /// Dotted, lower-case extensions.
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ImagingConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl From<ImagingConfig> for NormalizeOptions {
    fn from(c: ImagingConfig) -> Self {
        NormalizeOptions {
            max_width: c.max_width,
            max_height: c.max_height,
            quality: c.quality,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DisplayConfig {
    pub date_locale: DateLocale,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub imaging: ImagingConfig,
    pub display: DisplayConfig,
}

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".webp"];

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Defaults only, without reading files or the environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::with_defaults(Config::builder())?
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.storage.validate()?;
        Ok(self)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Self::with_defaults(Config::builder())?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., PLACES__DATABASE__URL)
            .add_source(
                Environment::with_prefix("PLACES")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .with_list_parse_key("upload.allowed_extensions")
                    .try_parsing(true),
            ))
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://places.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("storage.root", "./media")?
            .set_default("storage.media_url", "/media/")?
            .set_default("upload.max_file_size", DEFAULT_MAX_FILE_SIZE)?
            .set_default(
                "upload.allowed_extensions",
                DEFAULT_ALLOWED_EXTENSIONS.to_vec(),
            )?
            .set_default("imaging.max_width", 1200)?
            .set_default("imaging.max_height", 800)?
            .set_default("imaging.quality", 85)?
            .set_default("display.date_locale", "en")
    }
}

impl StorageConfig {
    /// Stored files are served under `media_url`, which must not be the site root.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.media_url.trim_matches('/').is_empty() {
            return Err(ConfigError::Message(format!(
                "storage.media_url must name a path prefix such as \"/media/\", got {:?}",
                self.media_url
            )));
        }
        Ok(())
    }

    /// Public URL of a stored file.
    pub fn url_for(&self, path: &str) -> String {
        let media = format!("{}/", self.route_prefix());
        match self.public_base_url.as_deref() {
            Some(base) => format!("{}{media}{path}", base.trim_end_matches('/')),
            None => format!("{media}{path}"),
        }
    }

    /// `media_url` as an axum route prefix, without the trailing slash.
    pub fn route_prefix(&self) -> String {
        format!("/{}", self.media_url.trim_matches('/'))
    }
}
