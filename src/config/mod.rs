use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub const CLOUD_NAME_VAR: &str = "CLOUDINARY_CLOUD_NAME";
pub const API_KEY_VAR: &str = "CLOUDINARY_API_KEY";
pub const API_SECRET_VAR: &str = "CLOUDINARY_API_SECRET";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials for the Cloudinary upload API.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Runtime configuration for the relay service
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub credentials: CloudinaryCredentials,

    /// Base URL of the provider API (default: "https://api.cloudinary.com")
    pub api_base: String,

    /// HTTP port (default: 3000)
    pub port: u16,

    /// Allowed CORS origins (comma separated in ALLOWED_ORIGINS)
    pub allowed_origins: Vec<String>,

    /// Provider folder every image lands in (default: "br-uploads")
    pub upload_folder: String,

    /// Maximum number of files in the `images` field (default: 50)
    pub max_files: usize,

    /// Maximum size of a single file in bytes (default: 10 MB)
    pub max_file_size: usize,

    /// Where multipart files are staged before relaying
    pub staging_dir: PathBuf,

    /// Pre-built frontend bundle served for non-API routes
    pub static_dir: PathBuf,
}

impl RelayConfig {
    pub const DEFAULT_PORT: u16 = 3000;
    pub const DEFAULT_FOLDER: &'static str = "br-uploads";
    pub const DEFAULT_MAX_FILES: usize = 50;
    pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;
    pub const DEFAULT_API_BASE: &'static str = "https://api.cloudinary.com";

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Every missing credential is reported at once so the operator can fix
    /// them in a single pass.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str, missing: &mut Vec<&'static str>| {
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                Some(v) => v,
                None => {
                    missing.push(name);
                    String::new()
                }
            }
        };

        let mut missing = Vec::new();
        let cloud_name = required(CLOUD_NAME_VAR, &mut missing);
        let api_key = required(API_KEY_VAR, &mut missing);
        let api_secret = required(API_SECRET_VAR, &mut missing);

        if !missing.is_empty() {
            return Err(ConfigError::MissingVars(missing));
        }

        Ok(Self {
            credentials: CloudinaryCredentials {
                cloud_name,
                api_key,
                api_secret,
            },

            api_base: lookup("CLOUDINARY_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| Self::DEFAULT_API_BASE.to_string()),

            port: parse_or("PORT", &lookup, Self::DEFAULT_PORT)?,

            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(default_origins),

            upload_folder: lookup("UPLOAD_FOLDER")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| Self::DEFAULT_FOLDER.to_string()),

            max_files: parse_or("MAX_FILES", &lookup, Self::DEFAULT_MAX_FILES)?,

            max_file_size: parse_or("MAX_FILE_SIZE", &lookup, Self::DEFAULT_MAX_FILE_SIZE)?,

            staging_dir: lookup("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("image-relay")),

            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("frontend/dist")),
        })
    }

    /// Upper bound for a whole `/upload` body, with 1 MB for multipart framing
    pub fn body_limit(&self) -> usize {
        self.max_files
            .saturating_mul(self.max_file_size)
            .saturating_add(1024 * 1024)
    }

    /// Config suitable for tests: fake credentials and local directories
    pub fn for_testing(staging_dir: PathBuf, static_dir: PathBuf) -> Self {
        Self {
            credentials: CloudinaryCredentials {
                cloud_name: "demo".to_string(),
                api_key: "123456789012345".to_string(),
                api_secret: "test_secret".to_string(),
            },
            api_base: Self::DEFAULT_API_BASE.to_string(),
            port: Self::DEFAULT_PORT,
            allowed_origins: default_origins(),
            upload_folder: Self::DEFAULT_FOLDER.to_string(),
            max_files: Self::DEFAULT_MAX_FILES,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            staging_dir,
            static_dir,
        }
    }
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:5174".to_string(),
    ]
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(default),
    }
}
