use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RgwAdminError};

/// Configuration file structure for rgwadmin.
///
/// Holds connection settings for the gateway and output preferences for the
/// CLI. Configuration files are loaded from the current directory, the user
/// config directory, or a specified path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Everything needed to reach and authenticate against a gateway.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectionConfig {
    /// Gateway address, `host` or `host:port`
    #[serde(default)]
    pub server: String,

    #[serde(default)]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,

    /// Admin endpoint prefix, requests go to `/{admin}/...`
    #[serde(default = "default_admin")]
    pub admin: String,

    /// Response format requested from the gateway
    #[serde(default = "default_response")]
    pub response: String,

    /// PEM bundle used to verify the gateway certificate
    pub ca_bundle: Option<PathBuf>,

    /// Use https instead of http
    #[serde(default = "default_true")]
    pub secure: bool,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub verify: bool,

    /// Request timeout in seconds
    pub timeout: Option<u64>,

    /// Share one HTTP client across requests
    #[serde(default)]
    pub pool_connections: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            admin: default_admin(),
            response: default_response(),
            ca_bundle: None,
            secure: true,
            verify: true,
            timeout: None,
            pool_connections: false,
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server", &self.server)
            .field("access_key", &self.access_key)
            .field("secret_key", &"******")
            .field("admin", &self.admin)
            .field("response", &self.response)
            .field("ca_bundle", &self.ca_bundle)
            .field("secure", &self.secure)
            .field("verify", &self.verify)
            .field("timeout", &self.timeout)
            .field("pool_connections", &self.pool_connections)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new(
        server: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            ..Self::default()
        }
    }

    /// Checks that the fields without usable defaults are filled in.
    pub fn validate(&self) -> Result<()> {
        if self.server.is_empty() {
            return Err(RgwAdminError::Config("server is not set".into()));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(RgwAdminError::Config(
                "access key and secret key are required".into(),
            ));
        }
        Ok(())
    }
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_response() -> String {
    "json".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./rgwadmin.toml
    /// 3. ./rgwadmin.json
    /// 4. ./rgwadmin.yaml
    /// 5. ./rgwadmin.yml
    /// 6. `<config dir>/rgwadmin/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "rgwadmin.toml",
            "rgwadmin.json",
            "rgwadmin.yaml",
            "rgwadmin.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(user_config) = dirs::config_dir().map(|d| d.join("rgwadmin").join("config.toml"))
        {
            if user_config.exists() {
                return Self::load_from_path(&user_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RgwAdminError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let parse_error =
            |e: String| RgwAdminError::Config(format!("Failed to parse {}: {e}", path.display()));

        match extension {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error(e.to_string())),
            "json" => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error(e.to_string()))
            }
            _ => toml::from_str(&contents)
                .map_err(|e| e.to_string())
                .or_else(|_| serde_json::from_str(&contents).map_err(|e| e.to_string()))
                .or_else(|_| serde_yaml::from_str(&contents).map_err(|e| e.to_string()))
                .map_err(parse_error),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml") | Some("yml") => {
                serde_yaml::to_string(self).map_err(|e| RgwAdminError::Config(e.to_string()))?
            }
            _ => toml::to_string_pretty(self).map_err(|e| RgwAdminError::Config(e.to_string()))?,
        };

        std::fs::write(path, contents)?;

        Ok(())
    }
}
