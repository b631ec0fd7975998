use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub server: Option<ServerConfig>,
    pub cors: Option<CorsConfig>,
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            }),
            cors: Some(CorsConfig {
                allowed_origins: vec!["http://localhost:3000".to_string()],
            }),
            database: None,
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Verification settings for session tokens issued by the identity provider.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret shared with the identity provider.
    pub jwt_secret: String,
    /// Expected `aud` claim. Unset disables the audience check.
    pub audience: Option<String>,
    pub session_cookie: String,
    pub login_path: String,
    /// Base URL of the identity provider, handed to the auth pages.
    pub provider_url: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            audience: Some("authenticated".to_string()),
            session_cookie: "sb-access-token".to_string(),
            login_path: "/login".to_string(),
            provider_url: None,
        }
    }
}

impl ApiConfig {
    pub fn server_address(&self) -> (String, u16) {
        match &self.server {
            Some(server) => (server.host.clone(), server.port),
            None => ("127.0.0.1".to_string(), 8080),
        }
    }

    /// Loads the TOML config, writing a default one on first run, then applies
    /// `CRM__SECTION__KEY` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            let body = toml::to_string_pretty(&ApiConfig::default()).map_err(|e| {
                ConfigError::Message(format!("Failed to render default config: {e}"))
            })?;
            let default_config = format!(
                "# Set auth.jwt_secret to the identity provider's JWT secret.\n\n{body}"
            );
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let builder = Config::builder()
            .add_source(File::from(config_path.clone()))
            .add_source(
                Environment::with_prefix("CRM")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: ApiConfig = builder.try_deserialize()?;

        Ok((config, config_path))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("crm").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("api.toml");

        let (config, written) = ApiConfig::load(Some(&path)).unwrap();

        assert_eq!(written, path);
        assert!(path.exists());
        assert_eq!(config.server_address(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(config.auth.session_cookie, "sb-access-token");
        assert_eq!(config.auth.login_path, "/login");
        assert_eq!(config.auth.audience.as_deref(), Some("authenticated"));
    }

    #[test]
    fn test_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "0.0.0.0"
port = 9000

[database]
path = "/tmp/crm-test.sqlite3"

[auth]
jwt_secret = "secret"
login_path = "/signin"
"#,
        )
        .unwrap();

        let (config, _) = ApiConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server_address(), ("0.0.0.0".to_string(), 9000));
        assert_eq!(config.auth.jwt_secret, "secret");
        assert_eq!(config.auth.login_path, "/signin");
        assert_eq!(config.auth.session_cookie, "sb-access-token");
        assert_eq!(
            config.database.unwrap().path,
            PathBuf::from("/tmp/crm-test.sqlite3")
        );
        assert!(config.cors.is_none());
    }
}
