use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ApiConfig;
use crate::database::Database;

/// Returns the path to the CRM database based on the operating system
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/crm/crm.sqlite3`
/// - **Linux**: `~/.local/share/crm/crm.sqlite3`
/// - **Windows**: `%LOCALAPPDATA%\crm\crm.sqlite3`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(data_dir.join("crm").join("crm.sqlite3"))
}

/// The configured database path, or the platform default.
pub fn resolve_db_path(config: &ApiConfig) -> anyhow::Result<PathBuf> {
    match &config.database {
        Some(database) => Ok(database.path.clone()),
        None => get_db_path(),
    }
}

/// Open the database, creating it and its schema on first run
pub fn initialize_database(config: &ApiConfig) -> anyhow::Result<(Arc<Database>, PathBuf)> {
    let db_path = resolve_db_path(config)?;
    let db = Database::new(&db_path)?;
    Ok((Arc::new(db), db_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    #[test]
    fn test_configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("crm.sqlite3");
        let config = ApiConfig {
            database: Some(DatabaseConfig { path: path.clone() }),
            ..ApiConfig::default()
        };

        let (_, opened) = initialize_database(&config).unwrap();
        assert_eq!(opened, path);
        assert!(path.exists());
    }

    #[test]
    fn test_default_path_is_under_crm() {
        if let Ok(path) = get_db_path() {
            assert!(path.ends_with("crm/crm.sqlite3"));
        }
    }
}
