//! Token store backend selection

use serde::{Deserialize, Serialize};

/// Backend holding token records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local store (development and tests)
    #[default]
    Memory,
    /// MySQL `otp_tokens` table
    #[serde(rename = "mysql")]
    MySql,
    /// Redis hashes updated by server-side scripts
    Redis,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::MySql => write!(f, "mysql"),
            StorageBackend::Redis => write!(f, "redis"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Which backend holds token records
    pub backend: StorageBackend,

    /// Apply bundled SQL migrations on startup (MySQL only)
    pub run_migrations: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            run_migrations: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_serde_names() {
        let backend: StorageBackend = serde_json::from_str("\"mysql\"").unwrap();
        assert_eq!(backend, StorageBackend::MySql);
        assert_eq!(serde_json::to_string(&StorageBackend::Redis).unwrap(), "\"redis\"");
    }

    #[test]
    fn test_backend_display_matches_serde() {
        assert_eq!(StorageBackend::MySql.to_string(), "mysql");
        assert_eq!(StorageBackend::Memory.to_string(), "memory");
    }
}
