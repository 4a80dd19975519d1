//! Workflow configuration.
//!
//! Read from the environment. Every setting has a default except the
//! database URL, which the `rpms` binary requires for any command that
//! touches stored papers.

use rpms_state::EnforcementMode;

use crate::allocator::AllocatorKind;

/// Default number of allocation attempts after a publication identifier
/// collision.
pub const DEFAULT_ALLOCATION_RETRIES: u32 = 3;

/// Default Postgres pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Postgres connection settings.
///
/// Custom `Debug` implementation redacts the URL, which usually carries a
/// password.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Settings of a [`Workflow`](crate::Workflow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub enforcement: EnforcementMode,
    pub allocator: AllocatorKind,
    /// Extra allocation attempts after a collision.
    pub allocation_retries: u32,
    /// `None` when `DATABASE_URL` is unset. Embedders then build
    /// [`Stores`](crate::Stores) themselves, typically over a
    /// [`MemoryStore`](crate::MemoryStore).
    pub database: Option<DatabaseConfig>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            enforcement: EnforcementMode::default(),
            allocator: AllocatorKind::default(),
            allocation_retries: DEFAULT_ALLOCATION_RETRIES,
            database: None,
        }
    }
}

impl WorkflowConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `DATABASE_URL` (optional)
    /// - `RPMS_DB_MAX_CONNECTIONS` (default: 10)
    /// - `RPMS_ENFORCEMENT`: `compatible` or `strict` (default: compatible)
    /// - `RPMS_ALLOCATOR`: `sequence` or `scan` (default: sequence)
    /// - `RPMS_ALLOCATION_RETRIES` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let enforcement = match get("RPMS_ENFORCEMENT") {
            Some(raw) => raw
                .parse::<EnforcementMode>()
                .map_err(|_| ConfigError::Invalid("RPMS_ENFORCEMENT", raw))?,
            None => EnforcementMode::default(),
        };
        let allocator = match get("RPMS_ALLOCATOR") {
            Some(raw) => raw
                .parse::<AllocatorKind>()
                .map_err(|_| ConfigError::Invalid("RPMS_ALLOCATOR", raw))?,
            None => AllocatorKind::default(),
        };
        let allocation_retries = parse_number(
            "RPMS_ALLOCATION_RETRIES",
            get("RPMS_ALLOCATION_RETRIES"),
            DEFAULT_ALLOCATION_RETRIES,
        )?;
        let max_connections = parse_number(
            "RPMS_DB_MAX_CONNECTIONS",
            get("RPMS_DB_MAX_CONNECTIONS"),
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid("RPMS_DB_MAX_CONNECTIONS", "0".into()));
        }
        let database = get("DATABASE_URL").map(|url| DatabaseConfig {
            url,
            max_connections,
        });

        Ok(Self {
            enforcement,
            allocator,
            allocation_retries,
            database,
        })
    }
}

fn parse_number(var: &'static str, raw: Option<String>, default: u32) -> Result<u32, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(var, raw)),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {1:?} for {0}")]
    Invalid(&'static str, String),
}
