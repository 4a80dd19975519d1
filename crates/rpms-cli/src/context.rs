//! Global options and backend selection.

use anyhow::{bail, Context, Result};
use clap::Args;
use rpms_core::{Actor, Role, UserId};
use rpms_state::EnforcementMode;
use rpms_workflow::db::{init_pool, PgStore};
use rpms_workflow::{AllocatorKind, DatabaseConfig, Stores, Workflow, WorkflowConfig};

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Enforce the strict lifecycle graph instead of the compatible rules.
    #[arg(long, global = true)]
    pub strict: bool,

    /// Publication identifier allocation strategy (sequence or scan).
    #[arg(long, global = true)]
    pub allocator: Option<AllocatorKind>,
}

impl GlobalOpts {
    /// Environment configuration with command-line overrides applied.
    pub fn config(&self) -> Result<WorkflowConfig> {
        let mut config = WorkflowConfig::from_env().context("invalid environment configuration")?;
        if self.strict {
            config.enforcement = EnforcementMode::Strict;
        }
        if let Some(allocator) = self.allocator {
            config.allocator = allocator;
        }
        if let Some(url) = self.database_url.as_ref().filter(|u| !u.trim().is_empty()) {
            let max_connections = config
                .database
                .as_ref()
                .map_or(rpms_workflow::config::DEFAULT_MAX_CONNECTIONS, |db| db.max_connections);
            config.database = Some(DatabaseConfig {
                url: url.clone(),
                max_connections,
            });
        }
        Ok(config)
    }
}

/// The user a command acts as.
#[derive(Args, Debug, Clone)]
pub struct ActingUser {
    /// Acting user's id.
    #[arg(long = "user")]
    pub user_id: UserId,

    /// Role the user acts in (author, editor, admin, coordinator).
    #[arg(long)]
    pub role: Role,
}

impl ActingUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }
}

/// Connect to Postgres and build a workflow over it.
pub async fn connect(opts: &GlobalOpts) -> Result<(Workflow, PgStore)> {
    let config = opts.config()?;
    let pool = init_pool(require_database(&config)?)
        .await
        .context("failed to connect to PostgreSQL")?;
    let store = PgStore::new(pool);
    tracing::debug!(
        enforcement = %config.enforcement,
        allocator = %config.allocator,
        "workflow configured"
    );
    let workflow = Workflow::new(Stores::postgres(&store, config.allocator), &config);
    Ok((workflow, store))
}

/// There is no in-memory fallback: stored-paper commands need Postgres.
fn require_database(config: &WorkflowConfig) -> Result<&DatabaseConfig> {
    match config.database.as_ref() {
        Some(database) => Ok(database),
        None => bail!("DATABASE_URL (or --database-url) is required for this command"),
    }
}
