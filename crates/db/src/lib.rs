// crates/db/src/lib.rs
//! SQLite snapshot store for statline, plus the three timeline operations
//! built on it: `ingest`, `get_history` and `get_sessions`.

mod history;
mod ingest;
mod migrations;
mod sessions;
mod snapshots;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{ConnectOptions, SqlitePool};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use statline_core::{Config, DatabaseConfig, Interrupted, TimelineConfig, ValidationError};
use statline_types::PlayerId;

use crate::ingest::SnapshotIds;

pub use statline_core::{IngestOutcome, RequestContext};

/// The operation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Ingest,
    History,
    Sessions,
    Timeline,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Ingest => "ingest",
            Operation::History => "history",
            Operation::Sessions => "sessions",
            Operation::Timeline => "timeline",
        })
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Failed to determine data directory")]
    NoDataDir,

    #[error("Failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),

    #[error("Invalid {op} request: {source}")]
    Validation {
        op: Operation,
        #[source]
        source: ValidationError,
    },

    #[error("{op} for player {player} {reason}")]
    Interrupted {
        op: Operation,
        player: PlayerId,
        reason: Interrupted,
    },

    #[error("{op} for player {player} failed: {source}")]
    Store {
        op: Operation,
        player: PlayerId,
        #[source]
        source: sqlx::Error,
    },

    #[error("Stored snapshot {id} is unreadable: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("Snapshot id sequence exhausted for this millisecond: {0}")]
    IdOverflow(#[from] ulid::MonotonicError),
}

impl DbError {
    pub(crate) fn validation(op: Operation, source: impl Into<ValidationError>) -> Self {
        Self::Validation {
            op,
            source: source.into(),
        }
    }

    pub(crate) fn interrupted(op: Operation, player: &PlayerId, reason: Interrupted) -> Self {
        Self::Interrupted {
            op,
            player: player.clone(),
            reason,
        }
    }

    /// Attach operation and player to a bare store error.
    pub(crate) fn scoped(self, op: Operation, player: &PlayerId) -> Self {
        match self {
            Self::Sqlx(source) => Self::Store {
                op,
                player: player.clone(),
                source,
            },
            other => other,
        }
    }

    /// Store failures (connectivity, busy, I/O) may succeed on retry.
    /// Validation, interruption and corrupt rows will not.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Store { .. })
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Main database handle wrapping a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    db_path: PathBuf,
    timeline: TimelineConfig,
    ids: SnapshotIds,
}

impl Database {
    /// Open (or create) the database at the given path and run migrations.
    pub async fn new(path: &Path) -> DbResult<Self> {
        Self::connect(path, &DatabaseConfig::default()).await
    }

    /// Open the database described by `config`, falling back to the default
    /// location when no path is configured.
    pub async fn from_config(config: &Config) -> DbResult<Self> {
        let path = match &config.database.path {
            Some(path) => path.clone(),
            None => default_db_path()?,
        };
        let db = Self::connect(&path, &config.database).await?;
        Ok(db.with_timeline(config.timeline))
    }

    async fn connect(path: &Path, config: &DatabaseConfig) -> DbResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(config.busy_timeout_secs))
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let db = Self {
            pool,
            db_path: path.to_owned(),
            timeline: TimelineConfig::default(),
            ids: SnapshotIds::new(),
        };
        db.run_migrations().await?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    ///
    /// Uses `shared_cache(true)` so all pool connections share the same
    /// in-memory database. Without this, each connection gets its own
    /// separate database, breaking concurrent queries.
    pub async fn new_in_memory() -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?
            .shared_cache(true)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        let db = Self {
            pool,
            db_path: PathBuf::new(),
            timeline: TimelineConfig::default(),
            ids: SnapshotIds::new(),
        };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Open the database at the default location: `<data dir>/statline/statline.db`
    pub async fn open_default() -> DbResult<Self> {
        let path = default_db_path()?;
        Self::new(&path).await
    }

    /// Replace the dedup and session windows.
    pub fn with_timeline(mut self, timeline: TimelineConfig) -> Self {
        self.timeline = timeline;
        self
    }

    pub fn timeline_config(&self) -> &TimelineConfig {
        &self.timeline
    }

    /// Run all inline migrations.
    ///
    /// Uses a `_migrations` table to track which migrations have already been
    /// applied, so each statement runs exactly once per database.
    async fn run_migrations(&self) -> DbResult<()> {
        // Ensure the migration-tracking table exists
        sqlx::query("CREATE TABLE IF NOT EXISTS _migrations (version INTEGER PRIMARY KEY)")
            .execute(&self.pool)
            .await?;

        // Find the highest version already applied (0 if none)
        let row: (i64,) = sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM _migrations")
            .fetch_one(&self.pool)
            .await?;
        let current_version = row.0 as usize;

        for (i, migration) in migrations::MIGRATIONS.iter().enumerate() {
            let version = i + 1; // 1-based
            if version > current_version {
                let mut tx = self.pool.begin().await?;
                sqlx::query(migration).execute(&mut *tx).await?;
                sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
                    .bind(version as i64)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                info!(version, "Applied migration");
            }
        }

        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get the path to the database file.
    /// Returns an empty path for in-memory databases.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// Returns the default database path: `<data dir>/statline/statline.db`
pub fn default_db_path() -> DbResult<PathBuf> {
    statline_core::paths::db_path().ok_or(DbError::NoDataDir)
}

/// Parse the caller's player string, tagging failures with the operation.
pub(crate) fn parse_player(op: Operation, raw: &str) -> DbResult<PlayerId> {
    PlayerId::parse(raw).map_err(|e| DbError::validation(op, e))
}

/// Run store work under the request's cancellation and deadline.
///
/// On interruption the work future is dropped, which returns its pooled
/// connection and rolls back any transaction it had open.
pub(crate) async fn run_scoped<T>(
    ctx: &RequestContext,
    op: Operation,
    player: &PlayerId,
    work: impl Future<Output = DbResult<T>>,
) -> DbResult<T> {
    match ctx.run(work).await {
        Ok(result) => result.map_err(|e| e.scoped(op, player)),
        Err(reason) => Err(DbError::interrupted(op, player, reason)),
    }
}
