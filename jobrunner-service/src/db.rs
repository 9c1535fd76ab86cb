use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::time::Duration;

pub async fn create_pool(database_file: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_file == ":memory:";

    let mut options = SqliteConnectOptions::new()
        .filename(database_file)
        .busy_timeout(Duration::from_secs(5));

    if !in_memory {
        options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
    }

    // Each new connection to ":memory:" opens its own empty database,
    // so the pool must hold exactly one.
    let max_connections = if in_memory { 1 } else { 10 };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Create jobs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            args TEXT NOT NULL DEFAULT '{}',
            priority INTEGER NOT NULL DEFAULT 0,
            state TEXT NOT NULL,
            status_message TEXT,
            submitted_at TEXT NOT NULL,
            started_at TEXT,
            finished_at TEXT,
            retry_count INTEGER NOT NULL DEFAULT 0,
            depends_on TEXT NOT NULL DEFAULT '[]',
            timeout_secs INTEGER,
            result TEXT,
            error_kind TEXT,
            error_message TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(state)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_kind ON jobs(kind)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_submitted_at ON jobs(submitted_at DESC)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
