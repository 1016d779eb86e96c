// src/db.rs

use std::{str::FromStr, time::Duration};

use sqlx::{
    Sqlite, SqlitePool, Transaction,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

pub mod application_repo;
pub use application_repo::ApplicationRepository;
pub mod bulk_repo;
pub use bulk_repo::BulkSubmissionRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;

/// Abre o pool com chaves estrangeiras ligadas e cria o arquivo se preciso.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
}

/// Banco em memória com uma única conexão que nunca expira
/// (cada conexão nova seria um banco vazio).
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Transação de escrita (`BEGIN IMMEDIATE`): o lock de escrita é pego já na
/// abertura, então transações concorrentes esperam o `busy_timeout` em vez de
/// falharem com SQLITE_BUSY ao passar da leitura para a escrita.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!().run(pool).await
}
