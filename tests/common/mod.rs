#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use asset_ledger::{
    account::{
        model::SignupInput,
        repo::{LedgerRepository, MemoryRepository},
    },
    db::Database,
};
use rand::Rng;
use sqlx::SqlitePool;

fn random_name() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

pub async fn setup_test_db() -> SqlitePool {
    let db_name = format!("test_{}", random_name());
    let database_url = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    // One connection keeps the shared in-memory database alive and serialises access.
    let pool = Database::new_sqlite_pool(&database_url, 1)
        .await
        .expect("Failed to create in-memory SQLite DB");
    Database::migrate_sqlite(&pool)
        .await
        .expect("Failed to create test tables");

    pool
}

pub async fn sqlite_repository() -> Arc<dyn LedgerRepository> {
    Arc::new(setup_test_db().await)
}

/// SQLite database in a temporary file, removed on drop. Unlike the shared
/// in-memory database it can be opened by several pooled connections at once.
pub struct FileDb {
    pub repository: Arc<dyn LedgerRepository>,
    path: PathBuf,
}

impl Drop for FileDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
        let _ = std::fs::remove_file(self.path.with_extension("db-journal"));
    }
}

pub async fn file_sqlite_repository(max_connections: u32) -> FileDb {
    let path = std::env::temp_dir().join(format!("asset_ledger_{}.db", random_name()));
    let database_url = format!("sqlite://{}?mode=rwc", path.display());

    let pool = Database::new_sqlite_pool(&database_url, max_connections)
        .await
        .expect("Failed to create file SQLite DB");
    Database::migrate_sqlite(&pool)
        .await
        .expect("Failed to create test tables");

    FileDb {
        repository: Arc::new(pool),
        path,
    }
}

pub fn memory_repository() -> Arc<dyn LedgerRepository> {
    Arc::new(MemoryRepository::new())
}

pub fn unique_email() -> String {
    let suffix: u32 = rand::thread_rng().r#gen();
    format!("gustavo-{}@example.com", suffix)
}

pub fn valid_signup() -> SignupInput {
    SignupInput {
        name: "Gustavo B".to_string(),
        email: unique_email(),
        document: "11144477735".to_string(),
        password: "Senha123".to_string(),
    }
}
