//! Once-per-process construction of the database handle.

use std::sync::atomic::{AtomicUsize, Ordering};

use sea_orm::DbErr;
use tokio::sync::OnceCell;

use crate::config::{DatabaseConfig, Environment};
use crate::db::handle::Database;

/// Owns the construction of the process's only [`Database`].
///
/// Every call to [`DatabaseProvider::handle`] returns a clone of the same
/// handle, so repeated initialisation never opens a second pool.
pub struct DatabaseProvider {
    config: DatabaseConfig,
    environment: Environment,
    cell: OnceCell<Database>,
    constructions: AtomicUsize,
}

impl DatabaseProvider {
    pub fn new(config: DatabaseConfig, environment: Environment) -> Self {
        Self {
            config,
            environment,
            cell: OnceCell::new(),
            constructions: AtomicUsize::new(0),
        }
    }

    /// The shared handle, constructing it and starting the probe on first use.
    pub async fn handle(&self) -> Result<Database, DbErr> {
        let db = self
            .cell
            .get_or_try_init(|| async {
                let db = Database::connect(&self.config, &self.environment).await?;
                self.constructions.fetch_add(1, Ordering::SeqCst);
                db.spawn_probe();
                Ok::<_, DbErr>(db)
            })
            .await?;
        Ok(db.clone())
    }

    /// The handle if it has already been constructed.
    pub fn get(&self) -> Option<Database> {
        self.cell.get().cloned()
    }

    /// How many pools this provider has built (0 or 1).
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}
