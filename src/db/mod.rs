pub mod memory;
pub mod portfolio;
pub mod store;
pub mod users;

use sea_orm::{Database, DatabaseConnection, DbErr};

pub use memory::InMemoryPortfolioStore;
pub use portfolio::PgPortfolioStore;
pub use store::{PortfolioStore, StoreError, StoreResult};

/// Create a SeaORM database connection pool for the given URL.
pub async fn create_pool(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
