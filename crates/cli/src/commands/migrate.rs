//! Database migration command.

use super::{CommandError, connect};

/// Apply any pending migrations from `crates/api/migrations`.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
