use mongodb::{Database, bson::doc};
use tracing::debug;

use crate::common::{DatabaseError, DatabaseResult};

/// Ping the database; used by readiness endpoints.
pub async fn check_health(db: &Database) -> DatabaseResult<()> {
    db.run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))?;

    debug!(database = db.name(), "MongoDB ping ok");
    Ok(())
}
