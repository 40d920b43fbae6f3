use sqlx::{
    PgPool,
    migrate::{AppliedMigration, Migrate, Migrator},
};

use crate::helpers::{BootstrapError, MIGRATOR};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied: bool,
    /// The file changed after it was applied.
    pub checksum_mismatch: bool,
}

/// Pairs every up migration known to `migrator` with what the database recorded.
pub fn migration_status(migrator: &Migrator, applied: &[AppliedMigration]) -> Vec<MigrationStatus> {
    migrator
        .iter()
        .filter(|migration| !migration.migration_type.is_down_migration())
        .map(|migration| {
            let recorded = applied
                .iter()
                .find(|applied| applied.version == migration.version);
            MigrationStatus {
                version: migration.version,
                description: migration.description.to_string(),
                applied: recorded.is_some(),
                checksum_mismatch: recorded
                    .is_some_and(|applied| applied.checksum != migration.checksum),
            }
        })
        .collect()
}

pub async fn applied_migrations(pool: &PgPool) -> Result<Vec<AppliedMigration>, BootstrapError> {
    let mut conn = pool.acquire().await?;
    conn.ensure_migrations_table().await?;
    Ok(conn.list_applied_migrations().await?)
}

pub async fn run_pending(pool: &PgPool) -> Result<Vec<MigrationStatus>, BootstrapError> {
    MIGRATOR.run(pool).await?;
    current_status(pool).await
}

pub async fn current_status(pool: &PgPool) -> Result<Vec<MigrationStatus>, BootstrapError> {
    let applied = applied_migrations(pool).await?;
    Ok(migration_status(&MIGRATOR, &applied))
}

pub fn render(statuses: &[MigrationStatus]) -> String {
    statuses
        .iter()
        .map(|status| {
            let state = match (status.applied, status.checksum_mismatch) {
                (true, false) => "applied",
                (true, true) => "applied (checksum mismatch)",
                (false, _) => "pending",
            };
            format!("{:>14}  {:<28}  {}", status.version, state, status.description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
