//! Database Schema Definitions
//!
//! Migrations are additive only: each one creates tables or indexes with
//! `IF NOT EXISTS` and never drops or rewrites existing data.

/// Current database schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// A numbered schema migration
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i32,
    pub sql: &'static str,
}

/// Schema migrations, in version order
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("schema.sql"),
}];

/// Check if database needs migration
pub fn needs_migration(current_version: i32) -> bool {
    current_version < CURRENT_SCHEMA_VERSION
}

/// Get pending migrations
pub fn pending_migrations(current_version: i32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS
        .iter()
        .filter(move |migration| migration.version > current_version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_version() {
        assert_eq!(CURRENT_SCHEMA_VERSION, 1);
        assert!(!needs_migration(CURRENT_SCHEMA_VERSION));
        assert!(needs_migration(0));
    }

    #[test]
    fn test_pending_migrations() {
        let versions: Vec<i32> = pending_migrations(0).map(|m| m.version).collect();
        assert_eq!(versions, vec![1]);
        assert_eq!(pending_migrations(1).count(), 0);
    }

    #[test]
    fn test_migrations_are_additive() {
        for migration in MIGRATIONS {
            let sql = migration.sql.to_uppercase();
            assert!(!sql.contains("DROP "), "migration {} drops data", migration.version);
            assert!(!sql.contains("ALTER "), "migration {} alters a table", migration.version);
        }
    }

    #[test]
    fn test_last_migration_matches_current_version() {
        assert_eq!(MIGRATIONS.last().map(|m| m.version), Some(CURRENT_SCHEMA_VERSION));
    }
}
