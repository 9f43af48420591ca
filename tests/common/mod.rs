#![allow(dead_code)]

pub mod mocks;

use std::{fs, path::Path};

use address_batch::{
    config::{BatchConfig, DatabaseConfig},
    item::address::{ADDRESS_FIELD_COUNT, AddressRecord},
};
use sqlx::{SqlitePool, migrate::Migrator, sqlite::SqlitePoolOptions};

/// A well-formed address line, identified by its town code.
pub fn address_line(town_code: &str) -> String {
    let mut record = AddressRecord::default();
    record.town_code = town_code.to_string();
    record.city_name = "서울특별시".to_string();
    record.road_name = "세종대로".to_string();
    record.building_management_num = format!("{}-0001", town_code);
    record.zip_code = "03154".to_string();
    record.to_line('|')
}

/// A line with `count` fields instead of the expected 33.
pub fn short_line(count: usize) -> String {
    assert!(count < ADDRESS_FIELD_COUNT);
    vec!["x"; count].join("|")
}

pub fn write_file(dir: &Path, name: &str, lines: &[String]) {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(dir.join(name), content).unwrap();
}

pub fn config(source_dir: &Path) -> BatchConfig {
    BatchConfig {
        source_dir: source_dir.to_path_buf(),
        file_prefix: "match_building".to_string(),
        file_suffix: "txt".to_string(),
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        table: "test_address".to_string(),
        chunk_size: 1,
        skip_limit: 0,
        cursor_path: None,
    }
}

/// In-memory database holding an empty `test_address` table.
///
/// The pool keeps a single connection alive: every connection to
/// `sqlite::memory:` opens its own database.
pub async fn address_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    let migrator = Migrator::new(Path::new("tests/migrations/sqlite")).await?;
    migrator.run(&pool).await?;

    Ok(pool)
}

pub async fn town_codes(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT townCode FROM test_address ORDER BY id")
        .fetch_all(pool)
        .await
}
