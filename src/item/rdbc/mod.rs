use sqlx::{Database, Encode, Type, query_builder::Separated};

use super::address::AddressRecord;

#[cfg(feature = "rdbc-mysql")]
pub mod mysql_writer;

#[cfg(feature = "rdbc-sqlite")]
pub mod sqlite_writer;

/// Trait for binding item data to database query parameters.
///
/// This trait is generic over the database type, allowing it to work with
/// MySQL, SQLite, and other databases supported by SQLx.
///
/// # Type Parameters
///
/// * `O` - The item type to bind
/// * `DB` - The SQLx database type (e.g., `MySql`, `Sqlite`)
///
/// # Examples
///
/// ```no_run
/// use address_batch::item::rdbc::DatabaseItemBinder;
/// use sqlx::{query_builder::Separated, MySql};
///
/// struct Street {
///     code: String,
///     name: String,
/// }
///
/// struct StreetBinder;
/// impl DatabaseItemBinder<Street, MySql> for StreetBinder {
///     fn bind(&self, item: &Street, mut query_builder: Separated<MySql, &str>) {
///         query_builder.push_bind(item.code.clone());
///         query_builder.push_bind(item.name.clone());
///     }
/// }
/// ```
pub trait DatabaseItemBinder<O, DB: Database> {
    /// Binds the properties of an item to a separated query builder.
    ///
    /// # Arguments
    ///
    /// * `item` - The item whose properties should be bound.
    /// * `query_builder` - The separated query builder to bind parameters to.
    fn bind(&self, item: &O, query_builder: Separated<DB, &str>);
}

/// Binds the fields of an [`AddressRecord`] as text, in column order.
#[derive(Debug, Default, Clone, Copy)]
pub struct AddressItemBinder;

impl<DB> DatabaseItemBinder<AddressRecord, DB> for AddressItemBinder
where
    DB: Database,
    String: for<'q> Encode<'q, DB> + Type<DB>,
{
    fn bind(&self, item: &AddressRecord, mut query_builder: Separated<DB, &str>) {
        for value in item.values() {
            query_builder.push_bind(value.to_string());
        }
    }
}

/// Start of the insert statement: `INSERT INTO <table> (<columns>) `.
pub(crate) fn insert_prefix(table: &str, columns: &[&str]) -> String {
    format!("INSERT INTO {} ({}) ", table, columns.join(","))
}

/// Largest number of rows of `column_count` columns one statement can carry
/// under a database limit of `bind_limit` parameters.
pub(crate) fn max_rows_per_statement(bind_limit: usize, column_count: usize) -> usize {
    (bind_limit / column_count.max(1)).max(1)
}

#[cfg(feature = "rdbc-mysql")]
pub use mysql_writer::MySqlItemWriter;
#[cfg(feature = "rdbc-sqlite")]
pub use sqlite_writer::SqliteItemWriter;
