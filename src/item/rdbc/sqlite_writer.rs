use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::BatchError;
use crate::core::item::{ItemWriter, ItemWriterResult};
use crate::item::rdbc::{DatabaseItemBinder, insert_prefix, max_rows_per_statement};

// SQLITE_MAX_VARIABLE_NUMBER of SQLite 3.32 and later.
const BIND_LIMIT: usize = 32766;

/// A writer for inserting items into a SQLite database using SQLx.
///
/// Each chunk becomes one parameterized multi-row `INSERT`, executed in its
/// own transaction; `write` returns once the transaction is committed. A
/// chunk wider than the bind parameter limit is split into several
/// statements inside that same transaction.
///
/// Mirrors [`MySqlItemWriter`](super::MySqlItemWriter) for local runs and
/// tests. Works with both file-based (`sqlite://path/to/db.sqlite`) and
/// in-memory (`sqlite::memory:`) databases; an in-memory pool should keep a
/// single connection so every statement sees the same database.
pub struct SqliteItemWriter<'a, O> {
    pool: Option<&'a Pool<Sqlite>>,
    table: Option<&'a str>,
    columns: Vec<&'a str>,
    item_binder: Option<&'a dyn DatabaseItemBinder<O, Sqlite>>,
}

impl<O> Default for SqliteItemWriter<'_, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, O> SqliteItemWriter<'a, O> {
    /// Creates a new `SqliteItemWriter` with default configuration.
    ///
    /// Pool, table, columns and item binder must be set before use.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use address_batch::item::address::{AddressRecord, ADDRESS_COLUMNS};
    /// use address_batch::item::rdbc::{AddressItemBinder, SqliteItemWriter};
    /// use sqlx::SqlitePool;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = SqlitePool::connect("sqlite://geodata.db").await?;
    /// let binder = AddressItemBinder;
    ///
    /// let writer = SqliteItemWriter::<AddressRecord>::new()
    ///     .pool(&pool)
    ///     .table("test_address")
    ///     .columns(&ADDRESS_COLUMNS)
    ///     .item_binder(&binder);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Self {
        Self {
            pool: None,
            table: None,
            columns: Vec::new(),
            item_binder: None,
        }
    }

    pub fn pool(mut self, pool: &'a Pool<Sqlite>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn table(mut self, table: &'a str) -> Self {
        self.table = Some(table);
        self
    }

    /// Adds a column to the writer.
    ///
    /// Columns are bound in the order they are added.
    pub fn add_column(mut self, column: &'a str) -> Self {
        self.columns.push(column);
        self
    }

    pub fn columns(mut self, columns: &[&'a str]) -> Self {
        self.columns.extend_from_slice(columns);
        self
    }

    pub fn item_binder(mut self, item_binder: &'a dyn DatabaseItemBinder<O, Sqlite>) -> Self {
        self.item_binder = Some(item_binder);
        self
    }

    fn target(
        &self,
    ) -> Result<(&'a Pool<Sqlite>, &'a str, &'a dyn DatabaseItemBinder<O, Sqlite>), BatchError> {
        let pool = self
            .pool
            .ok_or_else(|| BatchError::ItemWriter("SQLite writer has no pool".to_string()))?;
        let table = self
            .table
            .ok_or_else(|| BatchError::ItemWriter("SQLite writer has no table".to_string()))?;
        let item_binder = self
            .item_binder
            .ok_or_else(|| BatchError::ItemWriter("SQLite writer has no item binder".to_string()))?;

        if self.columns.is_empty() {
            return Err(BatchError::ItemWriter(
                "SQLite writer needs one or more columns".to_string(),
            ));
        }

        Ok((pool, table, item_binder))
    }
}

impl<O> ItemWriter<O> for SqliteItemWriter<'_, O> {
    /// Writes items to the SQLite database.
    ///
    /// # Returns
    ///
    /// - `Ok(())` once every item is committed
    /// - `Err(BatchError::ItemWriter)` if the writer is incomplete or the
    ///   database rejected the statement; nothing of the chunk is kept then
    fn write(&self, items: &[O]) -> ItemWriterResult {
        if items.is_empty() {
            return Ok(());
        }

        let (pool, table, item_binder) = self.target()?;
        let prefix = insert_prefix(table, &self.columns);
        let rows_per_statement = max_rows_per_statement(BIND_LIMIT, self.columns.len());

        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            BatchError::ItemWriter(format!("SQLite writer needs a Tokio runtime: {}", e))
        })?;

        let result = tokio::task::block_in_place(|| {
            handle.block_on(async {
                let mut transaction = pool.begin().await?;

                for rows in items.chunks(rows_per_statement) {
                    let mut query_builder = QueryBuilder::<Sqlite>::new(prefix.as_str());
                    query_builder.push_values(rows, |b, item| {
                        item_binder.bind(item, b);
                    });
                    query_builder.build().execute(&mut *transaction).await?;
                }

                transaction.commit().await
            })
        });

        match result {
            Ok(()) => {
                log::debug!("Successfully wrote {} items to SQLite table {}", items.len(), table);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to write items to SQLite table {}: {}", table, e);
                Err(BatchError::ItemWriter(format!("SQLite write failed: {}", e)))
            }
        }
    }
}
