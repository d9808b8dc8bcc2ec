//! Schema-driven table storage on a local SQLite file.
//!
//! A `Store` opens in the uninitialized state. `init` creates any missing
//! tables (or rejects an on-disk layout that disagrees with the definition)
//! and only then are `insert` and `select` accepted. Writes go through a
//! single-connection pool so they are applied in issue order; reads use a
//! separate read-only pool.

use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool,
    SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, Sqlite};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::StoreError;

pub use query::{Direction, InsertOptions, SelectQuery};
pub use schema::{ColumnDef, DataType, DatabaseSchema, TableSchema};
pub use value::{Record, Value};

mod query;
mod schema;
mod value;

use schema::{quote_ident, ExistingColumn};
use value::{format_datetime, parse_datetime};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

pub struct Store {
    path: PathBuf,
    reader: SqlitePool,
    writer: SqlitePool,
    schema: OnceLock<DatabaseSchema>,
    init_lock: Mutex<()>,
    op_timeout: Duration,
}

impl Store {
    /// Open (creating if missing) the database file. The store is not usable
    /// until [`Store::init`] succeeds.
    pub async fn open(config: &DatabaseConfig, op_timeout: Duration) -> Result<Self, StoreError> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout())
            .create_if_missing(true);

        let read_options = options.clone().create_if_missing(false).read_only(true);

        // The writer creates the file and switches it to WAL before any reader connects.
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(read_options)
            .await?;

        debug!(path = %config.path.display(), "opened store");

        Ok(Self {
            path: config.path.clone(),
            reader,
            writer,
            schema: OnceLock::new(),
            init_lock: Mutex::new(()),
            op_timeout,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_ready(&self) -> bool {
        self.schema.get().is_some()
    }

    /// Create absent tables and check existing ones against `schema`.
    ///
    /// Returns `true` when at least one table was created. Fails with
    /// [`StoreError::Schema`] if a table on disk has a different layout, or if
    /// the store was already initialized with a different schema. Concurrent
    /// calls run one after the other.
    pub async fn init(&self, schema: &DatabaseSchema) -> Result<bool, StoreError> {
        let _guard = self.init_lock.lock().await;

        if let Some(current) = self.schema.get() {
            if current != schema {
                return Err(StoreError::Schema(format!(
                    "store already initialized with schema '{}'",
                    current.name
                )));
            }
        }

        validate_definition(schema)?;

        let created = self.bounded("init", self.create_tables(schema)).await?;
        if let Err(rejected) = self.schema.set(schema.clone()) {
            if self.schema.get() != Some(&rejected) {
                return Err(StoreError::Schema(format!(
                    "store already initialized with another schema than '{}'",
                    rejected.name
                )));
            }
        }

        info!(schema = %schema.name, created, "store ready");
        Ok(created)
    }

    async fn create_tables(&self, schema: &DatabaseSchema) -> Result<bool, StoreError> {
        let mut tx = self.writer.begin().await?;
        let mut created = false;

        for table in &schema.tables {
            let existing = table_info(&mut tx, &table.name).await?;
            if existing.is_empty() {
                sqlx::query(&table.create_sql()).execute(&mut *tx).await?;
                debug!(table = %table.name, "created table");
                created = true;
            } else if let Some(diff) = table.diff(&existing) {
                warn!(table = %table.name, %diff, "schema conflict");
                return Err(StoreError::Schema(diff));
            }
        }

        tx.commit().await?;
        Ok(created)
    }

    pub async fn insert(
        &self,
        table: &str,
        records: &[Record],
        options: InsertOptions,
    ) -> Result<(), StoreError> {
        let table = self.table(table)?;
        for record in records {
            validate_record(table, record)?;
        }
        if records.is_empty() {
            return Ok(());
        }

        self.bounded("insert", self.insert_records(table, records, options))
            .await
    }

    async fn insert_records(
        &self,
        table: &TableSchema,
        records: &[Record],
        options: InsertOptions,
    ) -> Result<(), StoreError> {
        let sql = insert_sql(table, options);
        let mut tx = self.writer.begin().await?;

        for record in records {
            let mut query = sqlx::query(&sql);
            for column in &table.columns {
                query = bind_value(query, record.get(&column.name).unwrap_or(&Value::Null));
            }
            query
                .execute(&mut *tx)
                .await
                .map_err(|e| map_write_error(e, &table.name))?;
        }

        tx.commit().await?;
        debug!(table = %table.name, rows = records.len(), upsert = options.upsert, "inserted");
        Ok(())
    }

    pub async fn select(&self, table: &str, query: &SelectQuery) -> Result<Vec<Record>, StoreError> {
        let table = self.table(table)?;
        validate_query(table, query)?;

        self.bounded("select", self.select_records(table, query)).await
    }

    async fn select_records(
        &self,
        table: &TableSchema,
        query: &SelectQuery,
    ) -> Result<Vec<Record>, StoreError> {
        let sql = select_sql(table, query);
        let mut statement = sqlx::query(&sql);
        for (_, value) in query.filters.iter().filter(|(_, v)| !v.is_null()) {
            statement = bind_value(statement, value);
        }
        if let Some(limit) = query.limit {
            statement = statement.bind(i64::from(limit));
        }

        let rows = statement.fetch_all(&self.reader).await?;
        let records = rows
            .iter()
            .map(|row| decode_row(table, row))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(table = %table.name, rows = records.len(), "selected");
        Ok(records)
    }

    /// Number of rows in `table`.
    pub async fn count(&self, table: &str) -> Result<u64, StoreError> {
        let table = self.table(table)?;
        let sql = format!("SELECT COUNT(*) AS n FROM {}", quote_ident(&table.name));

        self.bounded("count", async {
            let row = sqlx::query(&sql).fetch_one(&self.reader).await?;
            let n: i64 = row.try_get("n")?;
            Ok::<u64, StoreError>(n.max(0) as u64)
        })
        .await
    }

    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }

    fn table(&self, name: &str) -> Result<&TableSchema, StoreError> {
        let schema = self.schema.get().ok_or(StoreError::NotReady)?;
        schema
            .table(name)
            .ok_or_else(|| StoreError::Schema(format!("unknown table '{name}'")))
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout = ?self.op_timeout, "storage operation timed out");
                Err(StoreError::Timeout {
                    operation,
                    elapsed: self.op_timeout,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_definition(schema: &DatabaseSchema) -> Result<(), StoreError> {
    for (i, table) in schema.tables.iter().enumerate() {
        if schema.tables[..i].iter().any(|t| t.name == table.name) {
            return Err(StoreError::Schema(format!("table '{}' defined twice", table.name)));
        }
        if table.columns.is_empty() {
            return Err(StoreError::Schema(format!("table '{}' has no columns", table.name)));
        }
        for (j, column) in table.columns.iter().enumerate() {
            if table.columns[..j].iter().any(|c| c.name == column.name) {
                return Err(StoreError::Schema(format!(
                    "column '{}.{}' defined twice",
                    table.name, column.name
                )));
            }
        }
        if table.columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(StoreError::Schema(format!(
                "table '{}' declares more than one primary key",
                table.name
            )));
        }
    }
    Ok(())
}

fn validate_record(table: &TableSchema, record: &Record) -> Result<(), StoreError> {
    if let Some(unknown) = record.columns().find(|c| table.column(c).is_none()) {
        return Err(StoreError::Schema(format!(
            "table '{}' has no column '{unknown}'",
            table.name
        )));
    }

    for column in &table.columns {
        let value = record.get(&column.name).unwrap_or(&Value::Null);
        if value.is_null() && column.not_null {
            return Err(StoreError::Constraint(format!(
                "column '{}.{}' may not be null",
                table.name, column.name
            )));
        }
        if !value.fits(column.data_type) {
            return Err(StoreError::Constraint(format!(
                "column '{}.{}' expects {:?}, got {}",
                table.name,
                column.name,
                column.data_type,
                value.kind()
            )));
        }
    }
    Ok(())
}

fn validate_query(table: &TableSchema, query: &SelectQuery) -> Result<(), StoreError> {
    for (column, value) in &query.filters {
        let def = table.column(column).ok_or_else(|| {
            StoreError::Schema(format!("table '{}' has no column '{column}'", table.name))
        })?;
        if !value.fits(def.data_type) {
            return Err(StoreError::Schema(format!(
                "filter on '{}.{column}' expects {:?}, got {}",
                table.name,
                def.data_type,
                value.kind()
            )));
        }
    }
    if let Some((column, _)) = &query.order_by {
        if table.column(column).is_none() {
            return Err(StoreError::Schema(format!(
                "cannot order '{}' by unknown column '{column}'",
                table.name
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// SQL generation
// ---------------------------------------------------------------------------

fn column_list(table: &TableSchema) -> String {
    table
        .columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn insert_sql(table: &TableSchema, options: InsertOptions) -> String {
    let placeholders = vec!["?"; table.columns.len()].join(", ");
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&table.name),
        column_list(table),
        placeholders
    );

    if options.upsert {
        if let Some(pk) = table.primary_key() {
            let updates: Vec<String> = table
                .columns
                .iter()
                .filter(|c| !c.primary_key)
                .map(|c| format!("{0} = excluded.{0}", quote_ident(&c.name)))
                .collect();
            if updates.is_empty() {
                sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", quote_ident(&pk.name)));
            } else {
                sql.push_str(&format!(
                    " ON CONFLICT ({}) DO UPDATE SET {}",
                    quote_ident(&pk.name),
                    updates.join(", ")
                ));
            }
        }
    }
    sql
}

fn select_sql(table: &TableSchema, query: &SelectQuery) -> String {
    let mut sql = format!(
        "SELECT {} FROM {}",
        column_list(table),
        quote_ident(&table.name)
    );

    if !query.filters.is_empty() {
        let conditions: Vec<String> = query
            .filters
            .iter()
            .map(|(column, value)| {
                if value.is_null() {
                    format!("{} IS NULL", quote_ident(column))
                } else {
                    format!("{} = ?", quote_ident(column))
                }
            })
            .collect();
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if let Some((column, direction)) = &query.order_by {
        sql.push_str(&format!(" ORDER BY {} {}", quote_ident(column), direction.sql()));
    }

    if query.limit.is_some() {
        sql.push_str(" LIMIT ?");
    }
    sql
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Text(s) => query.bind(s.clone()),
        Value::Bool(b) => query.bind(*b),
        Value::Integer(i) => query.bind(*i),
        Value::DateTime(dt) => query.bind(format_datetime(dt)),
    }
}

fn decode_row(table: &TableSchema, row: &SqliteRow) -> Result<Record, StoreError> {
    let mut record = Record::new();

    for column in &table.columns {
        let name = column.name.as_str();
        let decode_err = |e: sqlx::Error| StoreError::Decode {
            column: name.to_string(),
            reason: e.to_string(),
        };

        let value = match column.data_type {
            DataType::String => row
                .try_get::<Option<String>, _>(name)
                .map_err(decode_err)?
                .map(Value::Text),
            DataType::Boolean => row
                .try_get::<Option<bool>, _>(name)
                .map_err(decode_err)?
                .map(Value::Bool),
            DataType::Integer => row
                .try_get::<Option<i64>, _>(name)
                .map_err(decode_err)?
                .map(Value::Integer),
            DataType::DateTime => row
                .try_get::<Option<String>, _>(name)
                .map_err(decode_err)?
                .map(|s| parse_datetime(name, &s).map(Value::DateTime))
                .transpose()?,
        };

        record.set(name, value.unwrap_or(Value::Null));
    }

    Ok(record)
}

async fn table_info(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<ExistingColumn>, StoreError> {
    let rows = sqlx::query(r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?)"#)
        .bind(table)
        .fetch_all(&mut *conn)
        .await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        columns.push(ExistingColumn {
            name: row.try_get("name")?,
            declared_type: row.try_get("type")?,
            not_null: row.try_get::<i64, _>("notnull")? != 0,
            primary_key: row.try_get::<i64, _>("pk")? != 0,
        });
    }
    Ok(columns)
}

fn map_write_error(err: sqlx::Error, table: &str) -> StoreError {
    match &err {
        // 1555: SQLITE_CONSTRAINT_PRIMARYKEY, 2067: SQLITE_CONSTRAINT_UNIQUE
        sqlx::Error::Database(db)
            if db.is_unique_violation()
                || matches!(db.code().as_deref(), Some("1555") | Some("2067")) =>
        {
            StoreError::Constraint(format!("duplicate primary key in '{table}'"))
        }
        _ => StoreError::Database(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    fn schema() -> DatabaseSchema {
        DatabaseSchema::new(
            "test",
            vec![
                TableSchema::new(
                    "option",
                    vec![
                        ColumnDef::new("key", DataType::String).primary_key(),
                        ColumnDef::new("option", DataType::String),
                    ],
                ),
                TableSchema::new(
                    "event",
                    vec![
                        ColumnDef::new("id", DataType::String).primary_key(),
                        ColumnDef::new("flag", DataType::Boolean).not_null(),
                        ColumnDef::new("seq", DataType::Integer),
                        ColumnDef::new("at", DataType::DateTime).not_null(),
                    ],
                ),
            ],
        )
    }

    async fn open_store(dir: &tempfile::TempDir) -> Store {
        let config = DatabaseConfig::at(dir.path().join("store.db"));
        Store::open(&config, Duration::from_secs(5)).await.unwrap()
    }

    async fn ready_store(dir: &tempfile::TempDir) -> Store {
        let store = open_store(dir).await;
        store.init(&schema()).await.unwrap();
        store
    }

    fn event(id: &str, seq: i64, minutes: i64) -> Record {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Record::new()
            .with("id", id)
            .with("flag", seq % 2 == 0)
            .with("seq", seq)
            .with("at", base + ChronoDuration::minutes(minutes))
    }

    #[tokio::test]
    async fn test_queries_before_init_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        assert!(!store.is_ready());
        let err = store.select("event", &SelectQuery::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotReady));
        let err = store
            .insert("event", &[event("a", 1, 0)], InsertOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotReady));
    }

    #[tokio::test]
    async fn test_init_reports_creation_once() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = open_store(&dir).await;
            assert!(store.init(&schema()).await.unwrap());
            assert!(!store.init(&schema()).await.unwrap());
            store.close().await;
        }

        let store = open_store(&dir).await;
        assert!(!store.init(&schema()).await.unwrap());
        assert!(store.is_ready());
    }

    #[tokio::test]
    async fn test_init_rejects_conflicting_layout() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = ready_store(&dir).await;
            store.close().await;
        }

        let mut changed = schema();
        changed.tables[1].columns[2] = ColumnDef::new("seq", DataType::String);

        let store = open_store(&dir).await;
        let err = store.init(&changed).await.unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)), "{err:?}");
        assert!(!store.is_ready());
    }

    #[tokio::test]
    async fn test_concurrent_inits_with_different_schemas() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let first = DatabaseSchema::new(
            "first",
            vec![TableSchema::new(
                "ta",
                vec![ColumnDef::new("id", DataType::String).primary_key()],
            )],
        );
        let second = DatabaseSchema::new(
            "second",
            vec![TableSchema::new(
                "tb",
                vec![ColumnDef::new("id", DataType::String).primary_key()],
            )],
        );

        let (a, b) = tokio::join!(store.init(&first), store.init(&second));
        assert_eq!(
            [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
            1,
            "a = {a:?}, b = {b:?}"
        );

        let (winner, loser) = if a.is_ok() { ("ta", b) } else { ("tb", a) };
        assert!(matches!(loser, Err(StoreError::Schema(_))));
        store
            .insert(winner, &[Record::new().with("id", "x")], InsertOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reader_pool_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = ready_store(&dir).await;

        let result = sqlx::query("CREATE TABLE scratch (a TEXT)")
            .execute(&store.reader)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_operations_past_timeout_fail() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ready_store(&dir).await;
        store.op_timeout = Duration::ZERO;

        let err = store.select("event", &SelectQuery::new()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Timeout {
                operation: "select",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_init_rejects_duplicate_columns() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;
        let bad = DatabaseSchema::new(
            "bad",
            vec![TableSchema::new(
                "t",
                vec![
                    ColumnDef::new("a", DataType::String),
                    ColumnDef::new("a", DataType::Integer),
                ],
            )],
        );
        assert!(matches!(store.init(&bad).await, Err(StoreError::Schema(_))));
    }

    #[tokio::test]
    async fn test_insert_and_select_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ready_store(&dir).await;

        let record = event("a", 4, 3);
        store
            .insert("event", &[record.clone()], InsertOptions::default())
            .await
            .unwrap();

        let rows = store.select("event", &SelectQuery::new()).await.unwrap();
        assert_eq!(rows, vec![record]);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_constraint_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ready_store(&dir).await;

        store
            .insert("event", &[event("a", 1, 0)], InsertOptions::default())
            .await
            .unwrap();
        let err = store
            .insert("event", &[event("a", 2, 1)], InsertOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)), "{err:?}");

        let rows = store.select("event", &SelectQuery::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].integer("seq").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_batch_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = ready_store(&dir).await;

        let err = store
            .insert(
                "event",
                &[event("a", 1, 0), event("a", 2, 1)],
                InsertOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
        assert_eq!(store.count("event").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ready_store(&dir).await;

        let first = Record::new().with("key", "user").with("option", "Ana");
        let second = Record::new().with("key", "user").with("option", "Bea");
        store.insert("option", &[first], InsertOptions::upsert()).await.unwrap();
        store.insert("option", &[second], InsertOptions::upsert()).await.unwrap();

        let rows = store
            .select("option", &SelectQuery::new().filter("key", "user"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].optional_text("option").unwrap().as_deref(), Some("Bea"));
    }

    #[tokio::test]
    async fn test_nullable_column_accepts_null() {
        let dir = tempfile::tempdir().unwrap();
        let store = ready_store(&dir).await;

        let record = Record::new().with("key", "user");
        store.insert("option", &[record], InsertOptions::upsert()).await.unwrap();

        let rows = store
            .select("option", &SelectQuery::new().filter("option", Value::Null))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("option"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_insert_validates_against_schema() {
        let dir = tempfile::tempdir().unwrap();
        let store = ready_store(&dir).await;

        let missing_required = Record::new().with("id", "a").with("flag", true);
        assert!(matches!(
            store.insert("event", &[missing_required], InsertOptions::default()).await,
            Err(StoreError::Constraint(_))
        ));

        let wrong_type = event("b", 1, 0).with("flag", "yes");
        assert!(matches!(
            store.insert("event", &[wrong_type], InsertOptions::default()).await,
            Err(StoreError::Constraint(_))
        ));

        let unknown_column = event("c", 1, 0).with("extra", 1i64);
        assert!(matches!(
            store.insert("event", &[unknown_column], InsertOptions::default()).await,
            Err(StoreError::Schema(_))
        ));

        assert!(matches!(
            store.insert("nope", &[], InsertOptions::default()).await,
            Err(StoreError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_select_orders_filters_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let store = ready_store(&dir).await;

        let records: Vec<Record> = (0..10)
            .map(|i| event(&format!("e{i}"), i, (i * 7) % 10))
            .collect();
        store
            .insert("event", &records, InsertOptions::default())
            .await
            .unwrap();

        let latest = store
            .select(
                "event",
                &SelectQuery::new().order_by("at", Direction::Desc).limit(3),
            )
            .await
            .unwrap();
        let minutes: Vec<i64> = latest
            .iter()
            .map(|r| (r.integer("seq").unwrap() * 7) % 10)
            .collect();
        assert_eq!(minutes, vec![9, 8, 7]);

        let even = store
            .select(
                "event",
                &SelectQuery::new()
                    .filter("flag", true)
                    .order_by("seq", Direction::Asc),
            )
            .await
            .unwrap();
        let seqs: Vec<i64> = even.iter().map(|r| r.integer("seq").unwrap()).collect();
        assert_eq!(seqs, vec![0, 2, 4, 6, 8]);

        let more_than_exist = store
            .select("event", &SelectQuery::new().limit(50))
            .await
            .unwrap();
        assert_eq!(more_than_exist.len(), 10);
    }

    #[tokio::test]
    async fn test_select_rejects_unknown_columns() {
        let dir = tempfile::tempdir().unwrap();
        let store = ready_store(&dir).await;

        assert!(matches!(
            store
                .select("event", &SelectQuery::new().order_by("nope", Direction::Asc))
                .await,
            Err(StoreError::Schema(_))
        ));
        assert!(matches!(
            store.select("event", &SelectQuery::new().filter("nope", 1i64)).await,
            Err(StoreError::Schema(_))
        ));
    }

    #[test]
    fn test_upsert_sql() {
        let schema = schema();
        let sql = insert_sql(schema.table("option").unwrap(), InsertOptions::upsert());
        assert_eq!(
            sql,
            r#"INSERT INTO "option" ("key", "option") VALUES (?, ?) ON CONFLICT ("key") DO UPDATE SET "option" = excluded."option""#
        );
    }
}
