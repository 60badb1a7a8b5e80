// ABOUTME: Generic repository implemented once over any described record type
// ABOUTME: CRUD, unique lookups, conflict-free inserts and advanced search on a borrowed connection

use std::marker::PhantomData;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::record::{Columns, Record, RecordSpec, Value};
use crate::search::{AdvancedSearchRequest, AdvancedSearchResponse};

/// Data access for one record type
///
/// Every method borrows a connection, so the same calls work on a pooled
/// connection and inside a transaction or savepoint.
pub struct Repository<R: Record> {
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Default for Repository<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<R: Record> Repository<R> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }

    pub fn spec(&self) -> &'static RecordSpec {
        R::spec()
    }

    /// Insert a record and return it as stored
    pub async fn create<C: Columns>(&self, conn: &mut SqliteConnection, input: &C) -> StorageResult<R> {
        let spec = R::spec();
        let mut builder = insert_statement(spec, input.columns())?;
        builder.push(" RETURNING *");

        let record = builder
            .build_query_as::<R>()
            .fetch_one(&mut *conn)
            .await
            .map_err(StorageError::classify)?;

        debug!("Created record in {}", spec.table);
        Ok(record)
    }

    /// Insert unless a row with the same `unique_field` value exists, then load that row
    ///
    /// Returns the stored record and whether this call inserted it.
    pub async fn create_or_get<C: Columns>(
        &self,
        conn: &mut SqliteConnection,
        input: &C,
        unique_field: &str,
    ) -> StorageResult<(R, bool)> {
        let spec = R::spec();
        let field = require_unique(spec, unique_field)?;

        let columns = input.columns();
        let lookup = columns
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| {
                StorageError::InvalidArgument(format!("No value supplied for {}.{}", spec.table, field))
            })?;

        let mut builder = insert_statement(spec, columns)?;
        builder.push(format!(" ON CONFLICT({}) DO NOTHING", field));

        let inserted = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(StorageError::classify)?
            .rows_affected()
            > 0;

        let record = self
            .find_by_unique_field(&mut *conn, field, lookup.clone())
            .await?
            .ok_or_else(|| {
                StorageError::NotFound(format!("{} with {} '{}' not found", spec.table, field, lookup))
            })?;

        Ok((record, inserted))
    }

    pub async fn get(&self, conn: &mut SqliteConnection, key: &R::Key) -> StorageResult<Option<R>> {
        let spec = R::spec();
        let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {}", spec.table));
        push_key_filter(&mut builder, spec, R::key_values(key));

        builder
            .build_query_as::<R>()
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)
    }

    /// Replace every writable column of the row with `key`
    pub async fn update<C: Columns>(
        &self,
        conn: &mut SqliteConnection,
        key: &R::Key,
        input: &C,
    ) -> StorageResult<Option<R>> {
        let spec = R::spec();
        let mut builder = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", spec.table));

        for (i, (column, value)) in input.columns().into_iter().enumerate() {
            spec.require_field(column)?;
            if i > 0 {
                builder.push(", ");
            }
            builder.push(column).push(" = ");
            value.push_bind(&mut builder);
        }

        push_key_filter(&mut builder, spec, R::key_values(key));
        builder.push(" RETURNING *");

        let record = builder
            .build_query_as::<R>()
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::classify)?;

        if record.is_some() {
            debug!("Updated record in {}", spec.table);
        }
        Ok(record)
    }

    /// Delete the row with `key`, returning the number of rows removed
    pub async fn delete_by_id(&self, conn: &mut SqliteConnection, key: &R::Key) -> StorageResult<u64> {
        let spec = R::spec();
        let mut builder = QueryBuilder::<Sqlite>::new(format!("DELETE FROM {}", spec.table));
        push_key_filter(&mut builder, spec, R::key_values(key));

        let deleted = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(StorageError::classify)?
            .rows_affected();

        debug!("Deleted {} record(s) from {}", deleted, spec.table);
        Ok(deleted)
    }

    /// Delete every row whose `field` equals `value`
    pub async fn delete_where(
        &self,
        conn: &mut SqliteConnection,
        field: &str,
        value: impl Into<Value>,
    ) -> StorageResult<u64> {
        let spec = R::spec();
        let field = spec.require_field(field)?.name;

        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("DELETE FROM {} WHERE {} = ", spec.table, field));
        value.into().push_bind(&mut builder);

        let deleted = builder
            .build()
            .execute(&mut *conn)
            .await
            .map_err(StorageError::classify)?
            .rows_affected();

        debug!("Deleted {} record(s) from {} by {}", deleted, spec.table, field);
        Ok(deleted)
    }

    /// Look a record up by a field declared unique
    pub async fn find_by_unique_field(
        &self,
        conn: &mut SqliteConnection,
        field: &str,
        value: impl Into<Value>,
    ) -> StorageResult<Option<R>> {
        let spec = R::spec();
        let field = require_unique(spec, field)?;
        let value = value.into();

        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {} WHERE {} = ", spec.table, field));
        value.clone().push_bind(&mut builder);
        builder.push(" LIMIT 2");

        let mut rows = builder
            .build_query_as::<R>()
            .fetch_all(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        if rows.len() > 1 {
            return Err(StorageError::Multiplicity(format!(
                "Multiple records found in {} for {} '{}'",
                spec.table, field, value
            )));
        }
        Ok(rows.pop())
    }

    /// Filter, sort and paginate in one query, plus a total count of matches
    pub async fn advanced_search(
        &self,
        conn: &mut SqliteConnection,
        request: &AdvancedSearchRequest,
    ) -> StorageResult<AdvancedSearchResponse<R>> {
        let spec = R::spec();
        request.validate(spec)?;
        let (limit, offset) = request.page()?;

        let mut count_query = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", spec.table));
        request.push_where(&mut count_query);
        let count_total: i64 = count_query
            .build_query_scalar::<i64>()
            .fetch_one(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {}", spec.table));
        request.push_where(&mut query);
        request.push_order_by(&mut query);
        query.push(" LIMIT ").push_bind(limit);
        query.push(" OFFSET ").push_bind(offset);

        let results = query
            .build_query_as::<R>()
            .fetch_all(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        debug!(
            "Advanced search on {} returned {} of {} record(s)",
            spec.table,
            results.len(),
            count_total
        );

        Ok(AdvancedSearchResponse {
            count: results.len() as i64,
            results,
            offset,
            count_total,
        })
    }
}

fn require_unique<'a>(spec: &'a RecordSpec, field: &str) -> StorageResult<&'a str> {
    let field = spec.require_field(field)?;
    if !field.unique {
        return Err(StorageError::InvalidArgument(format!(
            "Field {}.{} is not unique",
            spec.table, field.name
        )));
    }
    Ok(field.name)
}

fn insert_statement(
    spec: &RecordSpec,
    columns: Vec<(&'static str, Value)>,
) -> StorageResult<QueryBuilder<'static, Sqlite>> {
    for (column, _) in &columns {
        spec.require_field(column)?;
    }

    let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        spec.table,
        names.join(", ")
    ));
    for (i, (_, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        value.push_bind(&mut builder);
    }
    builder.push(")");
    Ok(builder)
}

fn push_key_filter(builder: &mut QueryBuilder<'_, Sqlite>, spec: &RecordSpec, values: Vec<Value>) {
    for (i, (column, value)) in spec.key.iter().zip(values).enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(column).push(" = ");
        value.push_bind(builder);
    }
}
