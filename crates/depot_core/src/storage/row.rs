//! SQLite row store: one table per entity type, one row per record.
//!
//! # Responsibility
//! - Map entities to rows through their serde field names.
//! - Apply single-row insert/update/delete for each repository change.
//! - Push grouped report totals down to `JOIN ... GROUP BY` SQL.
//!
//! # Invariants
//! - Connections must be migrated to `latest_version()` before use.
//! - Ids come from `INTEGER PRIMARY KEY AUTOINCREMENT` and are never reused.
//! - Uniqueness-key columns are `UNIQUE`; violations surface as
//!   `StorageError::UniqueViolation`.

use super::{
    Change, GroupQuery, IdAssignment, Measure, StorageBackend, StorageError, StorageResult,
};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::{Entity, EntityId};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use serde_json::{Map, Value as JsonValue};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

/// Connection shared by every row store of one depot.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Wraps a migrated connection for sharing across row stores.
pub fn share_connection(conn: Connection) -> SharedConnection {
    Arc::new(Mutex::new(conn))
}

/// Row-per-record SQLite backend for one entity type.
pub struct RowStore<T> {
    conn: SharedConnection,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> RowStore<T> {
    /// Creates a row store after checking schema version, table, and columns.
    pub fn try_new(conn: SharedConnection) -> StorageResult<Self> {
        {
            let guard = lock(&conn)?;
            ensure_row_connection_ready::<T>(&guard)?;
        }

        let table = T::KIND.table();
        let columns = T::FIELDS.join(", ");
        let placeholders = (1..=T::FIELDS.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = T::FIELDS
            .iter()
            .enumerate()
            .map(|(index, field)| format!("{field} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            conn,
            select_sql: format!("SELECT id, {columns} FROM {table} ORDER BY id ASC;"),
            insert_sql: format!("INSERT INTO {table} ({columns}) VALUES ({placeholders});"),
            update_sql: format!(
                "UPDATE {table} SET {assignments} WHERE id = ?{};",
                T::FIELDS.len() + 1
            ),
            delete_sql: format!("DELETE FROM {table} WHERE id = ?1;"),
            _marker: PhantomData,
        })
    }
}

impl<T: Entity> StorageBackend<T> for RowStore<T> {
    fn name(&self) -> &'static str {
        "row"
    }

    fn id_assignment(&self) -> IdAssignment {
        IdAssignment::Generated
    }

    fn read_all(&self) -> StorageResult<Vec<T>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&self.select_sql)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_entity_row(row)?);
        }
        Ok(records)
    }

    fn write_all(&self, _collection: &[T], change: Change<'_, T>) -> StorageResult<EntityId> {
        let conn = lock(&self.conn)?;
        match change {
            Change::Insert(record) => {
                let values = entity_values(record)?;
                conn.execute(&self.insert_sql, params_from_iter(values))
                    .map_err(write_error::<T>)?;
                Ok(conn.last_insert_rowid())
            }
            Change::Update(record) => {
                let mut values = entity_values(record)?;
                values.push(Value::Integer(record.id()));
                let changed = conn
                    .execute(&self.update_sql, params_from_iter(values))
                    .map_err(write_error::<T>)?;
                if changed == 0 {
                    return Err(StorageError::MissingRow {
                        kind: T::KIND,
                        id: record.id(),
                    });
                }
                Ok(record.id())
            }
            Change::Delete(id) => {
                let changed = conn.execute(&self.delete_sql, [id])?;
                if changed == 0 {
                    return Err(StorageError::MissingRow { kind: T::KIND, id });
                }
                Ok(id)
            }
        }
    }

    fn group_totals(&self, query: &GroupQuery) -> StorageResult<Option<Vec<(EntityId, i64)>>> {
        ensure_known_field::<T>(query.reference)?;
        let aggregate = match query.measure {
            Measure::Count => "COUNT(c.id)".to_string(),
            Measure::Sum(field) => {
                ensure_known_field::<T>(field)?;
                format!("COALESCE(SUM(c.{field}), 0)")
            }
        };

        let reference = query.reference;
        let mut sql = format!(
            "SELECT c.{reference} AS parent_id, {aggregate} AS total
             FROM {child} c
             INNER JOIN {parent} p ON p.id = c.{reference}",
            child = T::KIND.table(),
            parent = query.parent.table(),
        );
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(parent_id) = query.parent_id {
            sql.push_str(&format!(" WHERE c.{reference} = ?1"));
            bind_values.push(Value::Integer(parent_id));
        }
        sql.push_str(&format!(" GROUP BY c.{reference} ORDER BY c.{reference} ASC;"));

        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut totals = Vec::new();
        while let Some(row) = rows.next()? {
            totals.push((row.get("parent_id")?, row.get("total")?));
        }
        Ok(Some(totals))
    }
}

fn lock(conn: &SharedConnection) -> StorageResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| StorageError::Db(DbError::Poisoned))
}

fn write_error<T: Entity>(err: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(code, message) = &err {
        if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return StorageError::UniqueViolation {
                kind: T::KIND,
                detail: message.clone().unwrap_or_else(|| code.to_string()),
            };
        }
    }
    StorageError::from(err)
}

fn ensure_known_field<T: Entity>(field: &str) -> StorageResult<()> {
    if T::FIELDS.iter().any(|known| *known == field) {
        return Ok(());
    }
    Err(StorageError::InvalidData(format!(
        "`{field}` is not a {} field",
        T::KIND
    )))
}

/// Binds entity fields in `T::FIELDS` order.
fn entity_values<T: Entity>(record: &T) -> StorageResult<Vec<Value>> {
    let encoded = serde_json::to_value(record).map_err(|err| {
        StorageError::InvalidData(format!("cannot encode {} row: {err}", T::KIND))
    })?;
    let object = encoded.as_object().ok_or_else(|| {
        StorageError::InvalidData(format!("{} does not encode to an object", T::KIND))
    })?;

    T::FIELDS
        .iter()
        .map(|field| {
            let value = object.get(*field).ok_or_else(|| {
                StorageError::InvalidData(format!("{} is missing field `{field}`", T::KIND))
            })?;
            json_to_sql(field, value)
        })
        .collect()
}

fn json_to_sql(field: &str, value: &JsonValue) -> StorageResult<Value> {
    match value {
        JsonValue::Null => Ok(Value::Null),
        JsonValue::Bool(flag) => Ok(Value::Integer(i64::from(*flag))),
        JsonValue::Number(number) => number
            .as_i64()
            .map(Value::Integer)
            .or_else(|| number.as_f64().map(Value::Real))
            .ok_or_else(|| {
                StorageError::InvalidData(format!("field `{field}` holds unsupported number"))
            }),
        JsonValue::String(text) => Ok(Value::Text(text.clone())),
        JsonValue::Array(_) | JsonValue::Object(_) => Err(StorageError::InvalidData(format!(
            "field `{field}` is not a scalar"
        ))),
    }
}

fn sql_to_json(field: &str, value: Value) -> StorageResult<JsonValue> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Integer(number) => Ok(JsonValue::from(number)),
        Value::Real(number) => serde_json::Number::from_f64(number)
            .map(JsonValue::Number)
            .ok_or_else(|| {
                StorageError::InvalidData(format!("column `{field}` holds non-finite real"))
            }),
        Value::Text(text) => Ok(JsonValue::String(text)),
        Value::Blob(_) => Err(StorageError::InvalidData(format!(
            "column `{field}` holds unexpected blob"
        ))),
    }
}

fn parse_entity_row<T: Entity>(row: &Row<'_>) -> StorageResult<T> {
    let mut object = Map::new();
    object.insert("id".to_string(), JsonValue::from(row.get::<_, i64>("id")?));
    for field in T::FIELDS {
        let value: Value = row.get(*field)?;
        object.insert((*field).to_string(), sql_to_json(field, value)?);
    }

    serde_json::from_value(JsonValue::Object(object))
        .map_err(|err| StorageError::InvalidData(format!("invalid {} row: {err}", T::KIND)))
}

fn ensure_row_connection_ready<T: Entity>(conn: &Connection) -> StorageResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StorageError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table = T::KIND.table();
    if !table_exists(conn, table)? {
        return Err(StorageError::MissingRequiredTable(table));
    }

    for column in std::iter::once("id").chain(T::FIELDS.iter().copied()) {
        if !table_has_column(conn, table, column)? {
            return Err(StorageError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StorageResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StorageResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::{json_to_sql, sql_to_json};
    use rusqlite::types::Value;
    use serde_json::json;

    #[test]
    fn scalar_mapping_keeps_integers_and_reals_apart() {
        assert_eq!(json_to_sql("a", &json!(7)).unwrap(), Value::Integer(7));
        assert_eq!(json_to_sql("a", &json!(7.5)).unwrap(), Value::Real(7.5));
        assert_eq!(
            json_to_sql("a", &json!("x")).unwrap(),
            Value::Text("x".to_string())
        );
        assert!(json_to_sql("a", &json!([1])).is_err());
    }

    #[test]
    fn real_column_maps_back_to_float_json() {
        let value = sql_to_json("width", Value::Real(2.0)).unwrap();
        assert_eq!(value.as_f64(), Some(2.0));
        assert!(sql_to_json("blob", Value::Blob(vec![1])).is_err());
    }
}
