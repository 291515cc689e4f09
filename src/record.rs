use crate::{
    Database, Error, Operator, Row, Status, TableSchema, build_delete, build_insert,
    build_insert_default, build_update,
};
use indexmap::IndexMap;
use plinth_core::{Connection, Result, Value};
use std::sync::Arc;

/// Field used by the finders when the table has no primary key.
const DEFAULT_KEY: &str = "id";

/// One row of a table, read and written through the table's schema.
///
/// Field names are case-insensitive, they are lower-cased on every access. A record is
/// new when its primary key is empty or zero (or the table has none): [`Record::post`]
/// inserts it, otherwise it updates the row it was read from.
pub struct Record<C: Connection> {
    database: Arc<Database<C>>,
    schema: TableSchema,
    fields: Row,
}

impl<C: Connection> Record<C> {
    /// Empty record with every column set to null.
    pub async fn new(database: Arc<Database<C>>, table: &str) -> Result<Self> {
        let schema = database.table_schema(table).await?;
        let fields = schema
            .columns
            .keys()
            .map(|k| (k.clone(), Value::Null))
            .collect();
        Ok(Self {
            database,
            schema,
            fields,
        })
    }

    /// Record holding `row`, its keys are lower-cased and kept even when they are not columns.
    pub async fn from_row(database: Arc<Database<C>>, table: &str, row: Row) -> Result<Self> {
        let schema = database.table_schema(table).await?;
        Ok(Self::with_schema(database, schema, row))
    }

    fn with_schema(database: Arc<Database<C>>, schema: TableSchema, row: Row) -> Self {
        Self {
            database,
            schema,
            fields: row
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect(),
        }
    }

    pub fn table(&self) -> &str {
        &self.schema.table
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn database(&self) -> &Arc<Database<C>> {
        &self.database
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.schema.primary_key.as_deref()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(&field.to_lowercase())
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(field.to_lowercase(), value.into());
        self
    }

    /// Whether `field` is present and not null.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.is_null())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.shift_remove(&field.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> Fields<'_> {
        Fields(self.fields.iter())
    }

    pub fn to_row(&self) -> Row {
        self.fields.clone()
    }

    pub fn into_row(self) -> Row {
        self.fields
    }

    /// True when persisting this record creates a row.
    pub fn is_new(&self) -> bool {
        match self.primary_key() {
            Some(pk) => self.fields.get(pk).is_none_or(Value::is_empty_key),
            None => true,
        }
    }

    /// Drop the fields that are not columns, and the blank strings set on numeric columns.
    pub fn strip_inexistent_fields(&mut self) {
        let schema = &self.schema;
        self.fields.retain(|k, v| match schema.column_type(k) {
            None => false,
            Some(t) if t.is_numeric() => !v.as_str().is_some_and(|v| v.trim().is_empty()),
            Some(..) => true,
        });
    }

    /// Insert when new, update otherwise.
    pub async fn post(&mut self) -> Status {
        if self.is_new() {
            self.insert().await
        } else {
            self.update().await
        }
    }

    /// Insert the record, the generated primary key is stored back into it.
    ///
    /// Null fields are left out of the statement, so a column holding an explicit null
    /// receives its `DEFAULT` instead. With no field left `DEFAULT VALUES` is inserted.
    pub async fn insert(&mut self) -> Status {
        let result = self.try_insert().await;
        if let Err(e) = &result {
            log::error!("{:#}", e);
        }
        result.into()
    }

    async fn try_insert(&mut self) -> Result<()> {
        self.strip_inexistent_fields();
        let generated = match self.schema.primary_key.clone() {
            Some(pk) if self.fields.get(&pk).is_none_or(Value::is_empty_key) => {
                self.fields.shift_remove(&pk);
                Some(pk)
            }
            _ => None,
        };
        let row: Row = self
            .fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let writer = self.database.writer();
        let statement = if row.is_empty() {
            build_insert_default(writer, self.table())
        } else {
            build_insert(writer, self.table(), [&row])?
        };
        match generated {
            Some(pk) => {
                let id = self.database.run_insert(&statement).await?;
                self.fields.insert(pk, id);
            }
            None => {
                self.database.execute(&statement).await?;
            }
        }
        Ok(())
    }

    /// Write every field to the row identified by the current primary key.
    pub async fn update(&mut self) -> Status {
        let result = self.try_update().await;
        if let Err(e) = &result {
            log::error!("{:#}", e);
        }
        result.into()
    }

    async fn try_update(&mut self) -> Result<()> {
        self.strip_inexistent_fields();
        let pk = self.require_primary_key()?;
        let key_value = self.fields.get(pk).cloned().unwrap_or_default();
        let statement = build_update(
            self.database.writer(),
            self.table(),
            &self.fields,
            pk,
            key_value,
        )?;
        self.database.execute(&statement).await?;
        Ok(())
    }

    /// Delete the row identified by the current primary key.
    pub async fn delete(&mut self) -> Status {
        let result = self.try_delete().await;
        if let Err(e) = &result {
            log::error!("{:#}", e);
        }
        result.into()
    }

    async fn try_delete(&mut self) -> Result<()> {
        self.strip_inexistent_fields();
        let pk = self.require_primary_key()?;
        let key_value = self.fields.get(pk).cloned().unwrap_or_default();
        let statement = build_delete(self.database.writer(), self.table(), pk, key_value);
        self.database.execute(&statement).await?;
        Ok(())
    }

    fn require_primary_key(&self) -> Result<&str> {
        self.primary_key().ok_or_else(|| {
            Error::InvalidDataset(format!("table `{}` has no primary key", self.table())).into()
        })
    }

    /// First row whose `field` (`id` by default) equals `id`.
    pub async fn fetch(
        database: &Arc<Database<C>>,
        table: &str,
        id: impl Into<Value>,
        field: Option<&str>,
    ) -> Option<Self> {
        let schema = match database.table_schema(table).await {
            Ok(v) => v,
            Err(e) => {
                log::warn!("{:#}", e);
                return None;
            }
        };
        let field = key_field(field);
        let rows = database
            .fetch_table_data(table, &field, [id], Operator::Eq, None, false, 1, &[])
            .await;
        rows.into_iter()
            .next()
            .map(|row| Self::with_schema(database.clone(), schema, row))
    }

    /// Every row whose `field` (`id` by default) equals one of `ids`, ordered
    /// by that field.
    pub async fn fetch_list<V: Into<Value>>(
        database: &Arc<Database<C>>,
        table: &str,
        ids: impl IntoIterator<Item = V>,
        field: Option<&str>,
    ) -> Vec<Self> {
        let ids: Vec<Value> = ids
            .into_iter()
            .map(Into::into)
            .filter(|v| !v.is_null())
            .collect();
        if ids.is_empty() {
            return Vec::new();
        }
        let schema = match database.table_schema(table).await {
            Ok(v) => v,
            Err(e) => {
                log::warn!("{:#}", e);
                return Vec::new();
            }
        };
        let field = key_field(field);
        database
            .fetch_table_data(table, &field, ids, Operator::Eq, Some(field.as_str()), false, 0, &[])
            .await
            .into_iter()
            .map(|row| Self::with_schema(database.clone(), schema.clone(), row))
            .collect()
    }

    /// Index records by the text of `field`, later records win on duplicates.
    pub fn index_by(
        records: impl IntoIterator<Item = Self>,
        field: &str,
    ) -> IndexMap<String, Self> {
        records
            .into_iter()
            .filter_map(|record| {
                let key = record.get(field)?.to_string();
                Some((key, record))
            })
            .collect()
    }
}

fn key_field(field: Option<&str>) -> String {
    field
        .map(str::to_lowercase)
        .unwrap_or_else(|| DEFAULT_KEY.into())
}

/// Iterator over the fields of a [`Record`], in insertion order.
pub struct Fields<'a>(indexmap::map::Iter<'a, String, Value>);

impl<'a> Iterator for Fields<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, v)| (k.as_str(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<'a, C: Connection> IntoIterator for &'a Record<C> {
    type Item = (&'a str, &'a Value);
    type IntoIter = Fields<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
