//! Shared fixtures for guarded builder tests.
//!
//! - An in-memory builder family that records every call reaching "storage"
//! - Metadata and permission matrix helpers

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tessera_core::{
    MetadataDefinition, ObjectMetadataMaps, ObjectPermissions, ObjectRecord,
    ObjectRecordsPermissions,
};
use tessera_orm::prelude::*;
use tessera_policy::{FieldRef, OrderBy, QueryOperation, QueryShape};

// =============================================================================
// FIXTURES
// =============================================================================

pub fn metadata() -> ObjectMetadataMaps {
    MetadataDefinition::from_yaml(
        r#"
objects:
  - name: company
    fields:
      - name: id
      - name: name
      - name: annualRevenue
  - name: person
    table: people
    fields:
      - name: id
      - name: name
      - name: companyId
    relations:
      - name: company
        target_object: company
        join_field: companyId
"#,
    )
    .unwrap()
    .build()
    .unwrap()
}

pub fn matrix(
    maps: &ObjectMetadataMaps,
    entries: Vec<(&str, ObjectPermissions)>,
) -> ObjectRecordsPermissions {
    entries
        .into_iter()
        .map(|(name, perms)| (maps.id_by_name(name).unwrap(), perms))
        .collect()
}

/// A context enforcing `entries`.
pub fn context(entries: Vec<(&str, ObjectPermissions)>) -> GuardContext {
    let maps = metadata();
    let perms = matrix(&maps, entries);
    GuardContext::new(Arc::new(perms), Arc::new(InternalContext::new(maps)))
}

/// A bypassing context over an empty matrix.
pub fn system_context() -> GuardContext {
    GuardContext::system(
        Arc::new(ObjectRecordsPermissions::new()),
        Arc::new(InternalContext::new(metadata())),
        "test",
    )
}

pub fn record(value: serde_json::Value) -> ObjectRecord {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

// =============================================================================
// IN-MEMORY BUILDER FAMILY
// =============================================================================

/// What reached the fake storage.
#[derive(Debug, Clone, Default)]
pub struct FakeStore {
    calls: Arc<AtomicUsize>,
    executed: Arc<Mutex<Vec<QueryShape>>>,
    rows: Arc<Vec<ObjectRecord>>,
    failure: Option<String>,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<ObjectRecord>) -> Self {
        Self {
            rows: Arc::new(rows),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn executed_operations(&self) -> Vec<QueryOperation> {
        self.executed.lock().unwrap().iter().map(|s| s.operation).collect()
    }

    pub fn last_executed(&self) -> Option<QueryShape> {
        self.executed.lock().unwrap().last().cloned()
    }

    pub fn select(&self, object: &str, alias: &str) -> FakeSelect {
        FakeSelect {
            shape: QueryShape::select_from(object, alias),
            store: self.clone(),
        }
    }

    fn hit(&self, shape: &QueryShape) -> Result<Vec<ObjectRecord>, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.executed.lock().unwrap().push(shape.clone());
        match &self.failure {
            Some(message) => Err(anyhow::anyhow!("{message}").into()),
            None => Ok(self.rows.as_ref().clone()),
        }
    }
}

fn or_where(mut shape: QueryShape, condition: Condition) -> QueryShape {
    let previous = std::mem::take(&mut shape.conditions);
    shape.conditions = if previous.is_empty() {
        vec![condition]
    } else {
        vec![Condition::Or(vec![Condition::And(previous), condition])]
    };
    shape
}

#[derive(Debug, Clone)]
pub struct FakeSelect {
    pub shape: QueryShape,
    store: FakeStore,
}

impl FakeSelect {
    fn edit(mut self, f: impl FnOnce(&mut QueryShape)) -> Self {
        f(&mut self.shape);
        self
    }

    fn into_write(self, operation: QueryOperation) -> FakeWrite {
        FakeWrite {
            shape: self.shape.with_operation(operation),
            store: self.store,
        }
    }
}

impl QueryBuilder for FakeSelect {
    fn shape(&self) -> &QueryShape {
        &self.shape
    }
}

#[async_trait]
impl SelectQueryBuilder for FakeSelect {
    type Insert = FakeWrite;
    type Update = FakeWrite;
    type Delete = FakeWrite;
    type SoftDelete = FakeWrite;

    fn select(self, selection: Vec<Selection>) -> Self {
        self.edit(|s| s.selects = selection)
    }

    fn add_select(self, selection: Selection) -> Self {
        self.edit(|s| s.selects.push(selection))
    }

    fn join(self, join: Join) -> Self {
        self.edit(|s| s.joins.push(join))
    }

    fn and_where(self, condition: Condition) -> Self {
        self.edit(|s| s.conditions.push(condition))
    }

    fn or_where(mut self, condition: Condition) -> Self {
        self.shape = or_where(self.shape, condition);
        self
    }

    fn order_by(self, field: &str, order: Order) -> Self {
        let field = FieldRef::from(field);
        self.edit(|s| s.order_by.push(OrderBy { field, order }))
    }

    fn take(self, limit: u64) -> Self {
        self.edit(|s| s.take = Some(limit))
    }

    fn skip(self, offset: u64) -> Self {
        self.edit(|s| s.skip = Some(offset))
    }

    fn with_deleted(self) -> Self {
        self.edit(|s| s.with_deleted = true)
    }

    async fn execute(&self) -> Result<Vec<ObjectRecord>, QueryError> {
        self.store.hit(&self.shape)
    }

    async fn get_one(&self) -> Result<Option<ObjectRecord>, QueryError> {
        Ok(self.store.hit(&self.shape)?.into_iter().next())
    }

    async fn get_one_or_fail(&self) -> Result<ObjectRecord, QueryError> {
        self.get_one().await?.ok_or_else(|| QueryError::EntityNotFound {
            object: self.shape.main.as_ref().map(|m| m.object.clone()).unwrap_or_default(),
        })
    }

    async fn get_many(&self) -> Result<Vec<ObjectRecord>, QueryError> {
        self.store.hit(&self.shape)
    }

    async fn get_many_and_count(&self) -> Result<(Vec<ObjectRecord>, u64), QueryError> {
        let rows = self.store.hit(&self.shape)?;
        let count = rows.len() as u64;
        Ok((rows, count))
    }

    async fn get_raw_one(&self) -> Result<Option<ObjectRecord>, QueryError> {
        self.get_one().await
    }

    async fn get_raw_many(&self) -> Result<Vec<ObjectRecord>, QueryError> {
        self.store.hit(&self.shape)
    }

    async fn get_count(&self) -> Result<u64, QueryError> {
        Ok(self.store.hit(&self.shape)?.len() as u64)
    }

    async fn get_exists(&self) -> Result<bool, QueryError> {
        Ok(!self.store.hit(&self.shape)?.is_empty())
    }

    async fn execute_exists_query(&self) -> Result<bool, QueryError> {
        self.get_exists().await
    }

    fn insert(self) -> FakeWrite {
        self.into_write(QueryOperation::Insert)
    }

    fn update(self) -> FakeWrite {
        self.into_write(QueryOperation::Update)
    }

    fn update_set(self, values: ObjectRecord) -> FakeWrite {
        let mut write = self.into_write(QueryOperation::Update);
        write.shape.values = vec![values];
        write
    }

    fn delete(self) -> FakeWrite {
        self.into_write(QueryOperation::Delete)
    }

    fn soft_delete(self) -> FakeWrite {
        self.into_write(QueryOperation::SoftDelete)
    }

    fn restore(self) -> FakeWrite {
        self.into_write(QueryOperation::Restore)
    }
}

/// One type plays every write variant; the shape's operation tells them apart.
#[derive(Debug, Clone)]
pub struct FakeWrite {
    pub shape: QueryShape,
    store: FakeStore,
}

impl FakeWrite {
    fn edit(mut self, f: impl FnOnce(&mut QueryShape)) -> Self {
        f(&mut self.shape);
        self
    }

    fn run(&self) -> Result<WriteResult, QueryError> {
        let rows = self.store.hit(&self.shape)?;
        Ok(WriteResult {
            affected: Some(rows.len() as u64),
            records: if self.shape.returning.is_empty() { Vec::new() } else { rows },
        })
    }
}

impl QueryBuilder for FakeWrite {
    fn shape(&self) -> &QueryShape {
        &self.shape
    }
}

macro_rules! fake_filtered_write {
    ($trait:ident) => {
        #[async_trait]
        impl $trait for FakeWrite {
            fn and_where(self, condition: Condition) -> Self {
                self.edit(|s| s.conditions.push(condition))
            }

            fn or_where(mut self, condition: Condition) -> Self {
                self.shape = or_where(self.shape, condition);
                self
            }

            fn returning(self, fields: Vec<String>) -> Self {
                self.edit(|s| s.returning = fields)
            }

            async fn execute(&self) -> Result<WriteResult, QueryError> {
                self.run()
            }
        }
    };
}

fake_filtered_write!(DeleteQueryBuilder);
fake_filtered_write!(SoftDeleteQueryBuilder);

#[async_trait]
impl UpdateQueryBuilder for FakeWrite {
    fn set(self, values: ObjectRecord) -> Self {
        self.edit(|s| s.values = vec![values])
    }

    fn and_where(self, condition: Condition) -> Self {
        self.edit(|s| s.conditions.push(condition))
    }

    fn or_where(mut self, condition: Condition) -> Self {
        self.shape = or_where(self.shape, condition);
        self
    }

    fn returning(self, fields: Vec<String>) -> Self {
        self.edit(|s| s.returning = fields)
    }

    async fn execute(&self) -> Result<WriteResult, QueryError> {
        self.run()
    }
}

#[async_trait]
impl InsertQueryBuilder for FakeWrite {
    fn values(self, rows: Vec<ObjectRecord>) -> Self {
        self.edit(|s| s.values = rows)
    }

    fn returning(self, fields: Vec<String>) -> Self {
        self.edit(|s| s.returning = fields)
    }

    async fn execute(&self) -> Result<WriteResult, QueryError> {
        self.run()
    }
}

pub fn acme() -> ObjectRecord {
    record(json!({ "id": 1, "name": "Acme" }))
}
