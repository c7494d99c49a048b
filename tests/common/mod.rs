//! In-memory query runner for tests. Statements are interpreted by name against the catalog,
//! so repository and HTTP behavior can be checked without a database.

#![allow(dead_code)]

use async_trait::async_trait;
use barrest_crud::error::StoreError;
use barrest_crud::schema::{Catalog, Dependent, EntitySchema};
use barrest_crud::service::{GuardedDelete, NamedQuery, QueryRunner};
use barrest_crud::sql::BindValue;
use barrest_crud::{AppState, QueryStore, Repository};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

enum Op {
    List,
    Count,
    Get,
    Create,
    Update,
    Delete,
    Check(&'static Dependent),
}

struct Stored {
    seq: i64,
    row: Map<String, Value>,
}

#[derive(Default)]
pub struct MemoryRunner {
    tables: Mutex<HashMap<&'static str, Vec<Stored>>>,
    seq: AtomicI64,
    reject_next_write: Mutex<Option<String>>,
    reject_next_delete: Mutex<Option<String>>,
    unavailable: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MemoryRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next create or update fails as a constraint violation.
    pub fn reject_next_write(&self, detail: &str) {
        *self.reject_next_write.lock().unwrap() = Some(detail.to_string());
    }

    /// The next delete statement fails as a foreign key violation, after its checks pass.
    pub fn reject_next_delete(&self, detail: &str) {
        *self.reject_next_delete.lock().unwrap() = Some(detail.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().unwrap().get(table).map_or(0, Vec::len)
    }

    /// Names of every statement run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn resolve(&self, name: &str) -> Option<(&'static EntitySchema, Op)> {
        let catalog = Catalog::builtin().ok()?;
        for entity in catalog.entities() {
            let q = &entity.queries;
            let op = match name {
                n if n == q.list => Op::List,
                n if n == q.count => Op::Count,
                n if n == q.get => Op::Get,
                n if n == q.create => Op::Create,
                n if n == q.update => Op::Update,
                n if n == q.delete => Op::Delete,
                n => match entity.dependents.iter().find(|d| d.query == n) {
                    Some(d) => Op::Check(d),
                    None => continue,
                },
            };
            return Some((*entity, op));
        }
        None
    }

    fn run(&self, name: &str, params: &[BindValue]) -> Result<Vec<Value>, StoreError> {
        self.calls.lock().unwrap().push(name.to_string());
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
        }
        let (entity, op) = self
            .resolve(name)
            .ok_or_else(|| StoreError::Db(sqlx::Error::Protocol(format!("unknown statement {}", name))))?;
        let mut tables = self.tables.lock().unwrap();
        match op {
            Op::Count => {
                let rows = tables.get(entity.name).map(|r| filtered(entity, r, params)).unwrap_or_default();
                Ok(vec![json!(rows.len())])
            }
            Op::List => {
                let (limit, offset) = match &params[params.len() - 2..] {
                    [BindValue::Integer(l), BindValue::Integer(o)] => (*l as usize, *o as usize),
                    other => panic!("list expects limit and offset, got {:?}", other),
                };
                let rows = tables.get(entity.name).map(|r| filtered(entity, r, params)).unwrap_or_default();
                Ok(rows.into_iter().skip(offset).take(limit).collect())
            }
            Op::Get => {
                let id = params[0].to_json();
                Ok(tables
                    .get(entity.name)
                    .and_then(|rows| rows.iter().find(|s| s.row.get(entity.id_column) == Some(&id)))
                    .map(|s| Value::Object(s.row.clone()))
                    .into_iter()
                    .collect())
            }
            Op::Create => {
                if let Some(detail) = self.reject_next_write.lock().unwrap().take() {
                    return Err(StoreError::Constraint(detail));
                }
                let now = chrono::Utc::now().to_rfc3339();
                let mut row = Map::new();
                row.insert(entity.id_column.to_string(), json!(uuid::Uuid::new_v4().to_string()));
                for (field, value) in entity.fields.iter().zip(params) {
                    row.insert(field.name.to_string(), value.to_json());
                }
                row.insert("created_at".into(), json!(now));
                row.insert("updated_at".into(), json!(now));
                let seq = self.seq.fetch_add(1, Ordering::SeqCst);
                tables.entry(entity.name).or_default().push(Stored { seq, row: row.clone() });
                Ok(vec![Value::Object(row)])
            }
            Op::Update => {
                if let Some(detail) = self.reject_next_write.lock().unwrap().take() {
                    return Err(StoreError::Constraint(detail));
                }
                let id = params[0].to_json();
                let Some(stored) = tables
                    .get_mut(entity.name)
                    .and_then(|rows| rows.iter_mut().find(|s| s.row.get(entity.id_column) == Some(&id)))
                else {
                    return Ok(Vec::new());
                };
                for (field, value) in entity.updatable_fields().zip(&params[1..]) {
                    if !value.is_null() {
                        stored.row.insert(field.name.to_string(), value.to_json());
                    }
                }
                stored.row.insert("updated_at".into(), json!(chrono::Utc::now().to_rfc3339()));
                Ok(vec![Value::Object(stored.row.clone())])
            }
            Op::Delete => {
                if let Some(detail) = self.reject_next_delete.lock().unwrap().take() {
                    return Err(StoreError::Constraint(detail));
                }
                let id = params[0].to_json();
                let rows = tables.entry(entity.name).or_default();
                let before = rows.len();
                rows.retain(|s| s.row.get(entity.id_column) != Some(&id));
                Ok(vec![json!(before - rows.len())])
            }
            Op::Check(dependent) => {
                let id = params[0].to_json();
                let n = tables
                    .get(dependent.table)
                    .map_or(0, |rows| rows.iter().filter(|s| s.row.get(dependent.column) == Some(&id)).count());
                Ok(vec![json!(n)])
            }
        }
    }
}

/// Rows matching the parent filter (when the entity has one), newest first.
fn filtered(entity: &EntitySchema, rows: &[Stored], params: &[BindValue]) -> Vec<Value> {
    let parent = entity.parent.zip(params.first()).filter(|(_, v)| !v.is_null());
    let mut matching: Vec<&Stored> = rows
        .iter()
        .filter(|s| match &parent {
            Some((p, v)) => s.row.get(p.column) == Some(&v.to_json()),
            None => true,
        })
        .collect();
    matching.sort_by(|a, b| b.seq.cmp(&a.seq));
    matching.into_iter().map(|s| Value::Object(s.row.clone())).collect()
}

#[async_trait]
impl QueryRunner for MemoryRunner {
    async fn fetch_optional(&self, query: NamedQuery<'_>, params: &[BindValue]) -> Result<Option<Value>, StoreError> {
        Ok(self.run(query.name, params)?.into_iter().next())
    }

    async fn fetch_all(&self, query: NamedQuery<'_>, params: &[BindValue]) -> Result<Vec<Value>, StoreError> {
        self.run(query.name, params)
    }

    async fn fetch_count(&self, query: NamedQuery<'_>, params: &[BindValue]) -> Result<i64, StoreError> {
        let rows = self.run(query.name, params)?;
        Ok(rows.first().and_then(Value::as_i64).unwrap_or(0))
    }

    async fn delete_guarded(
        &self,
        checks: &[NamedQuery<'_>],
        delete: NamedQuery<'_>,
        id: &BindValue,
    ) -> Result<GuardedDelete, StoreError> {
        let mut counts = Vec::with_capacity(checks.len());
        for check in checks {
            counts.push(self.fetch_count(*check, std::slice::from_ref(id)).await?);
        }
        if counts.iter().any(|n| *n > 0) {
            return Ok(GuardedDelete::Refused(counts));
        }
        let removed = self.fetch_count(delete, std::slice::from_ref(id)).await?;
        Ok(GuardedDelete::Deleted(removed as u64))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

pub fn repository() -> (Repository, Arc<MemoryRunner>) {
    let runner = Arc::new(MemoryRunner::new());
    let queries = QueryStore::embedded().unwrap();
    (Repository::new(runner.clone(), Arc::new(queries)), runner)
}

pub fn state() -> (AppState, Arc<MemoryRunner>) {
    let (repository, runner) = repository();
    (AppState::new(repository, Catalog::builtin().unwrap()), runner)
}

pub fn obj(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap()
}
