// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::statements::{
    Privilege,
    ViewKind,
};
use std::{
    collections::{
        BTreeMap,
        HashMap,
    },
    sync::{
        Mutex,
        MutexGuard,
        PoisonError,
    },
};

/// A view object as recorded by [`MemoryExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogObject {
    pub kind: ViewKind,
    pub query: String,
    pub owner: Option<String>,
    pub grants: Vec<(Privilege, String)>,
    pub refreshes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CatalogIndex {
    table: String,
    unique: bool,
}

#[derive(Debug, Default)]
struct Catalog {
    objects: BTreeMap<String, CatalogObject>,
    indexes: BTreeMap<String, CatalogIndex>,
    log: Vec<String>,
}

#[derive(Debug, Clone)]
struct Fault {
    fragment: String,
    code: String,
    message: String,
}

/// An executor that applies statements to an in-process model of the
/// PostgreSQL catalog, reporting the same SQLSTATEs the server would for the
/// failures the view manager cares about. Every attempted statement is logged.
#[derive(Debug)]
pub struct MemoryExecutor {
    catalogs: Mutex<HashMap<String, Catalog>>,
    faults: Mutex<Vec<Fault>>,
}

impl Default for MemoryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn relation_error(code: &str, message: String) -> ExecuteError {
    ExecuteError::database(code, message)
}

impl MemoryExecutor {
    /// An executor with only the default connection.
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert(DEFAULT_ALIAS.to_string(), Catalog::default());
        Self {
            catalogs: Mutex::new(catalogs),
            faults: Mutex::new(Vec::new()),
        }
    }

    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        lock(&self.catalogs).entry(alias.into()).or_default();
        self
    }

    /// Fail every statement whose SQL contains `fragment` with the given SQLSTATE.
    pub fn fail_on(&self, fragment: impl Into<String>, code: impl Into<String>, message: impl Into<String>) {
        lock(&self.faults).push(Fault {
            fragment: fragment.into(),
            code: code.into(),
            message: message.into(),
        });
    }

    pub fn clear_faults(&self) {
        lock(&self.faults).clear();
    }

    pub fn object(&self, alias: &str, name: &str) -> Option<CatalogObject> {
        lock(&self.catalogs)
            .get(alias)
            .and_then(|c| c.objects.get(name).cloned())
    }

    pub fn kind(&self, alias: &str, name: &str) -> Option<ViewKind> {
        self.object(alias, name).map(|o| o.kind)
    }

    pub fn has_unique_index(&self, alias: &str, index: &str) -> bool {
        lock(&self.catalogs)
            .get(alias)
            .and_then(|c| c.indexes.get(index))
            .map(|i| i.unique)
            .unwrap_or(false)
    }

    /// Every statement attempted on the connection, in order.
    pub fn statements(&self, alias: &str) -> Vec<String> {
        lock(&self.catalogs)
            .get(alias)
            .map(|c| c.log.clone())
            .unwrap_or_default()
    }

    pub fn clear_statements(&self) {
        for catalog in lock(&self.catalogs).values_mut() {
            catalog.log.clear();
        }
    }

    fn fault_for(&self, sql: &str) -> Option<ExecuteError> {
        lock(&self.faults)
            .iter()
            .find(|f| sql.contains(&f.fragment))
            .map(|f| ExecuteError::database(f.code.clone(), f.message.clone()))
    }
}

impl Catalog {
    fn drop_object(&mut self, name: &str) {
        self.objects.remove(name);
        self.indexes.retain(|_, index| index.table != name);
    }

    fn apply(&mut self, statement: &Statement) -> Result<u64, ExecuteError> {
        match statement {
            Statement::CreateView(s) => {
                let name = s.name.as_str();
                if self.objects.contains_key(name) {
                    return Err(relation_error(
                        DUPLICATE_TABLE,
                        format!("relation \"{}\" already exists", name),
                    ));
                }
                self.objects.insert(
                    name.to_string(),
                    CatalogObject {
                        kind: s.kind,
                        query: s.query.clone(),
                        owner: None,
                        grants: Vec::new(),
                        refreshes: 0,
                    },
                );
            }
            Statement::DropView(s) => {
                let name = s.name.as_str();
                match self.objects.get(name).map(|o| o.kind) {
                    Some(kind) if kind == s.kind => self.drop_object(name),
                    Some(_) => {
                        return Err(relation_error(
                            WRONG_OBJECT_TYPE,
                            format!("\"{}\" is not a {}", name, s.kind.to_string().to_lowercase()),
                        ))
                    }
                    None if s.if_exists => (),
                    None => {
                        return Err(relation_error(
                            UNDEFINED_TABLE,
                            format!("{} \"{}\" does not exist", s.kind.to_string().to_lowercase(), name),
                        ))
                    }
                }
            }
            Statement::RefreshMaterializedView(s) => {
                let name = s.name.as_str();
                let indexed = self.indexes.values().any(|i| i.unique && i.table == name);
                let object = self.objects.get_mut(name).ok_or_else(|| {
                    relation_error(UNDEFINED_TABLE, format!("relation \"{}\" does not exist", name))
                })?;
                if !object.kind.is_materialized() {
                    return Err(relation_error(
                        WRONG_OBJECT_TYPE,
                        format!("\"{}\" is not a materialized view", name),
                    ));
                }
                if s.concurrently && !indexed {
                    return Err(relation_error(
                        OBJECT_NOT_IN_PREREQUISITE_STATE,
                        format!("cannot refresh materialized view \"{}\" concurrently", name),
                    ));
                }
                object.refreshes += 1;
            }
            Statement::CreateIndex(s) => {
                let table = s.table.as_str();
                match self.objects.get(table).map(|o| o.kind) {
                    Some(ViewKind::MaterializedView) => (),
                    Some(ViewKind::View) => {
                        return Err(relation_error(
                            WRONG_OBJECT_TYPE,
                            format!("cannot create index on relation \"{}\"", table),
                        ))
                    }
                    None => {
                        return Err(relation_error(
                            UNDEFINED_TABLE,
                            format!("relation \"{}\" does not exist", table),
                        ))
                    }
                }
                if self.indexes.contains_key(s.name.as_str()) {
                    return Err(relation_error(
                        DUPLICATE_TABLE,
                        format!("relation \"{}\" already exists", s.name.as_str()),
                    ));
                }
                self.indexes.insert(
                    s.name.as_str().to_string(),
                    CatalogIndex {
                        table: table.to_string(),
                        unique: s.unique,
                    },
                );
            }
            Statement::DropIndex(s) => {
                if self.indexes.remove(s.name.as_str()).is_none() && !s.if_exists {
                    return Err(relation_error(
                        UNDEFINED_OBJECT,
                        format!("index \"{}\" does not exist", s.name.as_str()),
                    ));
                }
            }
            Statement::AlterOwner(s) => {
                let object = self.objects.get_mut(s.table.as_str()).ok_or_else(|| {
                    relation_error(
                        UNDEFINED_TABLE,
                        format!("relation \"{}\" does not exist", s.table.as_str()),
                    )
                })?;
                object.owner = Some(s.owner.as_str().to_string());
            }
            Statement::Grant(s) => {
                let object = self.objects.get_mut(s.table.as_str()).ok_or_else(|| {
                    relation_error(
                        UNDEFINED_TABLE,
                        format!("relation \"{}\" does not exist", s.table.as_str()),
                    )
                })?;
                object.grants.push((s.privilege, s.to.as_str().to_string()));
            }
        }
        Ok(0)
    }
}

#[async_trait]
impl Executor for MemoryExecutor {
    async fn execute(&self, alias: &str, statement: &Statement) -> Result<u64, ExecuteError> {
        let sql = statement.to_string();
        let fault = self.fault_for(&sql);
        let mut catalogs = lock(&self.catalogs);
        let catalog = catalogs
            .get_mut(alias)
            .ok_or_else(|| ExecuteError::UnknownConnection(alias.to_string()))?;
        catalog.log.push(sql);
        match fault {
            Some(err) => Err(err),
            None => catalog.apply(statement),
        }
    }

    async fn exists(&self, alias: &str, query: &ViewExistsQuery) -> Result<bool, ExecuteError> {
        if let Some(err) = self.fault_for(query.sql()) {
            return Err(err);
        }
        let catalogs = lock(&self.catalogs);
        let catalog = catalogs
            .get(alias)
            .ok_or_else(|| ExecuteError::UnknownConnection(alias.to_string()))?;
        Ok(catalog
            .objects
            .get(&query.name)
            .map(|o| o.kind == query.kind)
            .unwrap_or(false))
    }
}
