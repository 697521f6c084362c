use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("'{name}' is already registered as {existing}")]
    DuplicateName { name: String, existing: &'static str },

    #[error("Unknown scope or aggregate: {0}")]
    UnknownScope(String),
}

/// The query value a scope transforms: a declarative find request in the
/// same shape the API accepts. Field projection is the serializer's job and
/// stays out of here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(rename = "where")]
    pub where_clause: Option<Value>,
    /// `"field"` or `"field desc"`
    pub order: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl QuerySpec {
    /// Test one record against the where clause. Conditions are a JSON
    /// object of field -> expected value, with `{"$eq": v}` as the explicit
    /// operator form; all entries must match.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(Value::Object(conditions)) = &self.where_clause else {
            return true;
        };

        conditions.iter().all(|(field, expected)| {
            let actual = record.get(field).unwrap_or(&Value::Null);
            match expected {
                Value::Object(op) => match op.get("$eq") {
                    Some(v) => actual == v,
                    None => false,
                },
                other => actual == other,
            }
        })
    }

    /// Sort a collection by the order clause. Only top-level fields sort;
    /// numbers, strings and bools compare, anything else keeps input order.
    pub fn apply_order(&self, records: &mut [Value]) {
        let Some(order) = &self.order else {
            return;
        };
        let (field, descending) = match order.rsplit_once(' ') {
            Some((f, dir)) if dir.eq_ignore_ascii_case("desc") => (f.trim(), true),
            Some((f, dir)) if dir.eq_ignore_ascii_case("asc") => (f.trim(), false),
            _ => (order.trim(), false),
        };

        records.sort_by(|a, b| compare_field(a.get(field), b.get(field)));
        if descending {
            records.reverse();
        }
    }

    /// Apply limit/offset to an already-filtered collection.
    pub fn apply_window<'a>(&self, records: &'a [Value]) -> &'a [Value] {
        let start = self.offset.unwrap_or(0).min(records.len());
        let end = match self.limit {
            Some(limit) => (start + limit).min(records.len()),
            None => records.len(),
        };
        &records[start..end]
    }

    /// Merge an equality condition into the where clause.
    pub fn filter_eq(mut self, field: impl Into<String>, value: Value) -> Self {
        let mut conditions = match self.where_clause.take() {
            Some(Value::Object(obj)) => obj,
            _ => serde_json::Map::new(),
        };
        conditions.insert(field.into(), value);
        self.where_clause = Some(Value::Object(conditions));
        self
    }
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

pub type ScopeFn = Arc<dyn Fn(QuerySpec) -> QuerySpec + Send + Sync>;

/// Explicit registry of named query transformations, owned by the caller and
/// passed alongside the resource it scopes.
///
/// Scopes and aggregates share one namespace: registering a name already
/// taken by either category is a contract violation, never a silent
/// override. A registered global scope applies to every query through
/// `apply_global` unless globally disabled.
#[derive(Default)]
pub struct ScopeRegistry {
    scopes: HashMap<String, ScopeFn>,
    aggregates: HashMap<String, ScopeFn>,
    excluded: HashSet<String>,
    global_scope: Option<ScopeFn>,
    global_scope_disabled: bool,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_scope(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(QuerySpec) -> QuerySpec + Send + Sync + 'static,
    ) -> Result<(), ScopeError> {
        let name = name.into();
        self.check_namespace(&name)?;
        self.scopes.insert(name, Arc::new(func));
        Ok(())
    }

    pub fn register_aggregate(
        &mut self,
        name: impl Into<String>,
        func: impl Fn(QuerySpec) -> QuerySpec + Send + Sync + 'static,
    ) -> Result<(), ScopeError> {
        let name = name.into();
        self.check_namespace(&name)?;
        self.aggregates.insert(name, Arc::new(func));
        Ok(())
    }

    fn check_namespace(&self, name: &str) -> Result<(), ScopeError> {
        if self.scopes.contains_key(name) {
            return Err(ScopeError::DuplicateName {
                name: name.to_string(),
                existing: "a scope",
            });
        }
        if self.aggregates.contains_key(name) {
            return Err(ScopeError::DuplicateName {
                name: name.to_string(),
                existing: "an aggregate",
            });
        }
        Ok(())
    }

    /// Suppress names from lookup without unregistering them.
    pub fn exclude(&mut self, names: &[&str]) {
        for name in names {
            self.excluded.insert(name.to_string());
        }
    }

    pub fn set_global_scope(
        &mut self,
        func: impl Fn(QuerySpec) -> QuerySpec + Send + Sync + 'static,
    ) {
        self.global_scope = Some(Arc::new(func));
    }

    pub fn disable_global_scope(&mut self, disabled: bool) {
        self.global_scope_disabled = disabled;
    }

    /// Run the named scope (or aggregate) over a query spec.
    pub fn apply(&self, name: &str, spec: QuerySpec) -> Result<QuerySpec, ScopeError> {
        if self.excluded.contains(name) {
            return Err(ScopeError::UnknownScope(name.to_string()));
        }
        let func = self
            .scopes
            .get(name)
            .or_else(|| self.aggregates.get(name))
            .ok_or_else(|| ScopeError::UnknownScope(name.to_string()))?;
        Ok(func(spec))
    }

    /// Run the global scope, if one is registered and not disabled.
    pub fn apply_global(&self, spec: QuerySpec) -> QuerySpec {
        match (&self.global_scope, self.global_scope_disabled) {
            (Some(func), false) => func(spec),
            _ => spec,
        }
    }

    pub fn scope_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scopes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn aggregate_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.aggregates.keys().cloned().collect();
        names.sort();
        names
    }
}
