use std::collections::BTreeMap;

use crate::{
    error::{AppError, AppResult},
    models::PropertyMap,
};

pub mod neo4j;
pub mod queries;

pub use neo4j::Neo4jGraph;
pub use queries::{ColumnKind, CypherQuery};

/// Graph store abstraction
///
/// Executes a validated query template with its parameters and returns the
/// rows in store order. Implementations must be safe for concurrent use.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    async fn run(&self, query: &CypherQuery, params: Params) -> AppResult<Vec<Record>>;
}

/// Scalar query parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Int(i64),
}

/// Named query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<&'static str, Scalar>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn int(mut self, name: &'static str, value: i64) -> Self {
        self.0.insert(name, Scalar::Int(value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Scalar)> {
        self.0.iter().map(|(name, value)| (*name, value))
    }

    /// Checks the parameters against the names the query declares
    pub fn check_against(&self, query: &CypherQuery) -> AppResult<()> {
        for declared in query.params() {
            if !self.0.contains_key(declared) {
                return Err(AppError::InvalidQuery(format!(
                    "{}: missing parameter ${}",
                    query.name(),
                    declared
                )));
            }
        }
        for name in self.0.keys() {
            if !query.params().contains(name) {
                return Err(AppError::InvalidQuery(format!(
                    "{}: undeclared parameter ${}",
                    query.name(),
                    name
                )));
            }
        }
        Ok(())
    }
}

/// A typed value in a result row
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    IntList(Vec<i64>),
    Node(PropertyMap),
}

impl Field {
    fn type_name(&self) -> &'static str {
        match self {
            Field::Null => "null",
            Field::Bool(_) => "boolean",
            Field::Int(_) => "integer",
            Field::Text(_) => "string",
            Field::IntList(_) => "integer list",
            Field::Node(_) => "node",
        }
    }
}

/// One result row: positional fields named by the query's return columns
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Vec<&'static str>,
    fields: Vec<Field>,
}

impl Record {
    /// Builds a row for `query`, one field per declared column in order
    pub fn new(query: &CypherQuery, fields: Vec<Field>) -> AppResult<Self> {
        let columns: Vec<&'static str> = query.columns().iter().map(|c| c.name).collect();
        if columns.len() != fields.len() {
            return Err(AppError::MalformedRecord(format!(
                "{}: expected {} fields, got {}",
                query.name(),
                columns.len(),
                fields.len()
            )));
        }
        Ok(Self { columns, fields })
    }

    pub fn get(&self, column: &str) -> AppResult<&Field> {
        self.columns
            .iter()
            .position(|c| *c == column)
            .map(|idx| &self.fields[idx])
            .ok_or_else(|| AppError::MalformedRecord(format!("missing column `{}`", column)))
    }

    pub fn bool(&self, column: &str) -> AppResult<bool> {
        match self.get(column)? {
            Field::Bool(value) => Ok(*value),
            other => Err(mismatch(column, "boolean", other)),
        }
    }

    pub fn int(&self, column: &str) -> AppResult<i64> {
        match self.get(column)? {
            Field::Int(value) => Ok(*value),
            other => Err(mismatch(column, "integer", other)),
        }
    }

    pub fn text(&self, column: &str) -> AppResult<&str> {
        match self.get(column)? {
            Field::Text(value) => Ok(value),
            other => Err(mismatch(column, "string", other)),
        }
    }

    pub fn int_list(&self, column: &str) -> AppResult<&[i64]> {
        match self.get(column)? {
            Field::IntList(values) => Ok(values),
            other => Err(mismatch(column, "integer list", other)),
        }
    }

    pub fn node(&self, column: &str) -> AppResult<&PropertyMap> {
        match self.get(column)? {
            Field::Node(props) => Ok(props),
            other => Err(mismatch(column, "node", other)),
        }
    }
}

fn mismatch(column: &str, expected: &str, found: &Field) -> AppError {
    AppError::MalformedRecord(format!(
        "column `{}`: expected {}, found {}",
        column,
        expected,
        found.type_name()
    ))
}
