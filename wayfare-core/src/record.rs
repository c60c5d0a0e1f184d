//! Table-backed records described by their columns.
//!
//! A [`Record`] names its table, lists its columns in storage order and marks
//! which of them form the business key. Store backends work on [`Row`]s and
//! plain [`Value`]s, so resolve/fetch/update are written once for every
//! reference entity instead of once per table.

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Part of the business key used for deduplication.
    pub key: bool,
}

impl Column {
    pub const fn key(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind, key: true }
    }

    pub const fn attribute(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind, key: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn key_columns(&self) -> impl Iterator<Item = &'static Column> {
        self.columns.iter().filter(|c| c.key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl Value {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Text(_) => ColumnKind::Text,
            Value::Integer(_) => ColumnKind::Integer,
            Value::Real(_) => ColumnKind::Real,
        }
    }
}

/// An entity stored in its own table and resolved by business key.
pub trait Record: Sized + Send + Sync {
    const TABLE: Table;

    /// Column values in the order of `TABLE.columns`.
    fn values(&self) -> Vec<Value>;

    fn from_values(values: Vec<Value>) -> CoreResult<Self>;
}

/// A record flattened into its table and values, ready for a store backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub table: Table,
    pub values: Vec<Value>,
}

impl Row {
    pub fn of<R: Record>(record: &R) -> Self {
        Self {
            table: R::TABLE,
            values: record.values(),
        }
    }

    /// Business-key columns paired with this row's values.
    pub fn key(&self) -> impl Iterator<Item = (&'static Column, &Value)> {
        self.table
            .columns
            .iter()
            .zip(self.values.iter())
            .filter(|(column, _)| column.key)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static Column, &Value)> {
        self.table.columns.iter().zip(self.values.iter())
    }

    /// True when every business-key value equals the matching value in `other`.
    pub fn same_key(&self, other: &[Value]) -> bool {
        self.table
            .columns
            .iter()
            .zip(self.values.iter().zip(other.iter()))
            .filter(|(column, _)| column.key)
            .all(|(_, (mine, theirs))| mine == theirs)
    }
}

/// Reads column values back in storage order, checking kinds as it goes.
pub struct ValueReader {
    table: &'static str,
    values: std::vec::IntoIter<Value>,
}

impl ValueReader {
    pub fn new(table: &'static str, values: Vec<Value>) -> Self {
        Self {
            table,
            values: values.into_iter(),
        }
    }

    fn mismatch(&self, expected: ColumnKind, found: Option<Value>) -> CoreError {
        match found {
            Some(value) => CoreError::DecodeError(format!(
                "{}: expected {:?}, found {:?}",
                self.table,
                expected,
                value.kind()
            )),
            None => CoreError::DecodeError(format!("{}: missing column value", self.table)),
        }
    }

    pub fn text(&mut self) -> CoreResult<String> {
        match self.values.next() {
            Some(Value::Text(s)) => Ok(s),
            other => Err(self.mismatch(ColumnKind::Text, other)),
        }
    }

    pub fn integer(&mut self) -> CoreResult<i64> {
        match self.values.next() {
            Some(Value::Integer(i)) => Ok(i),
            other => Err(self.mismatch(ColumnKind::Integer, other)),
        }
    }

    pub fn real(&mut self) -> CoreResult<f64> {
        match self.values.next() {
            Some(Value::Real(f)) => Ok(f),
            other => Err(self.mismatch(ColumnKind::Real, other)),
        }
    }
}
