use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use crate::cell::{self, Cell, RawGrid};
use crate::header;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Date,
    Time,
    Number,
    Text,
}

/// One canonical field of an import kind: the name records carry, the
/// keyword used to find its column, how to coerce it, and whether it counts
/// as a "signal" column for row rejection.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub keyword: &'static str,
    pub kind: FieldKind,
    pub signal: bool,
}

/// A coerced cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Date(NaiveDate),
    Time(NaiveTime),
    Number(f64),
    Text(String),
}

impl Value {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => serde_json::Value::String(t.format("%H:%M:%S").to_string()),
            Value::Number(n) => serde_json::json!(n),
            Value::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// One validated row. Fields that did not resolve to a column, or whose cell
/// failed coercion, are absent; absent stays distinguishable from zero.
/// Never mutated after mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedRecord {
    fields: BTreeMap<&'static str, Value>,
}

impl ImportedRecord {
    /// Assemble a record directly, bypassing a grid. Mapping is the normal
    /// construction path; this exists for synthetic records in tests and for
    /// callers that already hold typed values.
    pub fn from_values(values: impl IntoIterator<Item = (&'static str, Value)>) -> Self {
        Self {
            fields: values.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.fields.get(name) {
            Some(Value::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn time(&self, name: &str) -> Option<NaiveTime> {
        match self.fields.get(name) {
            Some(Value::Time(t)) => Some(*t),
            _ => None,
        }
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.fields.get(name) {
            Some(Value::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The plain key→value row handed to the persistence collaborator.
    pub fn to_row(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect()
    }
}

/// Canonical fields resolved to absolute column indices, built once per
/// import so rows are probed by index instead of re-scanning header text.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    entries: Vec<(FieldDef, usize)>,
}

impl ColumnMap {
    /// Resolve every field keyword against the located header labels.
    /// `labels` must start at `column_offset`; unresolved fields are simply
    /// not present in the map.
    pub fn resolve(labels: &[String], column_offset: usize, fields: &[FieldDef]) -> Self {
        let entries = fields
            .iter()
            .filter_map(|def| {
                header::resolve_column(labels, def.keyword).map(|pos| (*def, column_offset + pos))
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn signal_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .filter(|(def, _)| def.signal)
            .map(|(_, col)| *col)
    }
}

/// Map the data rows of a grid into records.
///
/// Pure and restartable: the same grid and column map always yield the same
/// records. Rows whose signal columns are all blank/placeholder are dropped
/// silently; the exports pad trailing and decorative rows that way.
pub fn map_rows(grid: &RawGrid, data_start: usize, columns: &ColumnMap) -> Vec<ImportedRecord> {
    grid.iter()
        .skip(data_start)
        .filter(|row| !row_is_padding(row, columns))
        .map(|row| map_row(row, columns))
        .filter(|record| !record.is_empty())
        .collect()
}

const BLANK: Cell = Cell::Blank;

fn row_is_padding(row: &[Cell], columns: &ColumnMap) -> bool {
    let mut any_signal = false;
    for col in columns.signal_columns() {
        any_signal = true;
        let cell = row.get(col).unwrap_or(&BLANK);
        if !cell.is_placeholder() {
            return false;
        }
    }
    any_signal
}

fn map_row(row: &[Cell], columns: &ColumnMap) -> ImportedRecord {
    let mut fields = BTreeMap::new();

    for (def, col) in &columns.entries {
        let cell = row.get(*col).unwrap_or(&BLANK);
        if let Some(value) = coerce(cell, def.kind) {
            fields.insert(def.name, value);
        }
    }

    ImportedRecord { fields }
}

fn coerce(cell: &Cell, kind: FieldKind) -> Option<Value> {
    if cell.is_placeholder() {
        return None;
    }
    match kind {
        FieldKind::Date => match cell {
            Cell::Number(_) => cell::parse_date(cell).map(Value::Date),
            // Unparseable date strings pass through and act as opaque keys
            Cell::Text(t) => Some(
                cell::parse_date_str(t)
                    .map(Value::Date)
                    .unwrap_or_else(|| Value::Text(t.trim().to_string())),
            ),
            _ => None,
        },
        FieldKind::Time => match cell {
            Cell::Number(n) => cell::parse_fraction_time(*n).map(Value::Time),
            Cell::Text(t) => Some(Value::Text(t.trim().to_string())),
            _ => None,
        },
        FieldKind::Number => cell::parse_number(cell).map(Value::Number),
        FieldKind::Text => cell::clean_text(cell).map(Value::Text),
    }
}
