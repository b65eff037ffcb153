//! Validation engine: a pure function from a table set to a list of
//! structured, addressable errors. Collected exhaustively, never
//! fail-fast, never mutating, never panicking — malformed input becomes
//! a reported error, not an exception.

use crate::descriptor::{Column, ColumnKind};
use crate::model::{with_table, AnyTable, TableData, Tabular, Value};
use chrono::Datelike;
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub table: String,
    pub row: usize,
    pub row_ref: String,
    pub field: String,
    pub message: String,
}

/// Walks every (table, row, column) triple of the batch.
pub fn validate_tables(tables: &[AnyTable]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for table in tables {
        with_table!(table, t => validate_table(t, &mut errors));
    }
    errors
}

fn validate_table<T: Tabular>(table: &TableData<T>, errors: &mut Vec<ValidationError>) {
    for (row_idx, row) in table.rows.iter().enumerate() {
        for column in &table.columns {
            let value = row.value(column.key);

            // A missing required value short-circuits the type checks
            // so one blank cell reports exactly one error.
            if value.is_empty() {
                if column.required {
                    errors.push(error(table, row_idx, row, column, "is required"));
                }
                continue;
            }

            match column.kind {
                ColumnKind::Number => {
                    if !value.as_number().is_some_and(f64::is_finite) {
                        errors.push(error(table, row_idx, row, column, "must be a number"));
                    }
                }
                ColumnKind::Date => match value {
                    Value::Date(date) if date.year() <= 2099 => {}
                    Value::Date(_) => {
                        errors.push(error(table, row_idx, row, column, "year must be 2099 or earlier"));
                    }
                    _ => errors.push(error(table, row_idx, row, column, "must be a date")),
                },
                ColumnKind::Url | ColumnKind::Image => match &value {
                    Value::Text(s) if Url::parse(s).is_ok() => {}
                    _ => errors.push(error(table, row_idx, row, column, "must be a valid URL")),
                },
                ColumnKind::Select => match &value {
                    Value::Text(s) if column.options.contains(s) => {}
                    _ => errors.push(error(table, row_idx, row, column, "is not an allowed option")),
                },
                ColumnKind::Multiselect => {
                    if let Value::List(items) = &value {
                        for item in items {
                            if !column.options.contains(item) {
                                errors.push(error(
                                    table,
                                    row_idx,
                                    row,
                                    column,
                                    &format!("'{}' is not an allowed option", item),
                                ));
                            }
                        }
                    } else {
                        errors.push(error(table, row_idx, row, column, "must be a list"));
                    }
                }
                ColumnKind::Geography => match &value {
                    Value::Geography(coords)
                        if coords.len() == 2 && coords.iter().all(|c| c.is_finite()) => {}
                    _ => errors.push(error(
                        table,
                        row_idx,
                        row,
                        column,
                        "must be a [lon, lat] coordinate pair",
                    )),
                },
                ColumnKind::Json => match &value {
                    Value::Json(v) if v.is_object() => {}
                    _ => errors.push(error(table, row_idx, row, column, "must be a JSON object")),
                },
                ColumnKind::Boolean => {
                    if !matches!(value, Value::Bool(_)) {
                        errors.push(error(table, row_idx, row, column, "must be a boolean"));
                    }
                }
                ColumnKind::Text | ColumnKind::Textarea | ColumnKind::Link => {}
            }
        }
    }
}

fn error<T: Tabular>(
    table: &TableData<T>,
    row_idx: usize,
    row: &T,
    column: &Column,
    message: &str,
) -> ValidationError {
    ValidationError {
        table: table.name.to_string(),
        row: row_idx,
        row_ref: format!("row-{}", row.source_row() + 1),
        field: column.key.to_string(),
        message: format!("{} {}", column.label, message),
    }
}
