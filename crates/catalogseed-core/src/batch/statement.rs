//! # Batch Statement Builder
//!
//! Builds multi-row `INSERT ... VALUES ($1, $2), ($3, $4) ...` statements with
//! a flat argument list in matching order.
//!
//! Every value group is rendered by [`placeholder_group`] and every row goes
//! through [`InsertBuilder::push_row`], which rejects a row whose width does
//! not match the table's column count. `finish` re-checks that the number of
//! rendered placeholders equals the number of arguments before a statement
//! ever reaches the store.

use crate::error::{CatalogSeedError, Result};
use crate::generate::value::Value;
use crate::schema::{OnConflict, TableSpec};

/// A ready-to-execute insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub table: &'static TableSpec,
    pub sql: String,
    pub args: Vec<Value>,
}

impl Statement {
    /// Number of value groups (rows).
    pub fn row_count(&self) -> usize {
        self.args.len() / self.table.columns.len()
    }

    /// Arguments grouped per row, in column order.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.args.chunks(self.table.columns.len())
    }

    /// Count of `$n` placeholders actually present in the SQL text.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }
}

/// Incrementally builds one multi-row insert for a table.
#[derive(Debug)]
pub struct InsertBuilder {
    table: &'static TableSpec,
    sql: String,
    args: Vec<Value>,
    rows: usize,
    next_param: usize,
}

impl InsertBuilder {
    pub fn new(table: &'static TableSpec) -> Self {
        Self::with_capacity(table, 0)
    }

    pub fn with_capacity(table: &'static TableSpec, rows: usize) -> Self {
        let width = table.columns.len();
        let mut sql = String::with_capacity(64 + rows * width * 8);
        sql.push_str("INSERT INTO ");
        sql.push_str(&quote_identifier(table.name));
        sql.push_str(" (");
        sql.push_str(&column_list(table.columns));
        sql.push_str(") VALUES ");
        Self {
            table,
            sql,
            args: Vec::with_capacity(rows * width),
            rows: 0,
            next_param: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Append one row. The row must supply exactly one value per column.
    pub fn push_row(&mut self, row: impl IntoIterator<Item = Value>) -> Result<()> {
        let width = self.table.columns.len();
        let before = self.args.len();
        self.args.extend(row);
        let supplied = self.args.len() - before;
        if supplied != width {
            self.args.truncate(before);
            return Err(CatalogSeedError::PlaceholderMismatch {
                table: self.table.name.to_string(),
                placeholders: width,
                arguments: supplied,
            });
        }

        if self.rows > 0 {
            self.sql.push_str(", ");
        }
        placeholder_group(&mut self.sql, self.next_param, width);
        self.next_param += width;
        self.rows += 1;
        Ok(())
    }

    /// Finish the statement. Returns `None` when no rows were pushed.
    pub fn finish(mut self) -> Result<Option<Statement>> {
        if self.rows == 0 {
            return Ok(None);
        }

        let placeholders = self.next_param - 1;
        if placeholders != self.args.len() {
            return Err(CatalogSeedError::PlaceholderMismatch {
                table: self.table.name.to_string(),
                placeholders,
                arguments: self.args.len(),
            });
        }

        self.sql.push_str(&conflict_clause(&self.table.on_conflict));
        Ok(Some(Statement {
            table: self.table,
            sql: self.sql,
            args: self.args,
        }))
    }
}

/// Render one `($first, $first+1, ...)` value group of `width` placeholders.
///
/// This is the only place placeholders are formatted.
pub fn placeholder_group(out: &mut String, first: usize, width: usize) {
    use std::fmt::Write;

    out.push('(');
    for offset in 0..width {
        if offset > 0 {
            out.push_str(", ");
        }
        // Writing to a String never fails.
        let _ = write!(out, "${}", first + offset);
    }
    out.push(')');
}

/// Build statements for `rows`, at most `max_rows` rows per statement.
pub fn build_chunked<R>(
    table: &'static TableSpec,
    rows: impl IntoIterator<Item = R>,
    max_rows: usize,
) -> Result<Vec<Statement>>
where
    R: IntoIterator<Item = Value>,
{
    let max_rows = max_rows.max(1);
    let mut statements = Vec::new();
    let mut builder = InsertBuilder::new(table);

    for row in rows {
        builder.push_row(row)?;
        if builder.len() == max_rows {
            let full = std::mem::replace(&mut builder, InsertBuilder::new(table));
            statements.extend(full.finish()?);
        }
    }
    statements.extend(builder.finish()?);

    Ok(statements)
}

/// Build statements for two-column relation tuples, re-chunked to at most
/// `max_tuples` per statement independently of the parent batch size.
pub fn build_relations(
    table: &'static TableSpec,
    tuples: &[(i64, i64)],
    max_tuples: usize,
) -> Result<Vec<Statement>> {
    build_chunked(
        table,
        tuples
            .iter()
            .map(|&(left, right)| [Value::Int(left), Value::Int(right)]),
        max_tuples,
    )
}

/// Count `$n` placeholders in SQL text.
pub fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1).is_some_and(|b| b.is_ascii_digit()) {
            count += 1;
            i += 1;
            while bytes.get(i).is_some_and(|b| b.is_ascii_digit()) {
                i += 1;
            }
        } else {
            i += 1;
        }
    }
    count
}

fn conflict_clause(on_conflict: &OnConflict) -> String {
    match on_conflict {
        OnConflict::Fail => String::new(),
        OnConflict::Ignore => " ON CONFLICT DO NOTHING".to_string(),
        OnConflict::IgnoreOn(target) => {
            format!(" ON CONFLICT ({}) DO NOTHING", column_list(target))
        }
        OnConflict::UpdateOn { target, set } => {
            let assignments: Vec<String> = set
                .iter()
                .map(|c| {
                    let q = quote_identifier(c);
                    format!("{} = EXCLUDED.{}", q, q)
                })
                .collect();
            format!(
                " ON CONFLICT ({}) DO UPDATE SET {}",
                column_list(target),
                assignments.join(", ")
            )
        }
    }
}

fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Quote a SQL identifier for PostgreSQL.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Truncate a SQL string for error messages.
pub fn truncate_sql(sql: &str, max_len: usize) -> String {
    if sql.len() <= max_len {
        sql.to_string()
    } else {
        let mut end = max_len;
        while !sql.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &sql[..end])
    }
}
