//! In-memory [`Store`] with the target schema's unique keys and conflict
//! rules. Each batch is applied atomically: if any row fails, every row the
//! batch already wrote is undone.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use catalogseed_core::batch::Statement;
use catalogseed_core::error::{CatalogSeedError, Result};
use catalogseed_core::generate::Value;
use catalogseed_core::schema::{self, KeyLookup, KeyScope, OnConflict, TableSpec};
use catalogseed_core::store::Store;

pub type Row = Vec<Value>;

/// Unique constraints per table, as column lists.
fn unique_constraints(table: &'static TableSpec) -> Vec<&'static [&'static str]> {
    match table.name {
        "product_promo" => {
            let keys: [&'static [&'static str]; 2] = [&["product_promo_id"], &["product_id"]];
            keys.to_vec()
        }
        "product_product_category" | "product_tag" => vec![table.columns],
        _ => vec![std::slice::from_ref(&table.key)],
    }
}

fn column_index(table: &TableSpec, column: &str) -> usize {
    table
        .columns
        .iter()
        .position(|c| *c == column)
        .unwrap_or_else(|| panic!("{} has no column {}", table.name, column))
}

#[derive(Debug)]
struct UniqueIndex {
    columns: &'static [&'static str],
    positions: Vec<usize>,
    entries: HashMap<String, usize>,
}

impl UniqueIndex {
    fn key(&self, row: &[Value]) -> String {
        self.positions
            .iter()
            .map(|&i| row[i].to_unique_key())
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }

    fn covers(&self, target: &[&str]) -> bool {
        self.columns == target
    }
}

#[derive(Debug)]
struct TableState {
    spec: &'static TableSpec,
    rows: Vec<Row>,
    indexes: Vec<UniqueIndex>,
}

impl TableState {
    fn new(spec: &'static TableSpec) -> Self {
        let indexes = unique_constraints(spec)
            .into_iter()
            .map(|columns| UniqueIndex {
                columns,
                positions: columns.iter().map(|c| column_index(spec, c)).collect(),
                entries: HashMap::new(),
            })
            .collect();
        Self {
            spec,
            rows: Vec::new(),
            indexes,
        }
    }

    /// First unique constraint the row collides with: (index, existing row).
    fn find_conflict(&self, row: &[Value]) -> Option<(usize, usize)> {
        self.indexes
            .iter()
            .enumerate()
            .find_map(|(i, index)| index.entries.get(&index.key(row)).map(|&at| (i, at)))
    }

    fn push(&mut self, row: Row) -> usize {
        let at = self.rows.len();
        for index in &mut self.indexes {
            let key = index.key(&row);
            index.entries.insert(key, at);
        }
        self.rows.push(row);
        at
    }

    fn truncate(&mut self, len: usize) {
        while self.rows.len() > len {
            if let Some(row) = self.rows.pop() {
                for index in &mut self.indexes {
                    let key = index.key(&row);
                    index.entries.remove(&key);
                }
            }
        }
    }

    fn duplicate_error(&self, index: usize) -> CatalogSeedError {
        CatalogSeedError::Constraint {
            table: self.spec.name.to_string(),
            message: format!(
                "duplicate key value violates unique constraint on ({})",
                self.indexes[index].columns.join(", ")
            ),
        }
    }
}

#[derive(Debug)]
struct State {
    tables: IndexMap<&'static str, TableState>,
}

/// Rows replaced by an upsert, restored on rollback.
type UndoLog = Vec<(&'static str, usize, Row)>;

impl State {
    fn new() -> Self {
        Self {
            tables: schema::ALL_TABLES
                .iter()
                .map(|&spec| (spec.name, TableState::new(spec)))
                .collect(),
        }
    }

    fn table(&self, spec: &TableSpec) -> &TableState {
        &self.tables[spec.name]
    }

    fn apply(&mut self, statements: &[Statement]) -> Result<u64> {
        let lengths: Vec<usize> = self.tables.values().map(|t| t.rows.len()).collect();
        let mut undo = UndoLog::new();

        let mut affected = 0;
        for statement in statements {
            match self.apply_statement(statement, &mut undo) {
                Ok(rows) => affected += rows,
                Err(e) => {
                    self.rollback(&lengths, undo);
                    return Err(e);
                }
            }
        }
        Ok(affected)
    }

    fn rollback(&mut self, lengths: &[usize], undo: UndoLog) {
        for (table, &len) in self.tables.values_mut().zip(lengths) {
            table.truncate(len);
        }
        for (name, at, row) in undo.into_iter().rev() {
            if let Some(table) = self.tables.get_mut(name) {
                table.rows[at] = row;
            }
        }
    }

    fn apply_statement(&mut self, statement: &Statement, undo: &mut UndoLog) -> Result<u64> {
        let spec = statement.table;
        let table = self
            .tables
            .get_mut(spec.name)
            .ok_or_else(|| CatalogSeedError::Other(format!("unknown table {}", spec.name)))?;

        let mut touched = HashSet::new();
        let mut affected = 0;
        for row in statement.rows() {
            let Some((index, existing)) = table.find_conflict(row) else {
                touched.insert(table.push(row.to_vec()));
                affected += 1;
                continue;
            };

            match spec.on_conflict {
                OnConflict::Ignore => {}
                OnConflict::IgnoreOn(target) if table.indexes[index].covers(target) => {}
                OnConflict::UpdateOn { target, set } if table.indexes[index].covers(target) => {
                    if !touched.insert(existing) {
                        return Err(CatalogSeedError::Constraint {
                            table: spec.name.to_string(),
                            message: "ON CONFLICT DO UPDATE command cannot affect row a second time"
                                .to_string(),
                        });
                    }
                    undo.push((spec.name, existing, table.rows[existing].clone()));
                    for column in set {
                        let i = column_index(spec, column);
                        table.rows[existing][i] = row[i].clone();
                    }
                    affected += 1;
                }
                _ => return Err(table.duplicate_error(index)),
            }
        }
        Ok(affected)
    }
}

/// A transactional in-memory store for tests.
pub struct MemoryStore {
    state: Mutex<State>,
    rng: Mutex<StdRng>,
    failures: Mutex<Vec<(&'static str, i64)>>,
    executed: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::new()),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
            failures: Mutex::new(Vec::new()),
            executed: AtomicUsize::new(0),
        }
    }

    /// Fail every batch that writes a `table` row whose key equals `key`.
    pub fn fail_on(self, table: &'static TableSpec, key: i64) -> Self {
        lock(&self.failures).push((table.name, key));
        self
    }

    /// Write rows directly, outside the batch counter.
    pub fn seed(&self, statements: &[Statement]) -> Result<u64> {
        lock(&self.state).apply(statements)
    }

    /// Number of `execute_batch` calls so far, failed ones included.
    pub fn executed_batches(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn rows(&self, table: &TableSpec) -> Vec<Row> {
        lock(&self.state).table(table).rows.clone()
    }

    pub fn len(&self, table: &TableSpec) -> usize {
        lock(&self.state).table(table).rows.len()
    }

    pub fn is_empty(&self, table: &TableSpec) -> bool {
        self.len(table) == 0
    }

    /// Key column of every row, in insertion order.
    pub fn ids(&self, table: &TableSpec) -> Vec<i64> {
        lock(&self.state)
            .table(table)
            .rows
            .iter()
            .filter_map(|row| row[0].as_int())
            .collect()
    }

    fn injected_failure(&self, statements: &[Statement]) -> Option<CatalogSeedError> {
        let failures = lock(&self.failures);
        statements.iter().find_map(|statement| {
            statement.rows().find_map(|row| {
                let key = row[0].as_int()?;
                failures
                    .iter()
                    .any(|&(table, bad)| table == statement.table.name && bad == key)
                    .then(|| CatalogSeedError::Constraint {
                        table: statement.table.name.to_string(),
                        message: format!("injected failure at key {}", key),
                    })
            })
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Store for MemoryStore {
    async fn max_key(&self, lookup: KeyLookup) -> Result<Option<i64>> {
        let state = lock(&self.state);
        let table = state.table(lookup.table);
        let parent = column_index(&schema::CATEGORY, "parent_category_id");
        Ok(table
            .rows
            .iter()
            .filter(|row| match lookup.scope {
                KeyScope::All => true,
                KeyScope::Nested => !row[parent].is_null(),
            })
            .filter_map(|row| row[0].as_int())
            .max())
    }

    async fn row_count(&self, table: &'static TableSpec) -> Result<i64> {
        Ok(self.len(table) as i64)
    }

    async fn top_level_categories(&self) -> Result<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .rows(&schema::CATEGORY)
            .iter()
            .filter(|row| row[1].is_null())
            .filter_map(|row| row[0].as_int())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn subcategory_links(&self) -> Result<Vec<(i64, i64)>> {
        Ok(self
            .rows(&schema::CATEGORY)
            .iter()
            .filter_map(|row| Some((row[0].as_int()?, row[1].as_int()?)))
            .collect())
    }

    async fn sample_product_ids(&self, limit: usize) -> Result<Vec<i64>> {
        let mut ids = self.ids(&schema::PRODUCT);
        ids.shuffle(&mut *lock(&self.rng));
        ids.truncate(limit);
        Ok(ids)
    }

    async fn execute_batch(&self, statements: &[Statement]) -> Result<u64> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.injected_failure(statements) {
            return Err(err);
        }
        lock(&self.state).apply(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalogseed_core::batch::statement::build_chunked;
    use catalogseed_core::batch::InsertBuilder;

    fn promo_row(id: i64, product_id: i64, status: &'static str) -> Vec<Value> {
        vec![
            Value::Int(id),
            Value::Int(product_id),
            Value::borrowed("discount"),
            Value::borrowed(status),
            Value::Null,
            Value::Null,
            Value::Null,
        ]
    }

    fn tag_rows(ids: impl Iterator<Item = i64>) -> Vec<Vec<Value>> {
        ids.map(|id| {
            vec![
                Value::Int(id),
                Value::borrowed("art"),
                Value::Bool(false),
                Value::Bool(false),
                Value::Bool(false),
            ]
        })
        .collect()
    }

    fn statements(table: &'static TableSpec, rows: Vec<Vec<Value>>) -> Vec<Statement> {
        build_chunked(table, rows, 100).unwrap()
    }

    #[tokio::test]
    async fn test_conflict_ignore_skips_existing_keys() {
        let store = MemoryStore::new();
        let first = statements(&schema::TAG, tag_rows(1..=10));
        assert_eq!(store.execute_batch(&first).await.unwrap(), 10);
        assert_eq!(store.execute_batch(&first).await.unwrap(), 0);
        assert_eq!(store.len(&schema::TAG), 10);
    }

    #[tokio::test]
    async fn test_failed_statement_rolls_back_whole_batch() {
        let store = MemoryStore::new();
        let mut batch = statements(&schema::TAG, tag_rows(1..=5));

        let mut download = InsertBuilder::new(&schema::PRODUCT_DOWNLOAD);
        for _ in 0..2 {
            download
                .push_row([Value::Int(1), Value::Int(1), Value::Null, Value::Int(0)])
                .unwrap();
        }
        batch.extend(download.finish().unwrap());

        let err = store.execute_batch(&batch).await.unwrap_err();
        assert!(matches!(err, CatalogSeedError::Constraint { .. }));
        assert!(store.is_empty(&schema::TAG));
        assert!(store.is_empty(&schema::PRODUCT_DOWNLOAD));

        // Keys released by the rollback can be written again.
        assert_eq!(store.execute_batch(&batch[..1]).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_upsert_replaces_set_columns() {
        let store = MemoryStore::new();
        store
            .execute_batch(&statements(&schema::PRODUCT_PROMO, vec![promo_row(1, 7, "active")]))
            .await
            .unwrap();
        store
            .execute_batch(&statements(&schema::PRODUCT_PROMO, vec![promo_row(2, 7, "paused")]))
            .await
            .unwrap();

        let rows = store.rows(&schema::PRODUCT_PROMO);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Value::Int(1));
        assert_eq!(rows[0][3], Value::borrowed("paused"));
    }

    #[tokio::test]
    async fn test_upsert_touching_row_twice_fails() {
        let store = MemoryStore::new();
        let batch = statements(
            &schema::PRODUCT_PROMO,
            vec![promo_row(1, 7, "active"), promo_row(2, 7, "paused")],
        );
        assert!(store.execute_batch(&batch).await.is_err());
        assert!(store.is_empty(&schema::PRODUCT_PROMO));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new().fail_on(&schema::TAG, 3);
        let batch = statements(&schema::TAG, tag_rows(1..=5));
        assert!(store.execute_batch(&batch).await.is_err());
        assert_eq!(store.executed_batches(), 1);
        assert!(store.is_empty(&schema::TAG));
    }

    #[tokio::test]
    async fn test_max_key_scopes() {
        let store = MemoryStore::new();
        assert_eq!(store.max_key(KeyLookup::all(&schema::TAG)).await.unwrap(), None);

        let category = |id: i64, parent: Value| {
            let mut row = vec![Value::Int(id), parent];
            row.extend((0..3).map(|_| Value::borrowed("name")));
            row.extend([Value::Null, Value::Null]);
            row
        };
        let rows = vec![category(5, Value::Null), category(3, Value::Int(5))];
        store.seed(&statements(&schema::CATEGORY, rows)).unwrap();
        assert_eq!(
            store.max_key(KeyLookup::all(&schema::CATEGORY)).await.unwrap(),
            Some(5)
        );
        assert_eq!(
            store.max_key(KeyLookup::nested_categories()).await.unwrap(),
            Some(3)
        );
        assert_eq!(store.top_level_categories().await.unwrap(), vec![5]);
        assert_eq!(store.subcategory_links().await.unwrap(), vec![(3, 5)]);
        assert_eq!(store.executed_batches(), 0);
    }
}
