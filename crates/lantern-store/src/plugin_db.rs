//! Per-plugin relational storage.
//!
//! Each plugin owns a namespace of tables. Access goes through prepared
//! statements: [`prepare`](PluginDb::prepare), [`bind`](PluginDb::bind),
//! [`step`](PluginDb::step), read with [`column`](PluginDb::column),
//! [`reset`](PluginDb::reset), and [`finalize`](PluginDb::finalize). A
//! plugin may only touch statements and tables it created. Handles carry
//! a generation, so a finalized handle never reaches a later statement
//! that reuses its slot.

use std::collections::VecDeque;

use lantern_arena::{Arena, ArenaConfig, DeletionPolicy};
use lantern_core::{PluginError, PluginId, StatementId};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A cell value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A signed integer.
    Int(i64),
    /// A float.
    Real(f64),
    /// A string.
    Text(String),
}

impl Value {
    /// The integer, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a float; integers widen.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// The string, if this is `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A plugin-owned table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PluginTable {
    /// Owning plugin.
    pub plugin: PluginId,
    /// Table name, unique per plugin.
    pub name: String,
    /// Column names.
    pub columns: Vec<String>,
    /// Rows, each with one value per column.
    pub rows: Vec<Vec<Value>>,
}

impl PluginTable {
    fn column_index(&self, column: &str) -> Result<usize, PluginError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| PluginError::UnknownColumn {
                table: self.name.clone(),
                column: column.to_owned(),
            })
    }
}

/// A statement shape.
///
/// Parameters are bound by position. Assigned columns come first, then
/// the `where_eq` value if a filter is set.
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// Read `columns` from rows matching the filter.
    Select {
        /// Table name.
        table: String,
        /// Projected columns.
        columns: Vec<String>,
        /// Equality filter column.
        filter: Option<String>,
    },
    /// Append one row; unnamed columns are null.
    Insert {
        /// Table name.
        table: String,
        /// Assigned columns.
        columns: Vec<String>,
    },
    /// Assign `columns` on rows matching the filter.
    Update {
        /// Table name.
        table: String,
        /// Assigned columns.
        columns: Vec<String>,
        /// Equality filter column.
        filter: Option<String>,
    },
    /// Remove rows matching the filter.
    Delete {
        /// Table name.
        table: String,
        /// Equality filter column.
        filter: Option<String>,
    },
}

impl Query {
    /// `SELECT columns FROM table`.
    pub fn select(table: &str, columns: &[&str]) -> Self {
        Self::Select {
            table: table.to_owned(),
            columns: owned(columns),
            filter: None,
        }
    }

    /// `INSERT INTO table (columns)`.
    pub fn insert(table: &str, columns: &[&str]) -> Self {
        Self::Insert {
            table: table.to_owned(),
            columns: owned(columns),
        }
    }

    /// `UPDATE table SET columns`.
    pub fn update(table: &str, columns: &[&str]) -> Self {
        Self::Update {
            table: table.to_owned(),
            columns: owned(columns),
            filter: None,
        }
    }

    /// `DELETE FROM table`.
    pub fn delete(table: &str) -> Self {
        Self::Delete {
            table: table.to_owned(),
            filter: None,
        }
    }

    /// Restrict to rows whose `column` equals the last parameter.
    ///
    /// Ignored for inserts.
    pub fn where_eq(mut self, column: &str) -> Self {
        match &mut self {
            Self::Select { filter, .. } | Self::Update { filter, .. } | Self::Delete { filter, .. } => {
                *filter = Some(column.to_owned());
            }
            Self::Insert { .. } => {}
        }
        self
    }

    fn table(&self) -> &str {
        match self {
            Self::Select { table, .. }
            | Self::Insert { table, .. }
            | Self::Update { table, .. }
            | Self::Delete { table, .. } => table,
        }
    }

    fn filter(&self) -> Option<&str> {
        match self {
            Self::Select { filter, .. } | Self::Update { filter, .. } | Self::Delete { filter, .. } => {
                filter.as_deref()
            }
            Self::Insert { .. } => None,
        }
    }

    fn param_count(&self) -> usize {
        let assigned = match self {
            Self::Insert { columns, .. } | Self::Update { columns, .. } => columns.len(),
            Self::Select { .. } | Self::Delete { .. } => 0,
        };
        assigned + usize::from(self.filter().is_some())
    }
}

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_owned()).collect()
}

/// Outcome of one [`PluginDb::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// A row is available through [`PluginDb::column`].
    Row,
    /// The statement has finished.
    Done,
}

#[derive(Debug)]
struct Statement {
    owner: PluginId,
    generation: u32,
    query: Query,
    params: Vec<Value>,
    pending: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
    started: bool,
}

/// Plugin tables and their prepared statements.
#[derive(Debug)]
pub struct PluginDb {
    tables: Vec<PluginTable>,
    statements: Arena<Option<Statement>>,
    generation: u32,
}

impl PluginDb {
    /// An empty database.
    pub fn new() -> Result<Self, StoreError> {
        Self::with_tables(Vec::new())
    }

    /// A database over previously persisted tables.
    pub fn with_tables(tables: Vec<PluginTable>) -> Result<Self, StoreError> {
        let statements = Arena::new(ArenaConfig::new(
            ArenaConfig::DEFAULT_GROWTH_UNIT,
            DeletionPolicy::DeleteAllowed,
        ))?;
        Ok(Self {
            tables,
            statements,
            generation: 0,
        })
    }

    /// All tables, for persistence.
    pub fn tables(&self) -> &[PluginTable] {
        &self.tables
    }

    /// The table `name` in `plugin`'s namespace.
    pub fn table(&self, plugin: PluginId, name: &str) -> Option<&PluginTable> {
        self.tables
            .iter()
            .find(|t| t.plugin == plugin && t.name == name)
    }

    /// Create a table if it does not already exist.
    ///
    /// Re-creating with identical columns is a no-op; different columns
    /// are a [`PluginError::TableConflict`].
    pub fn create_table(
        &mut self,
        plugin: PluginId,
        name: &str,
        columns: &[&str],
    ) -> Result<(), PluginError> {
        if name.is_empty() {
            return Err(PluginError::EmptyName { what: "table" });
        }
        if columns.iter().any(|c| c.is_empty()) {
            return Err(PluginError::EmptyName { what: "column" });
        }
        if let Some(existing) = self.table(plugin, name) {
            if existing.columns.iter().map(String::as_str).eq(columns.iter().copied()) {
                return Ok(());
            }
            return Err(PluginError::TableConflict {
                table: name.to_owned(),
            });
        }
        self.tables.push(PluginTable {
            plugin,
            name: name.to_owned(),
            columns: owned(columns),
            rows: Vec::new(),
        });
        Ok(())
    }

    /// Drop `plugin`'s table `name` and its rows.
    ///
    /// Statements prepared against it stay live but fail with
    /// [`PluginError::UnknownTable`] when stepped.
    pub fn drop_table(&mut self, plugin: PluginId, name: &str) -> Result<(), PluginError> {
        let idx = self
            .tables
            .iter()
            .position(|t| t.plugin == plugin && t.name == name)
            .ok_or_else(|| PluginError::UnknownTable {
                table: name.to_owned(),
            })?;
        self.tables.remove(idx);
        Ok(())
    }

    /// Prepare `query` against one of `plugin`'s tables.
    pub fn prepare(&mut self, plugin: PluginId, query: Query) -> Result<StatementId, PluginError> {
        let table = self
            .table(plugin, query.table())
            .ok_or_else(|| PluginError::UnknownTable {
                table: query.table().to_owned(),
            })?;
        let named: Vec<&String> = match &query {
            Query::Select { columns, .. }
            | Query::Insert { columns, .. }
            | Query::Update { columns, .. } => columns.iter().collect(),
            Query::Delete { .. } => Vec::new(),
        };
        for column in named {
            table.column_index(column)?;
        }
        if let Some(filter) = query.filter() {
            table.column_index(filter)?;
        }

        let params = vec![Value::Null; query.param_count()];
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        let (idx, slot) = self
            .statements
            .insert()
            .map_err(|e| PluginError::Custom {
                reason: e.to_string(),
            })?;
        *slot = Some(Statement {
            owner: plugin,
            generation,
            query,
            params,
            pending: VecDeque::new(),
            current: None,
            started: false,
        });
        let index = u32::try_from(idx).map_err(|_| PluginError::Custom {
            reason: format!("statement slot {idx} out of range"),
        })?;
        Ok(StatementId::new(index, generation))
    }

    /// Bind parameter `index` (zero-based).
    pub fn bind(
        &mut self,
        plugin: PluginId,
        statement: StatementId,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<(), PluginError> {
        let stmt = self.owned_statement(plugin, statement)?;
        let param = stmt
            .params
            .get_mut(index)
            .ok_or(PluginError::BadIndex { statement, index })?;
        *param = value.into();
        Ok(())
    }

    /// Advance the statement.
    ///
    /// A select yields each matching row in turn. Other statements run on
    /// their first step and report [`Step::Done`] until reset. A step that
    /// fails leaves the statement unstarted, so the next step fails again.
    pub fn step(&mut self, plugin: PluginId, statement: StatementId) -> Result<Step, PluginError> {
        let stmt = self.owned_statement(plugin, statement)?;
        if !stmt.started {
            let query = stmt.query.clone();
            let params = stmt.params.clone();
            let table = self
                .tables
                .iter_mut()
                .find(|t| t.plugin == plugin && t.name == query.table())
                .ok_or_else(|| PluginError::UnknownTable {
                    table: query.table().to_owned(),
                })?;
            let pending = execute(table, &query, &params)?;
            let stmt = self.owned_statement(plugin, statement)?;
            stmt.pending = pending;
            stmt.started = true;
        }
        let stmt = self.owned_statement(plugin, statement)?;
        stmt.current = stmt.pending.pop_front();
        Ok(match stmt.current {
            Some(_) => Step::Row,
            None => Step::Done,
        })
    }

    /// Column `index` of the current row.
    pub fn column(
        &mut self,
        plugin: PluginId,
        statement: StatementId,
        index: usize,
    ) -> Result<Value, PluginError> {
        let stmt = self.owned_statement(plugin, statement)?;
        let row = stmt
            .current
            .as_ref()
            .ok_or(PluginError::NoRow { statement })?;
        row.get(index)
            .cloned()
            .ok_or(PluginError::BadIndex { statement, index })
    }

    /// Rewind the statement so it runs again on the next step. Bindings
    /// are kept.
    pub fn reset(&mut self, plugin: PluginId, statement: StatementId) -> Result<(), PluginError> {
        let stmt = self.owned_statement(plugin, statement)?;
        stmt.started = false;
        stmt.pending.clear();
        stmt.current = None;
        Ok(())
    }

    /// Release the statement handle.
    pub fn finalize(&mut self, plugin: PluginId, statement: StatementId) -> Result<(), PluginError> {
        self.owned_statement(plugin, statement)?;
        self.statements
            .delete(statement.slot as usize)
            .map_err(|_| PluginError::UnknownStatement { statement })
    }

    /// Release every statement `plugin` still holds.
    pub fn finalize_all(&mut self, plugin: PluginId) {
        let owned: Vec<usize> = self
            .statements
            .iter()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| s.owner == plugin))
            .map(|(i, _)| i)
            .collect();
        for idx in owned {
            let _ = self.statements.delete(idx);
        }
    }

    /// Drop every prepared statement; tables are untouched.
    pub fn clear_statements(&mut self) {
        self.statements.clear();
    }

    /// Number of live statements.
    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    fn owned_statement(
        &mut self,
        plugin: PluginId,
        statement: StatementId,
    ) -> Result<&mut Statement, PluginError> {
        let stmt = self
            .statements
            .get_mut(statement.slot as usize)
            .and_then(Option::as_mut)
            .filter(|s| s.generation == statement.generation)
            .ok_or(PluginError::UnknownStatement { statement })?;
        if stmt.owner != plugin {
            return Err(PluginError::ForeignStatement { plugin, statement });
        }
        Ok(stmt)
    }
}

/// A [`PluginDb`] view bound to one plugin's namespace.
///
/// Handed to plugin code so every call carries the right owner.
#[derive(Debug)]
pub struct PluginScope<'a> {
    db: &'a mut PluginDb,
    plugin: PluginId,
}

impl PluginDb {
    /// Bind a view to `plugin`.
    pub fn scope(&mut self, plugin: PluginId) -> PluginScope<'_> {
        PluginScope { db: self, plugin }
    }
}

impl PluginScope<'_> {
    /// The owning plugin.
    pub fn plugin(&self) -> PluginId {
        self.plugin
    }

    /// See [`PluginDb::create_table`].
    pub fn create_table(&mut self, name: &str, columns: &[&str]) -> Result<(), PluginError> {
        self.db.create_table(self.plugin, name, columns)
    }

    /// See [`PluginDb::drop_table`].
    pub fn drop_table(&mut self, name: &str) -> Result<(), PluginError> {
        self.db.drop_table(self.plugin, name)
    }

    /// See [`PluginDb::prepare`].
    pub fn prepare(&mut self, query: Query) -> Result<StatementId, PluginError> {
        self.db.prepare(self.plugin, query)
    }

    /// See [`PluginDb::bind`].
    pub fn bind(
        &mut self,
        statement: StatementId,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<(), PluginError> {
        self.db.bind(self.plugin, statement, index, value)
    }

    /// See [`PluginDb::step`].
    pub fn step(&mut self, statement: StatementId) -> Result<Step, PluginError> {
        self.db.step(self.plugin, statement)
    }

    /// See [`PluginDb::column`].
    pub fn column(&mut self, statement: StatementId, index: usize) -> Result<Value, PluginError> {
        self.db.column(self.plugin, statement, index)
    }

    /// See [`PluginDb::reset`].
    pub fn reset(&mut self, statement: StatementId) -> Result<(), PluginError> {
        self.db.reset(self.plugin, statement)
    }

    /// See [`PluginDb::finalize`].
    pub fn finalize(&mut self, statement: StatementId) -> Result<(), PluginError> {
        self.db.finalize(self.plugin, statement)
    }

    /// Bind `params` in order, run the statement to completion, and reset
    /// it. Rows produced by a select are discarded.
    pub fn execute(&mut self, statement: StatementId, params: &[Value]) -> Result<(), PluginError> {
        for (i, p) in params.iter().enumerate() {
            self.bind(statement, i, p.clone())?;
        }
        while self.step(statement)? == Step::Row {}
        self.reset(statement)
    }

    /// Bind `params`, step once, and return the first row's columns, or
    /// `None` if the statement produced no row. The statement is reset.
    pub fn query_row(
        &mut self,
        statement: StatementId,
        params: &[Value],
        width: usize,
    ) -> Result<Option<Vec<Value>>, PluginError> {
        for (i, p) in params.iter().enumerate() {
            self.bind(statement, i, p.clone())?;
        }
        let row = match self.step(statement)? {
            Step::Row => Some(
                (0..width)
                    .map(|i| self.column(statement, i))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Step::Done => None,
        };
        self.reset(statement)?;
        Ok(row)
    }
}

fn execute(
    table: &mut PluginTable,
    query: &Query,
    params: &[Value],
) -> Result<VecDeque<Vec<Value>>, PluginError> {
    let filter = match query.filter() {
        Some(column) => Some((
            table.column_index(column)?,
            params.last().cloned().unwrap_or_default(),
        )),
        None => None,
    };
    let matches = |row: &[Value]| match &filter {
        Some((col, value)) => row.get(*col) == Some(value),
        None => true,
    };

    let mut out = VecDeque::new();
    match query {
        Query::Select { columns, .. } => {
            let projection = columns
                .iter()
                .map(|c| table.column_index(c))
                .collect::<Result<Vec<_>, _>>()?;
            for row in table.rows.iter().filter(|r| matches(r)) {
                out.push_back(
                    projection
                        .iter()
                        .map(|&i| row.get(i).cloned().unwrap_or_default())
                        .collect(),
                );
            }
        }
        Query::Insert { columns, .. } => {
            let mut row = vec![Value::Null; table.columns.len()];
            for (param, column) in params.iter().zip(columns) {
                row[table.column_index(column)?] = param.clone();
            }
            table.rows.push(row);
        }
        Query::Update { columns, .. } => {
            let targets = columns
                .iter()
                .map(|c| table.column_index(c))
                .collect::<Result<Vec<_>, _>>()?;
            for row in table.rows.iter_mut().filter(|r| matches(r)) {
                for (param, &col) in params.iter().zip(&targets) {
                    if let Some(cell) = row.get_mut(col) {
                        *cell = param.clone();
                    }
                }
            }
        }
        Query::Delete { .. } => table.rows.retain(|r| !matches(r)),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: PluginId = PluginId(1);
    const Q: PluginId = PluginId(2);

    fn db() -> PluginDb {
        let mut db = PluginDb::new().unwrap();
        db.create_table(P, "levels", &["node", "level"]).unwrap();
        db
    }

    fn run(db: &mut PluginDb, stmt: StatementId) {
        assert_eq!(db.step(P, stmt).unwrap(), Step::Done);
        db.reset(P, stmt).unwrap();
    }

    #[test]
    fn insert_select_update_delete() {
        let mut db = db();
        let ins = db.prepare(P, Query::insert("levels", &["node", "level"])).unwrap();
        for (node, level) in [(1, 0.5), (2, 0.75)] {
            db.bind(P, ins, 0, node as i64).unwrap();
            db.bind(P, ins, 1, level).unwrap();
            run(&mut db, ins);
        }

        let sel = db
            .prepare(P, Query::select("levels", &["level"]).where_eq("node"))
            .unwrap();
        db.bind(P, sel, 0, 2i64).unwrap();
        assert_eq!(db.step(P, sel).unwrap(), Step::Row);
        assert_eq!(db.column(P, sel, 0).unwrap(), Value::Real(0.75));
        assert_eq!(db.step(P, sel).unwrap(), Step::Done);
        db.reset(P, sel).unwrap();

        let upd = db
            .prepare(P, Query::update("levels", &["level"]).where_eq("node"))
            .unwrap();
        db.bind(P, upd, 0, 1.0).unwrap();
        db.bind(P, upd, 1, 2i64).unwrap();
        run(&mut db, upd);
        assert_eq!(db.step(P, sel).unwrap(), Step::Row);
        assert_eq!(db.column(P, sel, 0).unwrap().as_real(), Some(1.0));
        db.reset(P, sel).unwrap();

        let del = db.prepare(P, Query::delete("levels").where_eq("node")).unwrap();
        db.bind(P, del, 0, 2i64).unwrap();
        run(&mut db, del);
        assert_eq!(db.step(P, sel).unwrap(), Step::Done);
        assert_eq!(db.table(P, "levels").unwrap().rows.len(), 1);
    }

    #[test]
    fn statements_are_namespaced_per_plugin() {
        let mut db = db();
        let sel = db.prepare(P, Query::select("levels", &["level"])).unwrap();
        assert_eq!(
            db.step(Q, sel),
            Err(PluginError::ForeignStatement {
                plugin: Q,
                statement: sel
            })
        );
        assert!(matches!(
            db.prepare(Q, Query::select("levels", &["level"])),
            Err(PluginError::UnknownTable { .. })
        ));
    }

    #[test]
    fn unknown_column_rejected_at_prepare() {
        let mut db = db();
        assert!(matches!(
            db.prepare(P, Query::select("levels", &["colour"])),
            Err(PluginError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn create_table_is_idempotent_but_checks_columns() {
        let mut db = db();
        assert!(db.create_table(P, "levels", &["node", "level"]).is_ok());
        assert!(matches!(
            db.create_table(P, "levels", &["node"]),
            Err(PluginError::TableConflict { .. })
        ));
        assert!(db.create_table(Q, "levels", &["x"]).is_ok());
    }

    #[test]
    fn column_without_row_and_bad_index() {
        let mut db = db();
        let sel = db.prepare(P, Query::select("levels", &["level"])).unwrap();
        assert_eq!(
            db.column(P, sel, 0),
            Err(PluginError::NoRow { statement: sel })
        );
        assert_eq!(
            db.bind(P, sel, 3, 1i64),
            Err(PluginError::BadIndex {
                statement: sel,
                index: 3
            })
        );
    }

    #[test]
    fn scope_helpers_run_and_reset() {
        let mut db = db();
        let mut scope = db.scope(P);
        let ins = scope.prepare(Query::insert("levels", &["node", "level"])).unwrap();
        scope.execute(ins, &[Value::Int(3), Value::Real(0.25)]).unwrap();
        let sel = scope
            .prepare(Query::select("levels", &["node", "level"]).where_eq("node"))
            .unwrap();
        let row = scope.query_row(sel, &[Value::Int(3)], 2).unwrap();
        assert_eq!(row, Some(vec![Value::Int(3), Value::Real(0.25)]));
        assert_eq!(scope.query_row(sel, &[Value::Int(4)], 2).unwrap(), None);
    }

    #[test]
    fn finalize_releases_handles() {
        let mut db = db();
        let a = db.prepare(P, Query::select("levels", &["node"])).unwrap();
        db.create_table(Q, "other", &["x"]).unwrap();
        db.prepare(Q, Query::select("other", &["x"])).unwrap();
        db.finalize(P, a).unwrap();
        assert_eq!(
            db.step(P, a),
            Err(PluginError::UnknownStatement { statement: a })
        );
        db.finalize_all(Q);
        assert_eq!(db.statement_count(), 0);
    }

    #[test]
    fn finalized_handle_does_not_reach_reused_slot() {
        let mut db = db();
        let a = db.prepare(P, Query::select("levels", &["node"])).unwrap();
        db.finalize(P, a).unwrap();
        let b = db.prepare(P, Query::insert("levels", &["node"])).unwrap();
        assert_eq!(a.slot, b.slot);
        assert_ne!(a, b);

        assert_eq!(
            db.bind(P, a, 0, 7i64),
            Err(PluginError::UnknownStatement { statement: a })
        );
        assert_eq!(
            db.finalize(P, a),
            Err(PluginError::UnknownStatement { statement: a })
        );
        db.bind(P, b, 0, 7i64).unwrap();
        run(&mut db, b);
        assert_eq!(db.table(P, "levels").unwrap().rows.len(), 1);
    }

    #[test]
    fn failed_step_keeps_failing() {
        let mut db = db();
        let sel = db.prepare(P, Query::select("levels", &["node"])).unwrap();
        db.scope(P).drop_table("levels").unwrap();
        let gone = Err(PluginError::UnknownTable {
            table: "levels".to_owned(),
        });
        assert_eq!(db.step(P, sel), gone);
        assert_eq!(db.step(P, sel), gone);

        db.create_table(P, "levels", &["node", "level"]).unwrap();
        assert_eq!(db.step(P, sel).unwrap(), Step::Done);
        assert!(matches!(
            db.drop_table(Q, "levels"),
            Err(PluginError::UnknownTable { .. })
        ));
    }
}
