//! Generator classes: nodes that hold a value and publish it on one output.

use lantern_core::{NodeId, PluginError, Rgb, Signal, StatementId};
use lantern_graph::{NodeBehavior, NodeCtx, Pull};
use lantern_store::{PluginScope, Query, Value};
use log::warn;

use crate::plugin::{FLOAT_TYPE, INTEGER_TYPE, RGB_TYPE, TRIGGER_TYPE};

/// Prepared statements over one generator table, keyed by node id.
#[derive(Clone, Copy, Debug)]
pub struct GeneratorTable {
    select: StatementId,
    insert: StatementId,
    update: StatementId,
    delete: StatementId,
}

impl GeneratorTable {
    /// Create `table` with a `node` key plus `columns`, and prepare its
    /// statements.
    pub fn prepare(
        db: &mut PluginScope<'_>,
        table: &str,
        columns: &[&str],
    ) -> Result<Self, PluginError> {
        let mut all = vec!["node"];
        all.extend_from_slice(columns);
        db.create_table(table, &all)?;
        Ok(Self {
            select: db.prepare(Query::select(table, columns).where_eq("node"))?,
            insert: db.prepare(Query::insert(table, &all))?,
            update: db.prepare(Query::update(table, columns).where_eq("node"))?,
            delete: db.prepare(Query::delete(table).where_eq("node"))?,
        })
    }

    /// Add the row for `node`.
    pub fn insert(
        &self,
        db: &mut PluginScope<'_>,
        node: NodeId,
        values: Vec<Value>,
    ) -> Result<(), PluginError> {
        let mut params = vec![node_key(node)];
        params.extend(values);
        db.execute(self.insert, &params)
    }

    /// Read the row for `node`.
    pub fn load(
        &self,
        db: &mut PluginScope<'_>,
        node: NodeId,
        width: usize,
    ) -> Result<Vec<Value>, PluginError> {
        db.query_row(self.select, &[node_key(node)], width)?
            .ok_or_else(|| PluginError::Custom {
                reason: format!("no stored value for node {node}"),
            })
    }

    /// Overwrite the row for `node`.
    pub fn store(
        &self,
        db: &mut PluginScope<'_>,
        node: NodeId,
        values: Vec<Value>,
    ) -> Result<(), PluginError> {
        let mut params = values;
        params.push(node_key(node));
        db.execute(self.update, &params)
    }

    /// Drop the row for `node`.
    pub fn remove(&self, db: &mut PluginScope<'_>, node: NodeId) -> Result<(), PluginError> {
        db.execute(self.delete, &[node_key(node)])
    }
}

fn node_key(node: NodeId) -> Value {
    Value::Int(i64::from(node.0))
}

/// A value a [`Generator`] can hold and persist.
pub trait GeneratorValue: Copy + Default + Send + 'static {
    /// Core data type of the output.
    const TYPE: &'static str;
    /// Output plug name.
    const OUTPUT: &'static str;
    /// Persisted columns, in order.
    const COLUMNS: &'static [&'static str];

    /// The value as table cells.
    fn to_row(self) -> Vec<Value>;
    /// The value from table cells; missing cells read as zero.
    fn from_row(row: &[Value]) -> Self;
    /// The value as it travels along an edge.
    fn signal(self) -> Signal;
}

impl GeneratorValue for i64 {
    const TYPE: &'static str = INTEGER_TYPE;
    const OUTPUT: &'static str = "Int Out";
    const COLUMNS: &'static [&'static str] = &["value"];

    fn to_row(self) -> Vec<Value> {
        vec![Value::Int(self)]
    }

    fn from_row(row: &[Value]) -> Self {
        row.first().and_then(Value::as_int).unwrap_or_default()
    }

    fn signal(self) -> Signal {
        Signal::Int(self)
    }
}

impl GeneratorValue for f64 {
    const TYPE: &'static str = FLOAT_TYPE;
    const OUTPUT: &'static str = "Float Out";
    const COLUMNS: &'static [&'static str] = &["value"];

    fn to_row(self) -> Vec<Value> {
        vec![Value::Real(self)]
    }

    fn from_row(row: &[Value]) -> Self {
        row.first().and_then(Value::as_real).unwrap_or_default()
    }

    fn signal(self) -> Signal {
        Signal::Float(self)
    }
}

impl GeneratorValue for Rgb {
    const TYPE: &'static str = RGB_TYPE;
    const OUTPUT: &'static str = "RGB Out";
    const COLUMNS: &'static [&'static str] = &["r", "g", "b"];

    fn to_row(self) -> Vec<Value> {
        self.components().into_iter().map(Value::Real).collect()
    }

    fn from_row(row: &[Value]) -> Self {
        let c = |i: usize| row.get(i).and_then(Value::as_real).unwrap_or_default();
        Rgb::new(c(0), c(1), c(2))
    }

    fn signal(self) -> Signal {
        Signal::Rgb(self)
    }
}

/// Publishes a stored value of type `V`.
pub struct Generator<V> {
    table: GeneratorTable,
    value: V,
}

/// Integer generator.
pub type IntGenerator = Generator<i64>;
/// Float generator.
pub type FloatGenerator = Generator<f64>;
/// RGB generator.
pub type RgbGenerator = Generator<Rgb>;

impl<V: GeneratorValue> Generator<V> {
    /// A generator persisting to `table`, holding zero until restored.
    pub fn new(table: GeneratorTable) -> Self {
        Self {
            table,
            value: V::default(),
        }
    }

    /// The current value.
    pub fn value(&self) -> V {
        self.value
    }

    /// Set the in-memory value. The table is written by the caller.
    pub fn set_value(&mut self, value: V) {
        self.value = value;
    }

    /// The table this generator persists to.
    pub fn table(&self) -> GeneratorTable {
        self.table
    }
}

impl<V: GeneratorValue> NodeBehavior for Generator<V> {
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let type_id = ctx.core_type(V::TYPE).ok_or_else(|| PluginError::Custom {
            reason: format!("core type '{}' is not registered", V::TYPE),
        })?;
        ctx.add_output(V::OUTPUT, type_id, 0)?;
        let node = ctx.node();
        self.table.insert(&mut ctx.db(), node, V::default().to_row())
    }

    fn restore(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let node = ctx.node();
        let row = self.table.load(&mut ctx.db(), node, V::COLUMNS.len())?;
        self.value = V::from_row(&row);
        Ok(())
    }

    fn delete(&mut self, ctx: &mut NodeCtx<'_>) {
        let node = ctx.node();
        if let Err(e) = self.table.remove(&mut ctx.db(), node) {
            warn!("could not drop stored value of node {node}: {e}");
        }
    }

    fn compute(&mut self, _func: u32, _pull: &mut Pull<'_>) -> Signal {
        self.value.signal()
    }
}

/// Publishes a counter that clients bump to fire a trigger.
#[derive(Debug, Default)]
pub struct TriggerGenerator {
    count: u64,
}

impl TriggerGenerator {
    /// Increment the counter; consumers see the step on the next frame.
    pub fn fire(&mut self) -> u64 {
        self.count = self.count.wrapping_add(1);
        self.count
    }

    /// Times fired since load.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl NodeBehavior for TriggerGenerator {
    fn make(&mut self, ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        let trigger = ctx
            .core_type(TRIGGER_TYPE)
            .ok_or_else(|| PluginError::Custom {
                reason: format!("core type '{TRIGGER_TYPE}' is not registered"),
            })?;
        ctx.add_output("Trigger Out", trigger, 0)?;
        Ok(())
    }

    fn restore(&mut self, _ctx: &mut NodeCtx<'_>) -> Result<(), PluginError> {
        self.count = 0;
        Ok(())
    }

    fn compute(&mut self, _func: u32, _pull: &mut Pull<'_>) -> Signal {
        Signal::Trigger(self.count)
    }
}
