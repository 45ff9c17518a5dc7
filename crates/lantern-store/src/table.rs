//! Generic id-keyed record table.

use indexmap::IndexMap;
use lantern_core::RecordId;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A row type stored in a [`Table`].
pub trait Record: Clone {
    /// The row id type.
    type Id: RecordId;

    /// Table name used in error reports.
    const TABLE: &'static str;

    /// This row's id.
    fn id(&self) -> Self::Id;

    /// Overwrite this row's id; called by [`Table::insert`].
    fn set_id(&mut self, id: Self::Id);
}

/// Rows keyed by id, in insertion order.
///
/// Ids are allocated from a counter that only moves forward, so a deleted
/// row's id is never handed out again. Id 0 is never allocated by
/// [`insert`](Table::insert); it is reserved for rows created with
/// [`insert_with_id`](Table::insert_with_id).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "TableRepr<R>", into = "TableRepr<R>")]
#[serde(bound(
    serialize = "R: Record + Serialize",
    deserialize = "R: Record + Deserialize<'de>"
))]
pub struct Table<R: Record> {
    rows: IndexMap<R::Id, R>,
    next_id: u32,
}

#[derive(Serialize, Deserialize)]
struct TableRepr<R> {
    next_id: u32,
    rows: Vec<R>,
}

impl<R: Record> From<TableRepr<R>> for Table<R> {
    fn from(repr: TableRepr<R>) -> Self {
        let max = repr.rows.iter().map(|r| r.id().raw()).max().unwrap_or(0);
        Self {
            next_id: repr.next_id.max(max.saturating_add(1)).max(1),
            rows: repr.rows.into_iter().map(|r| (r.id(), r)).collect(),
        }
    }
}

impl<R: Record> From<Table<R>> for TableRepr<R> {
    fn from(table: Table<R>) -> Self {
        Self {
            next_id: table.next_id,
            rows: table.rows.into_values().collect(),
        }
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: IndexMap::new(),
            next_id: 1,
        }
    }
}

impl<R: Record> Table<R> {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record` under a freshly allocated id and return the id.
    pub fn insert(&mut self, mut record: R) -> R::Id {
        let id = R::Id::from(self.next_id);
        self.next_id += 1;
        record.set_id(id);
        self.rows.insert(id, record);
        id
    }

    /// Insert `record` under its own id, replacing any existing row.
    pub fn insert_with_id(&mut self, record: R) {
        let id = record.id();
        self.next_id = self.next_id.max(id.raw().saturating_add(1));
        self.rows.insert(id, record);
    }

    /// The row with `id`.
    pub fn get(&self, id: R::Id) -> Option<&R> {
        self.rows.get(&id)
    }

    /// Mutable access to the row with `id`.
    pub fn get_mut(&mut self, id: R::Id) -> Option<&mut R> {
        self.rows.get_mut(&id)
    }

    /// The row with `id`, or [`StoreError::MissingRecord`].
    pub fn require(&self, id: R::Id) -> Result<&R, StoreError> {
        self.rows.get(&id).ok_or(StoreError::MissingRecord {
            table: R::TABLE,
            id: id.raw(),
        })
    }

    /// Mutable variant of [`require`](Self::require).
    pub fn require_mut(&mut self, id: R::Id) -> Result<&mut R, StoreError> {
        self.rows.get_mut(&id).ok_or(StoreError::MissingRecord {
            table: R::TABLE,
            id: id.raw(),
        })
    }

    /// Remove and return the row with `id`, keeping the order of the rest.
    pub fn remove(&mut self, id: R::Id) -> Option<R> {
        self.rows.shift_remove(&id)
    }

    /// Whether a row with `id` exists.
    pub fn contains(&self, id: R::Id) -> bool {
        self.rows.contains_key(&id)
    }

    /// Rows in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &R> + '_ {
        self.rows.values()
    }

    /// Mutable rows in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut R> + '_ {
        self.rows.values_mut()
    }

    /// Rows matching `pred`.
    pub fn filter<'a, P>(&'a self, mut pred: P) -> impl Iterator<Item = &'a R> + 'a
    where
        P: FnMut(&R) -> bool + 'a,
    {
        self.rows.values().filter(move |r| pred(r))
    }

    /// First row matching `pred`.
    pub fn find<P>(&self, mut pred: P) -> Option<&R>
    where
        P: FnMut(&R) -> bool,
    {
        self.rows.values().find(|r| pred(r))
    }

    /// Ids of rows matching `pred`, collected so the caller may mutate the
    /// table while walking them.
    pub fn ids_where<P>(&self, mut pred: P) -> Vec<R::Id>
    where
        P: FnMut(&R) -> bool,
    {
        self.rows
            .values()
            .filter(|r| pred(r))
            .map(Record::id)
            .collect()
    }

    /// Every id, in insertion order.
    pub fn ids(&self) -> Vec<R::Id> {
        self.rows.keys().copied().collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_core::NodeId;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: NodeId,
        label: String,
    }

    impl Record for Row {
        type Id = NodeId;
        const TABLE: &'static str = "rows";
        fn id(&self) -> NodeId {
            self.id
        }
        fn set_id(&mut self, id: NodeId) {
            self.id = id;
        }
    }

    fn row(label: &str) -> Row {
        Row {
            id: NodeId::default(),
            label: label.into(),
        }
    }

    #[test]
    fn ids_start_at_one_and_never_repeat() {
        let mut t = Table::new();
        let a = t.insert(row("a"));
        let b = t.insert(row("b"));
        assert_eq!((a, b), (NodeId(1), NodeId(2)));
        t.remove(b);
        assert_eq!(t.insert(row("c")), NodeId(3));
    }

    #[test]
    fn require_reports_table_and_id() {
        let t: Table<Row> = Table::new();
        match t.require(NodeId(9)) {
            Err(StoreError::MissingRecord { table, id }) => {
                assert_eq!((table, id), ("rows", 9));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn serde_keeps_counter_and_order() {
        let mut t = Table::new();
        t.insert(row("a"));
        let b = t.insert(row("b"));
        t.insert(row("c"));
        t.remove(b);
        let json = serde_json::to_string(&t).unwrap();
        let mut back: Table<Row> = serde_json::from_str(&json).unwrap();
        let labels: Vec<_> = back.iter().map(|r| r.label.clone()).collect();
        assert_eq!(labels, vec!["a", "c"]);
        assert_eq!(back.insert(row("d")), NodeId(4));
    }

    #[test]
    fn insert_with_id_bumps_counter() {
        let mut t = Table::new();
        t.insert_with_id(Row {
            id: NodeId(0),
            label: "root".into(),
        });
        t.insert_with_id(Row {
            id: NodeId(5),
            label: "five".into(),
        });
        assert_eq!(t.insert(row("next")), NodeId(6));
        assert_eq!(t.get(NodeId(0)).map(|r| r.label.as_str()), Some("root"));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ids_are_fresh_and_rows_keep_insertion_order(
                ops in proptest::collection::vec(any::<(bool, u8)>(), 1..64),
            ) {
                let mut t = Table::new();
                let mut model: Vec<NodeId> = Vec::new();
                let mut seen: Vec<NodeId> = Vec::new();
                for (insert, pick) in ops {
                    if insert || model.is_empty() {
                        let id = t.insert(row("r"));
                        prop_assert!(!seen.contains(&id));
                        seen.push(id);
                        model.push(id);
                    } else {
                        let id = model.remove(pick as usize % model.len());
                        prop_assert!(t.remove(id).is_some());
                    }
                }
                prop_assert_eq!(t.len(), model.len());
                prop_assert_eq!(t.ids(), model);
            }
        }
    }
}
