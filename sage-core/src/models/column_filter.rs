use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::table::TableId;

/// The working set of `table → columns` selected as relevant to a question.
///
/// Mutation is strictly additive: stages may only ever grow the filter, so a
/// downstream stage always sees a superset of what upstream selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnFilter {
    entries: BTreeMap<TableId, BTreeSet<String>>,
}

impl ColumnFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one column to a table entry, creating the entry if needed.
    pub fn add(&mut self, table: TableId, column: impl Into<String>) {
        self.entries.entry(table).or_default().insert(column.into());
    }

    /// Add a table entry without any columns.
    pub fn add_table(&mut self, table: TableId) {
        self.entries.entry(table).or_default();
    }

    /// Union another filter into this one. Commutative: merging A into B
    /// yields the same entries as merging B into A.
    pub fn merge(&mut self, other: ColumnFilter) {
        for (table, cols) in other.entries {
            self.entries.entry(table).or_default().extend(cols);
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableId> {
        self.entries.keys()
    }

    pub fn columns(&self, table: &TableId) -> Option<&BTreeSet<String>> {
        self.entries.get(table)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TableId, &BTreeSet<String>)> {
        self.entries.iter()
    }

    pub fn contains(&self, table: &TableId, column: &str) -> bool {
        self.entries
            .get(table)
            .is_some_and(|cols| cols.contains(column))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when every entry of `other` is present in `self`.
    pub fn is_superset_of(&self, other: &ColumnFilter) -> bool {
        other.iter().all(|(table, cols)| {
            self.entries
                .get(table)
                .is_some_and(|own| cols.is_subset(own))
        })
    }
}

impl FromIterator<(TableId, BTreeSet<String>)> for ColumnFilter {
    fn from_iter<I: IntoIterator<Item = (TableId, BTreeSet<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid(s: &str) -> TableId {
        TableId::parse(s).unwrap()
    }

    #[test]
    fn merge_is_commutative() {
        let mut a = ColumnFilter::new();
        a.add(tid("db.t1"), "ColA");
        a.add(tid("db.t2"), "ColB");

        let mut b = ColumnFilter::new();
        b.add(tid("db.t1"), "ColC");
        b.add(tid("db.t3"), "ColD");

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);

        assert_eq!(ab, ba);
    }

    #[test]
    fn merge_unions_columns() {
        let mut a = ColumnFilter::new();
        a.add(tid("db.t"), "X");
        let mut b = ColumnFilter::new();
        b.add(tid("db.t"), "Y");
        a.merge(b);
        let cols = a.columns(&tid("db.t")).unwrap();
        assert_eq!(cols.len(), 2);
        assert!(a.is_superset_of(&ColumnFilter::new()));
    }
}
