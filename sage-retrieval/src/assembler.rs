//! Column-set assembly: validation, structural completion and join paths.
//!
//! The output filter is always a superset of the validated input filter.
//! Completion never removes a selected column; only entries that fail
//! schema validation are dropped, since those come from hallucinated
//! selections and must not abort the run.

use tracing::debug;

use sage_core::config::AssemblyConfig;
use sage_core::models::{ColumnFilter, TableId};
use sage_core::SchemaContext;
use sage_graph::{print_path, RelationGraph};

/// One assembled table with its selected column names in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub table: TableId,
    pub columns: Vec<String>,
}

pub struct ColumnSetAssembler<'a> {
    context: &'a SchemaContext,
    graph: &'a RelationGraph,
    config: &'a AssemblyConfig,
}

impl<'a> ColumnSetAssembler<'a> {
    pub fn new(
        context: &'a SchemaContext,
        graph: &'a RelationGraph,
        config: &'a AssemblyConfig,
    ) -> Self {
        Self {
            context,
            graph,
            config,
        }
    }

    /// Run the full assembly pipeline. Returns the completed per-table
    /// column sets and the rendered join-path descriptions between them.
    pub fn assemble(&self, filter: &ColumnFilter) -> (Vec<TableColumns>, Vec<String>) {
        let mut assembled = self.validate(filter);
        self.fill_foreign_key_hub(&mut assembled);
        self.fill_sibling_tables(&mut assembled);
        self.fill_sibling_columns(&mut assembled, false);
        self.fill_mandatory_columns(&mut assembled);
        let relations = self.join_paths(&assembled);
        (self.into_table_columns(&assembled), relations)
    }

    /// Drop entries absent from the loaded schema.
    fn validate(&self, filter: &ColumnFilter) -> ColumnFilter {
        let mut validated = ColumnFilter::new();
        for (table, columns) in filter.iter() {
            if !self.context.has_table(table) {
                debug!(table = %table, "unknown table dropped from filter");
                continue;
            }
            validated.add_table(table.clone());
            for column in columns {
                if self.context.column(table, column).is_none() {
                    debug!(table = %table, column, "unknown column dropped from filter");
                    continue;
                }
                validated.add(table.clone(), column.clone());
            }
        }
        validated
    }

    /// Hub tables always enter the filter with their listed key columns.
    fn fill_foreign_key_hub(&self, filter: &mut ColumnFilter) {
        for (table_name, columns) in &self.config.foreign_key_hub {
            let Ok(table) = TableId::parse(table_name) else {
                continue;
            };
            if !self.context.has_table(&table) {
                continue;
            }
            for column in columns {
                if self.context.column(&table, column).is_some() {
                    filter.add(table.clone(), column.clone());
                }
            }
        }
    }

    /// A table of a sibling group pulls the rest of its group in, copying
    /// over every selected column the sibling also has. Identical question
    /// semantics then resolve uniformly regardless of market.
    fn fill_sibling_tables(&self, filter: &mut ColumnFilter) {
        let present: Vec<TableId> = filter.tables().cloned().collect();
        for table in &present {
            for group in &self.config.sibling_table_groups {
                if !group.contains(table.as_str()) {
                    continue;
                }
                let columns: Vec<String> = filter
                    .columns(table)
                    .map(|cols| cols.iter().cloned().collect())
                    .unwrap_or_default();
                for sibling_name in group {
                    if sibling_name == table.as_str() {
                        continue;
                    }
                    let Ok(sibling) = TableId::parse(sibling_name) else {
                        continue;
                    };
                    if !self.context.has_table(&sibling) {
                        continue;
                    }
                    let mut added = false;
                    for column in &columns {
                        if self.context.column(&sibling, column).is_some() {
                            filter.add(sibling.clone(), column.clone());
                            added = true;
                        }
                    }
                    if added {
                        debug!(table = %table, sibling = %sibling, "sibling table completed");
                    }
                }
            }
        }
    }

    /// A partial intersection with a column co-occurrence group pulls in
    /// the group members the table actually has.
    fn fill_sibling_columns(&self, filter: &mut ColumnFilter, extended: bool) {
        let groups: Vec<&std::collections::BTreeSet<String>> = if extended {
            self.config
                .sibling_column_groups
                .iter()
                .chain(&self.config.extended_sibling_column_groups)
                .collect()
        } else {
            self.config.sibling_column_groups.iter().collect()
        };
        let tables: Vec<TableId> = filter.tables().cloned().collect();
        for table in tables {
            for group in &groups {
                let selected = filter
                    .columns(&table)
                    .map(|cols| group.iter().filter(|c| cols.contains(*c)).count())
                    .unwrap_or(0);
                if selected == 0 || selected == group.len() {
                    continue;
                }
                for column in group.iter() {
                    if !filter.contains(&table, column)
                        && self.context.column(&table, column).is_some()
                    {
                        filter.add(table.clone(), column.clone());
                        debug!(table = %table, column, "sibling column completed");
                    }
                }
            }
        }
    }

    /// Complete sibling columns with the extended group set. The ranking
    /// path uses this on its candidate text, where recall outweighs
    /// prompt size.
    pub fn complete_extended_siblings(&self, filter: &mut ColumnFilter) {
        self.fill_sibling_columns(filter, true);
    }

    /// Key/date/name columns are forced onto every selected table that has
    /// them; joins and filters need them whether or not a ranker or agent
    /// surfaced them.
    fn fill_mandatory_columns(&self, filter: &mut ColumnFilter) {
        let tables: Vec<TableId> = filter.tables().cloned().collect();
        for table in tables {
            let Some(loaded) = self.context.table(&table) else {
                continue;
            };
            for column in &loaded.columns {
                if self.config.mandatory_columns.contains(&column.name) {
                    filter.add(table.clone(), column.name.clone());
                }
            }
        }
    }

    /// Shortest join path per selected table pair, with cross-market
    /// suppression on both the endpoints and every intermediate node.
    fn join_paths(&self, filter: &ColumnFilter) -> Vec<String> {
        let tables: Vec<&TableId> = filter.tables().collect();
        let mut relations = Vec::new();
        for (i, from) in tables.iter().enumerate() {
            for to in tables.iter().skip(i + 1) {
                if self.config.crosses_market(from.as_str(), to.as_str()) {
                    continue;
                }
                let Some(path) = self.graph.find_shortest_path(from.as_str(), to.as_str()) else {
                    continue;
                };
                let mut nodes: Vec<&str> = vec![path[0].from.as_str()];
                nodes.extend(path.iter().map(|hop| hop.to.as_str()));
                if self.config.path_crosses_market(nodes.iter().copied()) {
                    debug!(from = %from, to = %to, "join path crosses market boundary, suppressed");
                    continue;
                }
                relations.push(print_path(&path));
            }
        }
        relations
    }

    fn into_table_columns(&self, filter: &ColumnFilter) -> Vec<TableColumns> {
        filter
            .iter()
            .filter_map(|(table, selected)| {
                let loaded = self.context.table(table)?;
                let columns: Vec<String> = loaded
                    .columns
                    .iter()
                    .filter(|c| selected.contains(&c.name))
                    .map(|c| c.name.clone())
                    .collect();
                Some(TableColumns {
                    table: table.clone(),
                    columns,
                })
            })
            .collect()
    }
}
