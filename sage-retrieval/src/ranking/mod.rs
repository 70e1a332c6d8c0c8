//! Column ranking: two independent signals sharing one fusion formula.
//!
//! Both rankers score individual columns, group them per table, and fuse
//! with `0.5 * max + 0.3 * avg(top 3) + 0.2 * total / column_count`. The
//! formula rewards one strong hit and a consistent cluster of strong hits
//! while diluting tables that match weakly across many columns.

mod lexical_rank;
mod vector_rank;

pub use lexical_rank::LexicalRanker;
pub use vector_rank::VectorRanker;

use sage_core::models::TableId;
use sage_core::SchemaContext;

/// One table's fused ranking result, columns in descending score order.
#[derive(Debug, Clone)]
pub struct TableRanking {
    pub table: TableId,
    pub weighted_score: f32,
    pub max_column_score: f32,
    pub total_score: f32,
    pub column_count: usize,
    pub columns: Vec<(String, f32)>,
}

/// Group per-column scores by table and fuse. `scored` must already be in
/// descending score order; the first score seen per table is its maximum
/// and the first three are its top cluster.
pub(crate) fn fuse_by_table(
    scored: &[(&str, f32)],
    context: &SchemaContext,
    top_tables: usize,
) -> Vec<TableRanking> {
    struct Accum {
        max: f32,
        top: Vec<f32>,
        total: f32,
        columns: Vec<(String, f32)>,
    }

    let mut order: Vec<TableId> = Vec::new();
    let mut accums: std::collections::BTreeMap<TableId, Accum> = std::collections::BTreeMap::new();

    for (qualified, score) in scored {
        let Some((table_part, column)) = qualified.rsplit_once('.') else {
            continue;
        };
        let Ok(table) = TableId::parse(table_part) else {
            continue;
        };
        let entry = accums.entry(table.clone()).or_insert_with(|| {
            order.push(table.clone());
            Accum {
                max: *score,
                top: Vec::new(),
                total: 0.0,
                columns: Vec::new(),
            }
        });
        entry.total += score;
        if entry.top.len() < 3 {
            entry.top.push(*score);
        }
        entry.columns.push((column.to_string(), *score));
    }

    let mut rankings: Vec<TableRanking> = order
        .into_iter()
        .map(|table| {
            let accum = accums.remove(&table).expect("accumulated above");
            let top_avg = if accum.top.is_empty() {
                0.0
            } else {
                accum.top.iter().sum::<f32>() / accum.top.len() as f32
            };
            let column_count = context
                .table(&table)
                .map(|t| t.column_count)
                .unwrap_or(accum.columns.len())
                .max(1);
            let weighted_score =
                0.5 * accum.max + 0.3 * top_avg + 0.2 * accum.total / column_count as f32;
            TableRanking {
                table,
                weighted_score,
                max_column_score: accum.max,
                total_score: accum.total,
                column_count,
                columns: accum.columns,
            }
        })
        .collect();

    rankings.sort_by(|a, b| {
        b.weighted_score
            .partial_cmp(&a.weighted_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rankings.truncate(top_tables);
    rankings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use sage_core::models::{Column, Table};

    fn context_with_counts(counts: &[(&str, usize)]) -> SchemaContext {
        let tables = counts
            .iter()
            .map(|(name, count)| Table {
                table_name: TableId::parse(name).unwrap(),
                table_desc: String::new(),
                table_remarks: String::new(),
                columns: (0..*count)
                    .map(|i| Column {
                        name: format!("c{i}"),
                        desc: String::new(),
                        remarks: String::new(),
                        enum_desc: String::new(),
                        val: String::new(),
                    })
                    .collect(),
                column_count: *count,
            })
            .collect();
        SchemaContext::new(tables, BTreeMap::new())
    }

    #[test]
    fn weighted_formula_exact_arithmetic() {
        let context = context_with_counts(&[("db.t", 4)]);
        let scored = vec![
            ("db.t.a", 0.9f32),
            ("db.t.b", 0.5),
            ("db.t.c", 0.4),
            ("db.t.d", 0.1),
        ];
        let rankings = fuse_by_table(&scored, &context, 3);
        assert_eq!(rankings.len(), 1);
        let expected = 0.5 * 0.9 + 0.3 * ((0.9 + 0.5 + 0.4) / 3.0) + 0.2 * (1.9 / 4.0);
        assert!((rankings[0].weighted_score - expected).abs() < 1e-6);
        assert!((rankings[0].max_column_score - 0.9).abs() < 1e-6);
        assert!((rankings[0].total_score - 1.9).abs() < 1e-6);
        assert_eq!(rankings[0].column_count, 4);
    }

    #[test]
    fn single_strong_hit_beats_many_weak_ones() {
        let context = context_with_counts(&[("db.strong", 10), ("db.weak", 10)]);
        let scored = vec![
            ("db.strong.a", 0.95f32),
            ("db.weak.a", 0.3),
            ("db.weak.b", 0.3),
            ("db.weak.c", 0.3),
            ("db.weak.d", 0.3),
        ];
        let rankings = fuse_by_table(&scored, &context, 2);
        assert_eq!(rankings[0].table.as_str(), "db.strong");
    }

    #[test]
    fn top_tables_truncates() {
        let context = context_with_counts(&[("db.a", 1), ("db.b", 1), ("db.c", 1)]);
        let scored = vec![("db.a.x", 0.9f32), ("db.b.x", 0.8), ("db.c.x", 0.7)];
        let rankings = fuse_by_table(&scored, &context, 1);
        assert_eq!(rankings.len(), 1);
        assert_eq!(rankings[0].table.as_str(), "db.a");
    }
}
