//! Snapshot round-trip and structural invariants.

use proptest::prelude::*;
use sage_graph::{print_path, RelationGraph};

fn sample_graph() -> RelationGraph {
    let mut g = RelationGraph::new();
    g.add_relation(
        "astockmarketquotesdb.secumain",
        "astockmarketquotesdb.qt_dailyquote",
        Some("证券行情"),
        Some("InnerCode"),
        Some("InnerCode"),
        false,
    );
    g.add_relation(
        "astockmarketquotesdb.secumain",
        "astockbasicinfodb.lc_stockarchives",
        Some("公司档案"),
        Some("CompanyCode"),
        Some("CompanyCode"),
        false,
    );
    g
}

#[test]
fn json_roundtrip_preserves_paths() {
    let g = sample_graph();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table_relations.json");

    g.save_to_file(&path).unwrap();
    let loaded = RelationGraph::load_from_file(&path);

    assert_eq!(loaded.table_count(), g.table_count());
    let original = g
        .find_shortest_path(
            "astockmarketquotesdb.qt_dailyquote",
            "astockbasicinfodb.lc_stockarchives",
        )
        .unwrap();
    let reloaded = loaded
        .find_shortest_path(
            "astockmarketquotesdb.qt_dailyquote",
            "astockbasicinfodb.lc_stockarchives",
        )
        .unwrap();
    assert_eq!(original, reloaded);
    assert_eq!(print_path(&original), print_path(&reloaded));
}

#[test]
fn malformed_snapshot_degrades_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table_relations.json");
    std::fs::write(&path, "{ not json").unwrap();

    let loaded = RelationGraph::load_from_file(&path);
    assert_eq!(loaded.table_count(), 0);
}

#[test]
fn hand_edited_snapshot_with_bare_neighbor_entries_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table_relations.json");
    std::fs::write(&path, r#"{"a":{"b":[]},"b":{"a":[]}}"#).unwrap();

    let loaded = RelationGraph::load_from_file(&path);
    assert_eq!(loaded.table_count(), 2);
    assert!(loaded.find_shortest_path("a", "b").is_none());
}

proptest! {
    // Whatever edges are added, the graph stays symmetric: every (a, b)
    // relation has a (b, a) mirror with the column pair swapped.
    #[test]
    fn edges_stay_symmetric(edges in prop::collection::vec(
        ("[a-d]", "[e-h]", "[ij]", "[kl]"),
        1..8,
    )) {
        let mut g = RelationGraph::new();
        for (t1, t2, c1, c2) in &edges {
            g.add_relation(t1, t2, Some("r"), Some(c1), Some(c2), false);
        }
        for t1 in g.tables() {
            for t2 in g.tables() {
                let forward = g.relations(t1, t2);
                let backward = g.relations(t2, t1);
                prop_assert_eq!(forward.len(), backward.len());
                for rel in forward {
                    let (a, b) = rel.column_pair().unwrap();
                    let mirrored = format!("{b}-{a}");
                    prop_assert!(backward
                        .iter()
                        .any(|r| r.columns.as_deref() == Some(mirrored.as_str())));
                }
            }
        }
    }
}
