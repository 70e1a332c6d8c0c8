//! JOIN-skeleton rendering of discovered paths.
//!
//! A path becomes a `SELECT ... FROM ... JOIN ...` example the agent can
//! copy join conditions from; aliases follow path order as `a, b, c, …`.

use std::collections::BTreeMap;

use crate::relation_graph::PathHop;

fn alias_for(index: usize) -> String {
    // Paths are hop-bounded, so single letters suffice in practice;
    // overflow wraps into a2, b2, ...
    let letter = (b'a' + (index % 26) as u8) as char;
    if index < 26 {
        letter.to_string()
    } else {
        format!("{letter}{}", index / 26 + 1)
    }
}

/// Render one path as a human-readable JOIN skeleton. Hops without column
/// metadata emit a placeholder comment instead of a real condition.
pub fn print_path(path: &[PathHop]) -> String {
    if path.is_empty() {
        return "没有找到路径".to_string();
    }

    let start = &path[0].from;
    let end = &path[path.len() - 1].to;

    let mut aliases: BTreeMap<&str, String> = BTreeMap::new();
    aliases.insert(start.as_str(), alias_for(0));
    let mut next_alias = 1usize;

    let mut joins: Vec<String> = Vec::new();
    for hop in path {
        if !aliases.contains_key(hop.to.as_str()) {
            aliases.insert(hop.to.as_str(), alias_for(next_alias));
            next_alias += 1;
        }
        let src_alias = &aliases[hop.from.as_str()];
        let dst_alias = &aliases[hop.to.as_str()];
        let join = match hop.columns.split_once('-') {
            Some((src_col, dst_col)) => format!(
                "JOIN {} {} ON {}.{} = {}.{}",
                hop.to, dst_alias, src_alias, src_col, dst_alias, dst_col
            ),
            None => format!(
                "JOIN {} {} -- 关系: {} (关联字段未知)",
                hop.to, dst_alias, hop.relation_name
            ),
        };
        joins.push(join);
    }

    let mut parts = vec![
        format!("-- 从{start}到{end}的完整连接路径示例:\n"),
        "SELECT *".to_string(),
        format!("FROM {start} a"),
    ];
    parts.extend(joins);
    parts.push(";".to_string());
    parts.join(" ")
}

/// Render several paths as a numbered list of JOIN skeletons.
pub fn print_all_paths(paths: &[Vec<PathHop>]) -> String {
    if paths.is_empty() {
        return "没有找到路径".to_string();
    }
    paths
        .iter()
        .enumerate()
        .map(|(i, p)| format!("-- 路径 {}:\n{}", i + 1, print_path(p)))
        .collect::<Vec<_>>()
        .join("\n\n")
}
