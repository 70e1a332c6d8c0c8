//! Extraction and normalization of executable SQL from agent answers.

use std::sync::OnceLock;

use regex::Regex;

fn exec_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```exec_sql\s+(.*?)\s+```").expect("static pattern"))
}

fn line_comment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"--[^\n]*").expect("static pattern"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

/// All statements inside ```exec_sql``` blocks, one normalized statement
/// per entry: comments stripped, whitespace collapsed, trailing semicolon.
pub fn extract_all_sqls(answer: &str) -> Vec<String> {
    let mut sqls = Vec::new();
    for capture in exec_block().captures_iter(answer) {
        let Some(block) = capture.get(1) else {
            continue;
        };
        let block = line_comment().replace_all(block.as_str(), "");
        for statement in block.split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            let collapsed = whitespace().replace_all(statement, " ");
            sqls.push(format!("{collapsed};"));
        }
    }
    sqls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_statement_is_collapsed() {
        let answer = "【本阶段执行的SQL语句】\n```exec_sql\nSELECT a.InnerCode\nFROM constantdb.secumain AS a\nWHERE a.SecuCode = '600519'\n```";
        assert_eq!(
            extract_all_sqls(answer),
            vec!["SELECT a.InnerCode FROM constantdb.secumain AS a WHERE a.SecuCode = '600519';"]
        );
    }

    #[test]
    fn comments_are_stripped_and_statements_split() {
        let answer = "```exec_sql\n-- 先查内部编码\nSELECT 1; -- 行尾注释\nSELECT 2;\n```";
        assert_eq!(extract_all_sqls(answer), vec!["SELECT 1;", "SELECT 2;"]);
    }

    #[test]
    fn other_block_marks_are_ignored() {
        let answer = "```sql\nSELECT 1;\n```\n```json\n[]\n```";
        assert!(extract_all_sqls(answer).is_empty());
    }

    #[test]
    fn multiple_blocks_are_concatenated() {
        let answer = "```exec_sql\nSELECT 1\n```\n说明\n```exec_sql\nSELECT 2\n```";
        assert_eq!(extract_all_sqls(answer), vec!["SELECT 1;", "SELECT 2;"]);
    }
}
