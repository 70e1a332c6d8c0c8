//! Company and security lookup.
//!
//! Resolves a name mentioned in the question to its identity row across
//! the three market master tables, so the refinement loop starts with the
//! entity's codes already grounded. Generic words are refused up front;
//! more than three hits means the keyword was wrong (one company cannot
//! be listed more than once per market), so the answer is empty rather
//! than misleading.

use serde_json::Value;
use tracing::debug;

use sage_core::errors::SageResult;
use sage_core::models::TableId;
use sage_core::traits::SqlExecutor;
use sage_core::SchemaContext;

use crate::extract::extract_last_json;

/// Generic terms that would match half the schema.
const JUNK_NAMES: &[&str] = &[
    "公司", "基金", "有限公司", "CN", "A股", "港股", "美股", "该公司", "上市公司", "下属公司",
    "公司股东", "银行", "股票", "证券公司",
];

const MAX_ENTITY_ROWS: usize = 3;

fn escape(name: &str) -> String {
    name.replace('\'', "''")
}

fn secumain_sql(name: &str) -> String {
    let name = escape(name);
    format!(
        "SELECT 'constantdb.secumain' AS TableName, InnerCode, CompanyCode, \
ChiName, EngName, SecuCode, ChiNameAbbr, EngNameAbbr, SecuAbbr, ChiSpelling \
FROM constantdb.secumain \
WHERE SecuCode = '{name}' \
   OR ChiName LIKE '%{name}%' \
   OR ChiNameAbbr LIKE '%{name}%' \
   OR EngName LIKE '%{name}%' \
   OR EngNameAbbr LIKE '%{name}%' \
   OR SecuAbbr LIKE '%{name}%' \
   OR ChiSpelling LIKE '%{name}%' \
UNION ALL \
SELECT 'constantdb.hk_secumain' AS TableName, InnerCode, CompanyCode, \
ChiName, EngName, SecuCode, ChiNameAbbr, EngNameAbbr, SecuAbbr, ChiSpelling \
FROM constantdb.hk_secumain \
WHERE SecuCode = '{name}' \
   OR ChiName LIKE '%{name}%' \
   OR ChiNameAbbr LIKE '%{name}%' \
   OR EngName LIKE '%{name}%' \
   OR EngNameAbbr LIKE '%{name}%' \
   OR SecuAbbr LIKE '%{name}%' \
   OR FormerName LIKE '%{name}%' \
   OR ChiSpelling LIKE '%{name}%' \
UNION ALL \
SELECT 'constantdb.us_secumain' AS TableName, InnerCode, CompanyCode, \
ChiName, EngName, SecuCode, null AS ChiNameAbbr, null AS EngNameAbbr, SecuAbbr, ChiSpelling \
FROM constantdb.us_secumain \
WHERE SecuCode = '{name}' \
   OR ChiName LIKE '%{name}%' \
   OR EngName LIKE '%{name}%' \
   OR SecuAbbr LIKE '%{name}%' \
   OR ChiSpelling LIKE '%{name}%';"
    )
}

fn archives_sql(name: &str) -> String {
    let name = escape(name);
    format!(
        "SELECT 'astockbasicinfodb.lc_stockarchives' AS TableName, CompanyCode, ChiName, \
NULL AS EngName, NULL AS EngNameAbbr, AShareAbbr, AStockCode, BShareAbbr, BStockCode, \
HShareAbbr, HStockCode, CDRShareAbbr, CDRStockCode, ExtendedAbbr \
FROM astockbasicinfodb.lc_stockarchives \
WHERE CompanyCode = '{name}' \
   OR ChiName LIKE '%{name}%' \
   OR AShareAbbr LIKE '%{name}%' \
   OR BShareAbbr LIKE '%{name}%' \
   OR HShareAbbr LIKE '%{name}%' \
   OR CDRShareAbbr LIKE '%{name}%' \
UNION ALL \
SELECT 'hkstockdb.hk_stockarchives' AS TableName, CompanyCode, ChiName, \
NULL AS EngName, NULL AS EngNameAbbr, NULL AS AShareAbbr, NULL AS AStockCode, \
NULL AS BShareAbbr, NULL AS BStockCode, NULL AS HShareAbbr, NULL AS HStockCode, \
NULL AS CDRShareAbbr, NULL AS CDRStockCode, NULL AS ExtendedAbbr \
FROM hkstockdb.hk_stockarchives \
WHERE CompanyCode = '{name}' \
   OR ChiName LIKE '%{name}%' \
UNION ALL \
SELECT 'usstockdb.us_companyinfo' AS TableName, CompanyCode, ChiName, \
EngName, EngNameAbbr, NULL AS AShareAbbr, NULL AS AStockCode, \
NULL AS BShareAbbr, NULL AS BStockCode, NULL AS HShareAbbr, NULL AS HStockCode, \
NULL AS CDRShareAbbr, NULL AS CDRStockCode, NULL AS ExtendedAbbr \
FROM usstockdb.us_companyinfo \
WHERE CompanyCode = '{name}' \
   OR ChiName LIKE '%{name}%' \
   OR EngName LIKE '%{name}%' \
   OR EngNameAbbr LIKE '%{name}%';"
    )
}

/// Look one name up in the security master tables, falling back to the
/// company archive tables when nothing matched.
pub fn query_company(executor: &dyn SqlExecutor, name: &str) -> SageResult<String> {
    if name.is_empty() || JUNK_NAMES.contains(&name) {
        return Ok("[]".to_string());
    }
    let result = executor.execute(&secumain_sql(name))?;
    if result == "[]" {
        return executor.execute(&archives_sql(name));
    }
    Ok(result)
}

/// Render one lookup's rows with column descriptions. Empty when nothing
/// matched or when the row-count cutoff fires.
fn format_rows(context: &SchemaContext, name: &str, rows_json: &str) -> Option<String> {
    let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_str(rows_json).ok()?;
    if rows.is_empty() {
        return None;
    }
    if rows.len() > MAX_ENTITY_ROWS {
        debug!(name, rows = rows.len(), "entity lookup over row cutoff, keyword too broad");
        return None;
    }

    let mut info = if rows.len() == 1 {
        format!("{name}的关联信息有:[")
    } else {
        format!("{name}关联信息有多组:[")
    };
    for (idx, row) in rows.iter().enumerate() {
        let table = row
            .get("TableName")
            .and_then(Value::as_str)
            .and_then(|t| TableId::parse(t).ok());
        for (key, value) in row {
            if key == "TableName" {
                if let Some(v) = value.as_str() {
                    info.push_str(&format!("所在数据表是{v};"));
                }
                continue;
            }
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Null => "null".to_string(),
                other => other.to_string(),
            };
            let desc = table
                .as_ref()
                .and_then(|t| context.column(t, key))
                .map(|c| c.desc.clone());
            match desc {
                Some(desc) => info.push_str(&format!("{key}({desc})是{rendered};")),
                None => info.push_str(&format!("{key}是{rendered};")),
            }
        }
        info.push_str(if idx == rows.len() - 1 { "]" } else { "]," });
    }
    Some(info)
}

/// Resolve every company name in an agent's JSON answer, one formatted
/// line per name that produced rows. Lookup failures are logged and
/// skipped; entity grounding is best effort.
pub fn extract_company_codes(
    context: &SchemaContext,
    executor: &dyn SqlExecutor,
    answer: &str,
) -> String {
    let Some(payload) = extract_last_json(answer) else {
        return String::new();
    };
    let Ok(names) = serde_json::from_str::<Vec<String>>(payload) else {
        debug!("entity answer payload is not a name list");
        return String::new();
    };

    let mut results = Vec::new();
    for name in &names {
        match query_company(executor, name) {
            Ok(rows_json) => {
                if let Some(info) = format_rows(context, name, &rows_json) {
                    results.push(info);
                }
            }
            Err(e) => {
                debug!(name, error = %e, "entity lookup failed");
            }
        }
    }
    results.join("\n")
}
