use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Declarative data driving column-set assembly.
///
/// Sibling groups name tables/columns representing the same logical concept
/// across market-specific schemas; market groups partition tables into
/// A-share / Hong-Kong / US sets that must never be joined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Table groups representing the same entity across markets.
    pub sibling_table_groups: Vec<BTreeSet<String>>,
    /// Column co-occurrence groups applied during assembly.
    pub sibling_column_groups: Vec<BTreeSet<String>>,
    /// Additional column groups applied only on the ranking path, where
    /// recall matters more than prompt size.
    pub extended_sibling_column_groups: Vec<BTreeSet<String>>,
    /// Key/date/name columns force-included on every table that has them.
    pub mandatory_columns: BTreeSet<String>,
    /// Tables whose listed columns are always pulled into the filter.
    pub foreign_key_hub: BTreeMap<String, BTreeSet<String>>,
    /// Disjoint market table sets; tables from different sets are never
    /// connected, directly or through an intermediate path node.
    pub market_groups: Vec<BTreeSet<String>>,
    /// Hop bound for join-path enumeration.
    pub max_path_hops: usize,
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            sibling_table_groups: vec![
                set(&[
                    "constantdb.secumain",
                    "constantdb.hk_secumain",
                    "constantdb.us_secumain",
                ]),
                set(&[
                    "astockbasicinfodb.lc_stockarchives",
                    "hkstockdb.hk_stockarchives",
                    "usstockdb.us_companyinfo",
                ]),
                set(&[
                    "astockmarketquotesdb.qt_dailyquote",
                    "hkstockdb.cs_hkstockperformance",
                    "usstockdb.us_dailyquote",
                ]),
                set(&[
                    "astockmarketquotesdb.qt_stockperformance",
                    "hkstockdb.cs_hkstockperformance",
                ]),
            ],
            sibling_column_groups: vec![
                set(&["InnerCode", "CompanyCode", "SecuCode"]),
                set(&["IfAdjusted", "IfMerged"]),
                set(&["DividendRatioBeforeTax", "ActualRatioAfterTax"]),
                set(&["ChiName", "ChiNameAbbr"]),
                set(&["EngName", "EngNameAbbr"]),
                set(&["ChangePCT", "ChangePCTRMSix"]),
                set(&["InfoPublDate", "InitialInfoPublDate"]),
            ],
            extended_sibling_column_groups: vec![
                set(&[
                    "IfHighestHPriceRW",
                    "IfHighestHPriceRM",
                    "IfHighestHPriceRMThree",
                    "IfHighestHPriceRMSix",
                    "IfHighestHPriceRY",
                    "IfHighestHPriceSL",
                ]),
                set(&[
                    "IfHighestCPriceRW",
                    "IfHighestCPriceRM",
                    "IfHighestCPriceRMThree",
                    "IfHighestCPriceRMSix",
                    "IfHighestCPriceRY",
                    "IfHighestCPriceSL",
                ]),
                set(&[
                    "IfHighestTVolumeRW",
                    "IfHighestTVolumeRM",
                    "IfHighestTVRMThree",
                    "IfHighestTVolumeRMSix",
                    "IfHighestTVolumeRY",
                    "IfHighestTVolumeSL",
                ]),
                set(&[
                    "IfHighestTValueRW",
                    "IfHighestTValueRM",
                    "IfHighestTValueRMThree",
                    "IfHighestTValueRMSix",
                    "IfHighestTValueRY",
                    "IfHighestTValueSL",
                ]),
                set(&[
                    "HighestHPTimesSL",
                    "HighestHPTimesRW",
                    "HighestHPTimesRM",
                    "HighestHPTimesRMThree",
                    "HighestHPTimesRMSix",
                    "HighestHPTimesRY",
                ]),
                set(&[
                    "IfLowestLPriceRW",
                    "IfLowestLPriceRM",
                    "IfLowestLPRMThree",
                    "IfLowestLPriceRMSix",
                    "IfLowestLPriceRY",
                    "IfLowestLPriceSL",
                ]),
                set(&[
                    "IfLowestClosePriceRW",
                    "IfLowestClosePriceRM",
                    "IfLowestCPriceRMThree",
                    "IfLowestCPriceRMSix",
                    "IfLowestClosePriceRY",
                    "IfLowestClosePriceSL",
                ]),
                set(&[
                    "IfLowestTVolumeRW",
                    "IfLowestTVolumeRM",
                    "IfLowestTVolumeRMThree",
                    "IfLowestVolumeRMSix",
                    "IfLowestTVolumeRY",
                    "IfLowestTVolumeSL",
                ]),
                set(&[
                    "IfLowestTValueRW",
                    "IfLowestTValueRM",
                    "IfLowestTValueRMThree",
                    "IfLowestTValueRMSix",
                    "IfLowestTValueRY",
                    "IfLowestTValueSL",
                ]),
                set(&[
                    "LowestLowPriceTimesSL",
                    "LowestLowPriceTimesRW",
                    "LowestLowPriceTimesRM",
                    "LowestLPTimesRMThree",
                    "LowestLPTimesRMSix",
                    "LowestLPTimesRY",
                ]),
                set(&[
                    "RisingUpDays",
                    "FallingDownDays",
                    "VolumeRisingUpDays",
                    "VolumeFallingDownDays",
                ]),
                set(&[
                    "BreakingMAverageFive",
                    "BreakingMAverageTen",
                    "BreakingMAverageTwenty",
                    "BreakingMAverageSixty",
                ]),
            ],
            mandatory_columns: set(&[
                "TradingDay",
                "InnerCode",
                "CompanyCode",
                "SecuCode",
                "InitialInfoPublDate",
                "EndDate",
                "BeginDate",
                "IndustryName",
                "FirstPublDate",
                "IniInfoPublDate",
                "InitialImpleDay",
                "State",
                "RegAbbr",
                "ChiName",
                "ChiNameAbbr",
                "SecuAbbr",
                "EngName",
                "EngNameAbbr",
                "PEOStatus",
                "InfoPublDate",
                "ConceptName",
                "SubclassName",
                "ClassName",
                "ConceptCode",
                "SubclassCode",
                "ClassCode",
                "RelationType",
                "InfoTypeCode",
                "IfEffected",
                "Level",
                "AreaChiName",
                "EffectiveDate",
            ]),
            foreign_key_hub: BTreeMap::new(),
            market_groups: vec![
                set(&[
                    "constantdb.secumain",
                    "astockbasicinfodb.lc_stockarchives",
                    "astockmarketquotesdb.qt_dailyquote",
                    "astockmarketquotesdb.qt_stockperformance",
                ]),
                set(&[
                    "constantdb.hk_secumain",
                    "hkstockdb.hk_stockarchives",
                    "hkstockdb.cs_hkstockperformance",
                ]),
                set(&[
                    "constantdb.us_secumain",
                    "usstockdb.us_companyinfo",
                    "usstockdb.us_dailyquote",
                ]),
            ],
            max_path_hops: 3,
        }
    }
}

impl AssemblyConfig {
    /// True when joining `a` and `b` would cross a market boundary.
    pub fn crosses_market(&self, a: &str, b: &str) -> bool {
        for (i, set_a) in self.market_groups.iter().enumerate() {
            for set_b in self.market_groups.iter().skip(i + 1) {
                if (set_a.contains(a) && set_b.contains(b))
                    || (set_a.contains(b) && set_b.contains(a))
                {
                    return true;
                }
            }
        }
        false
    }

    /// True when the node set of a path touches two different market groups.
    pub fn path_crosses_market<'a, I: IntoIterator<Item = &'a str>>(&self, nodes: I) -> bool {
        let mut seen: Vec<bool> = vec![false; self.market_groups.len()];
        for node in nodes {
            for (i, group) in self.market_groups.iter().enumerate() {
                if group.contains(node) {
                    seen[i] = true;
                }
            }
        }
        seen.iter().filter(|&&s| s).count() > 1
    }
}
