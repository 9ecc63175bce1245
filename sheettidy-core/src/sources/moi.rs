//! Ministry of the Interior building statistics
//!
//! These sheets print the year once (`113年`) followed by month rows, with
//! headers spread over several merged rows. Registration headers are filled
//! across their merged span and bound by group and category; permit headers
//! bind in order, each target taking the first unconsumed header that matches.

use super::SourceSpec;
use crate::mapper::MappingRule;
use crate::tidy::YearPolicy;

const COUNT_WORDS: &[&str] = &["棟數", "件數", "Number", "Cases"];
const AREA_WORDS: &[&str] = &["面積", "平方公尺", "m²", "m2", "Area"];

/// Transfer categories of table 4.5, in output order
pub const TRANSFER_KINDS: [&str; 6] = ["合計", "買賣", "拍賣", "繼承", "贈與", "其他"];

/// Ownership registration (table 4.5)
pub fn registration_rules() -> Vec<MappingRule> {
    let mut rules = vec![
        MappingRule::new("所有權第一次登記_棟數", COUNT_WORDS).requiring(&["第一次登記"]),
        MappingRule::new("所有權第一次登記_面積(平方公尺)", AREA_WORDS).requiring(&["第一次登記"]),
    ];
    for kind in TRANSFER_KINDS {
        rules.push(
            MappingRule::new(&format!("移轉登記_{}_棟數", kind), COUNT_WORDS)
                .requiring(&["移轉登記", kind]),
        );
        rules.push(
            MappingRule::new(&format!("移轉登記_{}_面積(平方公尺)", kind), AREA_WORDS)
                .requiring(&["移轉登記", kind]),
        );
    }
    rules
}

/// Building permits by use (tables 8.1 and 8.5)
pub fn permit_rules() -> Vec<MappingRule> {
    [
        ("總計_件數", &["件數", "Cases", "Total Cases"][..]),
        ("總計_總樓地板面積", &["總樓地板面積", "Total Floor Area"]),
        ("住宅類_住宅_宅數", &["宅數", "Houses", "住宅"]),
        ("住宅類_住宅_總樓地板面積", &["住宅", "總樓地板面積", "H-2"]),
        ("住宅類_宿舍安養_總樓地板面積", &["宿舍", "安養", "Dormitory", "Care"]),
        ("商業類_總樓地板面積", &["商業", "Commerce", "B類"]),
        ("工業倉儲類_總樓地板面積", &["工業", "倉儲", "Industry", "Storage", "C類"]),
        ("辦公服務類_總樓地板面積", &["辦公", "服務", "Business", "Service", "G類"]),
        ("休閒文教類_總樓地板面積", &["休閒", "文教", "Leisure", "Education", "D類"]),
        ("衛生福利類_總樓地板面積", &["衛生", "福利", "更生", "Health", "Welfare", "F類"]),
        ("其他_公共集會_總樓地板面積", &["公共集會", "Assembly", "A類"]),
        ("其他_宗教殯葬_總樓地板面積", &["宗教", "殯葬", "Religion", "Funeral", "E類"]),
        ("其他_危險物品_總樓地板面積", &["危險", "Hazard", "I類"]),
        ("其他_其他_總樓地板面積", &["其他類", "Others"]),
        ("其他_農業設施_總樓地板面積", &["農業", "Agricultural", "facility"]),
    ]
    .into_iter()
    .map(|(canonical, words)| MappingRule::new(canonical, words))
    .collect()
}

pub fn sources() -> Vec<SourceSpec> {
    let permits = |id: &str, label: &str, prefix: &str| SourceSpec {
        year_policy: YearPolicy::FilenameTag,
        mapping: permit_rules(),
        output_prefix: Some(prefix.to_string()),
        ..SourceSpec::new(id, "MOI", label)
            .with_sheet("年月monthly(2018.02新修正格式update)")
            .with_fixed_layout(&[1, 2, 3, 4], 5)
    };

    vec![
        SourceSpec {
            mapping: registration_rules(),
            merged_headers: true,
            output_prefix: Some("所有權登記_".to_string()),
            ..SourceSpec::new("MOI01", "MOI", "4.5-辦理建物所有權登記")
                .with_sheet("年月Monthly")
                .with_fixed_layout(&[1, 2, 3], 5)
        },
        permits("MOI02", "8.1-核發建築物建造執照按用途別分", "建造執照_"),
        permits("MOI03", "8.5-核發建築物使用執照按用途別分", "使用執照_"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::map_table;
    use crate::reader::CellGrid;
    use crate::tidy::{self, Value};

    #[test]
    fn test_registration_table() {
        let grid = CellGrid::from_strs(&[
            &["表4.5 辦理建物所有權登記", "", "", "", "", ""],
            &["年月別", "所有權第一次登記", "", "移轉登記", "", ""],
            &["", "", "", "合計 Total", "", "買賣 Sale"],
            &["", "棟數 Number", "面積 Area", "棟數 Number", "面積 Area", "棟數 Number"],
            &["", "", "", "", "", ""],
            &["113年", "", "", "", "", ""],
            &["一月", "1,200", "150,000.5", "20,000", "2,500,000", "15,000"],
            &["二月", "1,100", "140,000", "19,000", "2,400,000", "14,000"],
        ]);
        let spec = &sources()[0];
        let layout = spec.layout_for(&grid).unwrap();
        let table = tidy::build(&grid, &layout, &spec.build_options(None)).unwrap();
        let mapped = map_table(&table, &spec.mapping, spec.output_prefix.as_deref());

        assert_eq!(mapped.columns.len(), 14);
        assert_eq!(mapped.columns[0], "所有權登記_所有權第一次登記_棟數");
        assert_eq!(mapped.columns[13], "所有權登記_移轉登記_其他_面積(平方公尺)");

        let first = &mapped.rows[0];
        assert_eq!(first.date, "2024-01");
        assert_eq!(first.values[0], Value::Number(1200.0));
        assert_eq!(first.values[1], Value::Number(150000.5));
        assert_eq!(first.values[2], Value::Number(20000.0));
        assert_eq!(first.values[4], Value::Number(15000.0));
        assert_eq!(first.values[5], Value::Null);
        assert_eq!(mapped.rows[1].date, "2024-02");
    }

    #[test]
    fn test_registration_binds_by_category() {
        let grid = CellGrid::from_strs(&[
            &["表4.5", "", "", "", "", "", ""],
            &["年月別", "移轉登記", "", "", "", "所有權第一次登記", ""],
            &["", "贈與 Gift", "", "買賣 Sale", "", "", ""],
            &["", "面積 Area", "棟數 Number", "棟數 Number", "面積 Area", "棟數 Number", "面積 Area"],
            &["", "", "", "", "", "", ""],
            &["114年", "", "", "", "", "", ""],
            &["三月", "900", "7", "15,000", "1,800,000", "1,300", "160,000"],
        ]);
        let spec = &sources()[0];
        let layout = spec.layout_for(&grid).unwrap();
        let table = tidy::build(&grid, &layout, &spec.build_options(None)).unwrap();
        let mapped = map_table(&table, &spec.mapping, spec.output_prefix.as_deref());

        let value = |name: &str| {
            let idx = mapped
                .column_index(&format!("所有權登記_{}", name))
                .unwrap();
            mapped.rows[0].values[idx].clone()
        };
        assert_eq!(mapped.rows[0].date, "2025-03");
        assert_eq!(value("所有權第一次登記_棟數"), Value::Number(1300.0));
        assert_eq!(value("所有權第一次登記_面積(平方公尺)"), Value::Number(160000.0));
        assert_eq!(value("移轉登記_買賣_棟數"), Value::Number(15000.0));
        assert_eq!(value("移轉登記_買賣_面積(平方公尺)"), Value::Number(1800000.0));
        assert_eq!(value("移轉登記_贈與_棟數"), Value::Number(7.0));
        assert_eq!(value("移轉登記_贈與_面積(平方公尺)"), Value::Number(900.0));
        assert_eq!(value("移轉登記_合計_棟數"), Value::Null);
    }

    #[test]
    fn test_permit_month_without_year_uses_tag() {
        let grid = CellGrid::from_strs(&[
            &["表8.1", "", ""],
            &["年月別", "總計 Total", ""],
            &["", "件數 Cases", "總樓地板面積 Total Floor Area"],
            &["", "", ""],
            &["", "", ""],
            &["一月", "3,000", "9,000,000"],
            &["114年", "", ""],
            &["二月", "3,100", "9,100,000"],
        ]);
        let spec = &sources()[1];
        assert_eq!(spec.year_policy, YearPolicy::FilenameTag);
        let layout = spec.layout_for(&grid).unwrap();

        let table = tidy::build(&grid, &layout, &spec.build_options(Some(2025))).unwrap();
        let mapped = map_table(&table, &spec.mapping, spec.output_prefix.as_deref());
        let dates: Vec<&str> = mapped.rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-01", "2025-02"]);
        assert_eq!(mapped.columns[0], "建造執照_總計_件數");
        assert_eq!(mapped.rows[1].values[1], Value::Number(9100000.0));

        let untagged = tidy::build(&grid, &layout, &spec.build_options(None)).unwrap();
        assert_eq!(untagged.len(), 1);
    }
}
