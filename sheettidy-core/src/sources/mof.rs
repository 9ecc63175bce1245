//! Ministry of Finance machinery exports

use super::SourceSpec;

pub fn sources() -> Vec<SourceSpec> {
    vec![SourceSpec {
        header_suffix: Some("(百萬美元)".to_string()),
        ..SourceSpec::new("MOF01", "MOF", "機械貨品別出口值")
            .with_extensions(&["xlsx"])
            .with_sheet("Sheet1")
            .with_fixed_layout(&[3], 4)
    }]
}
