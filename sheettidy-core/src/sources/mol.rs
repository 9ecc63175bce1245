//! Ministry of Labor tables: unemployment, reduced hours, average hours

use super::SourceSpec;

pub fn sources() -> Vec<SourceSpec> {
    let base = |id: &str, label: &str| {
        SourceSpec::new(id, "MOL", label)
            .with_extensions(&["xlsx"])
            .with_sheet("Sheet1")
            .with_fixed_layout(&[2], 3)
    };

    vec![
        base("MOL01", "失業率"),
        SourceSpec {
            text_columns: vec![1],
            required_columns: vec![1],
            ..base("MOL02", "勞雇雙方協商減少工時概況")
        },
        SourceSpec {
            hierarchy_column: Some(1),
            ..base("MOL03", "僱員工每人每月平均工時")
        },
    ]
}
