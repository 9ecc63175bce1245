//! Ministry of Economic Affairs fuel sales by county

use super::SourceSpec;
use crate::tidy::DateCells;

/// The month is only stated in the title rows
pub fn sources() -> Vec<SourceSpec> {
    vec![SourceSpec {
        date_cells: DateCells::Title { scan_rows: 4 },
        text_columns: vec![0],
        ..SourceSpec::new("MOEA01", "MOEA", "各縣市加油站汽柴油銷售分析表")
            .with_extensions(&["xlsx"])
            .with_sheet("銷售統計表")
            .with_fixed_layout(&[3], 4)
    }]
}
