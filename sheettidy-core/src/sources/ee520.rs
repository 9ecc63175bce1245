//! Export orders, with the year and month in separate columns

use super::SourceSpec;
use crate::tidy::DateCells;

pub fn sources() -> Vec<SourceSpec> {
    vec![SourceSpec {
        date_cells: DateCells::Split {
            year_column: 0,
            month_column: 1,
        },
        ..SourceSpec::new("EE520", "MOEA", "外銷訂單")
            .with_extensions(&["json"])
            .with_fixed_layout(&[0], 1)
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::table_json::CapturedTable;
    use crate::tidy;

    #[test]
    fn test_captured_export_orders() {
        let table: CapturedTable = serde_json::from_str(
            r#"{
                "thead": ["年,月,外銷訂單金額(億美元),年增率(%)"],
                "tbody": ["113年,11,5012,3.2", ",12,5230,4.1", "114年,1,4880,-1.5"]
            }"#,
        )
        .unwrap();
        let grid = table.into_grid();
        let spec = &sources()[0];
        let layout = spec.layout_for(&grid).unwrap();
        let table = tidy::build(&grid, &layout, &spec.build_options(None)).unwrap();

        assert_eq!(table.columns, vec!["外銷訂單金額(億美元)", "年增率(%)"]);
        let dates: Vec<&str> = table.rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-11", "2024-12", "2025-01"]);
        assert_eq!(table.rows[2].values[1].as_f64(), Some(-1.5));
    }
}
