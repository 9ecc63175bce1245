use sheettidy_core::aggregate::{
    AggregateMode, AggregateOptions, LONG_HEADER, aggregate_folder, load_corrected,
};
use sheettidy_core::reader::read_grid;
use sheettidy_core::tidy::{TidyRow, TidyTable, Value};
use sheettidy_core::writer::write_table;
use std::fs;
use std::path::Path;

fn corrected(folder: &Path, file_name: &str, columns: &[&str], rows: &[(&str, Vec<Value>)]) {
    let table = TidyTable {
        source: String::new(),
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: rows
            .iter()
            .map(|(date, values)| TidyRow {
                date: date.to_string(),
                values: values.clone(),
            })
            .collect(),
    };
    write_table(folder.join(file_name), &table).unwrap();
}

fn dated_folder(root: &Path) -> std::path::PathBuf {
    let folder = root.join("20251105");
    fs::create_dir(&folder).unwrap();
    corrected(
        &folder,
        "失業率_20251105(修正).xlsx",
        &["失業率(%)"],
        &[
            ("2025-07", vec![Value::Number(3.35)]),
            ("2025-08", vec![Value::Number(3.38)]),
        ],
    );
    corrected(
        &folder,
        "外銷訂單_20251105(修正).xlsx",
        &["金額"],
        &[
            ("2025-08", vec![Value::Number(580.1)]),
            ("2025-09", vec![Value::Number(612.0)]),
        ],
    );
    folder
}

#[test]
fn test_reload_labels_by_file_name() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let folder = dated_folder(root.path());

    let table = load_corrected(&folder.join("失業率_20251105(修正).xlsx"))?;
    assert_eq!(table.source, "失業率");
    assert_eq!(table.columns, vec!["失業率(%)"]);
    assert_eq!(table.rows[1].date, "2025-08");
    assert_eq!(table.rows[1].values[0], Value::Number(3.38));
    Ok(())
}

#[test]
fn test_wide_and_long_outputs() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let folder = dated_folder(root.path());
    fs::write(folder.join("壞檔_20251105(修正).xlsx"), b"broken")?;

    let report = aggregate_folder(
        &folder,
        &AggregateOptions {
            mode: AggregateMode::Both,
            floor: None,
            tag: None,
        },
    )?;

    assert_eq!(report.tag, "20251105");
    assert_eq!(report.sources, vec!["外銷訂單", "失業率"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].kind, "read");
    assert_eq!(report.dates, 3);
    assert_eq!(report.long_rows, 4);

    let wide = read_grid(folder.join("總經指標_20251105.xlsx"), None)?;
    assert_eq!(wide.row(0), &["日期", "外銷訂單_金額", "失業率_失業率(%)"]);
    assert_eq!(wide.row(1), &["2025-07", "", "3.35"]);
    assert_eq!(wide.row(2), &["2025-08", "580.1", "3.38"]);
    assert_eq!(wide.row(3), &["2025-09", "612", ""]);

    let long = read_grid(folder.join("總經指標彙整_20251105.xlsx"), None)?;
    assert_eq!(long.row(0), &LONG_HEADER);
    assert_eq!(long.height(), 5);
    assert_eq!(long.row(1), &["2025-08", "外銷訂單", "金額", "580.1"]);
    Ok(())
}

#[test]
fn test_floor_and_explicit_tag() -> anyhow::Result<()> {
    let root = tempfile::tempdir()?;
    let folder = dated_folder(root.path());

    let report = aggregate_folder(
        &folder,
        &AggregateOptions {
            mode: AggregateMode::Wide,
            floor: Some("2025-08".to_string()),
            tag: Some("test".to_string()),
        },
    )?;
    assert_eq!(report.dates, 2);
    assert!(report.long_output.is_none());
    assert!(!folder.join("總經指標彙整_test.xlsx").exists());

    let wide = read_grid(folder.join("總經指標_test.xlsx"), None)?;
    assert_eq!(wide.cell(1, 0), "2025-08");
    assert_eq!(wide.height(), 3);
    Ok(())
}

#[test]
fn test_undated_folder_needs_tag() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let options = AggregateOptions {
        mode: AggregateMode::Both,
        floor: None,
        tag: None,
    };
    let err = aggregate_folder(dir.path(), &options).unwrap_err();
    assert_eq!(err.kind(), "config");

    let err = aggregate_folder(
        dir.path(),
        &AggregateOptions {
            tag: Some("20251105".to_string()),
            ..options
        },
    )
    .unwrap_err();
    assert_eq!(err.kind(), "no-input");
    Ok(())
}
