//! Zip container walk for XLSX files that the primary reader rejects
//!
//! Only the pieces needed to rebuild a grid of strings are parsed: the
//! shared string table, the workbook sheet list with its relationships, and
//! the `<row>`/`<c>` elements of one worksheet.

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use super::parser_utils::{MAX_ROWS, parse_cell_ref, read_text_node};
use super::{CellGrid, GridReader, has_extension};

pub struct XlsxXmlReader;

impl GridReader for XlsxXmlReader {
    fn name(&self) -> &'static str {
        "xlsx-xml"
    }

    fn accepts(&self, path: &Path) -> bool {
        has_extension(path, &["xlsx", "xlsm"])
    }

    fn read(&self, path: &Path, sheet: Option<&str>) -> Result<CellGrid> {
        let file =
            File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
        let mut archive =
            ZipArchive::new(BufReader::new(file)).context("Failed to open zip archive")?;
        read_archive_grid(&mut archive, sheet)
    }
}

/// Build a grid from an already opened XLSX archive
pub fn read_archive_grid<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet: Option<&str>,
) -> Result<CellGrid> {
    let shared_strings = extract_shared_strings(archive)?;

    let named_path = match sheet {
        Some(name) => resolve_sheet_path(archive, name).unwrap_or_else(|e| {
            tracing::debug!("sheet '{}' not resolved through workbook rels: {}", name, e);
            None
        }),
        None => None,
    };

    let path = match named_path {
        Some(path) => path,
        None => first_worksheet_path(archive).context("No worksheet found in archive")?,
    };

    let sheet_xml = archive
        .by_name(&path)
        .with_context(|| format!("Failed to find {}", path))?;
    parse_worksheet(BufReader::new(sheet_xml), &shared_strings)
}

/// Concatenate every `<t>` inside each `<si>` of the shared string table
pub fn extract_shared_strings<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let ss_xml = match archive.by_name("xl/sharedStrings.xml") {
        Ok(file) => file,
        Err(_) => return Ok(strings),
    };

    let mut reader = Reader::from_reader(BufReader::new(ss_xml));
    let mut buf = Vec::new();
    let mut current = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"t" => {
                current.push_str(&read_text_node(&mut reader)?);
            }
            Event::End(e) if e.name().as_ref() == b"si" => {
                strings.push(std::mem::take(&mut current));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Resolve a sheet name to its worksheet part through workbook.xml and its rels
pub fn resolve_sheet_path<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet_name: &str,
) -> Result<Option<String>> {
    let mut rid = None;
    {
        let workbook_xml = archive
            .by_name("xl/workbook.xml")
            .context("Failed to find xl/workbook.xml")?;
        let mut reader = Reader::from_reader(BufReader::new(workbook_xml));
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"sheet" => {
                    let mut name = String::new();
                    let mut r_id = String::new();
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => name = attr.unescape_value()?.to_string(),
                            b"r:id" => r_id = attr.unescape_value()?.to_string(),
                            _ => {}
                        }
                    }
                    if name == sheet_name {
                        rid = Some(r_id);
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }
    }

    let Some(rid) = rid else {
        return Ok(None);
    };

    let rels_xml = archive
        .by_name("xl/_rels/workbook.xml.rels")
        .context("Failed to find xl/_rels/workbook.xml.rels")?;
    let mut reader = Reader::from_reader(BufReader::new(rels_xml));
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                let mut id = String::new();
                let mut target = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = attr.unescape_value()?.to_string(),
                        b"Target" => target = attr.unescape_value()?.to_string(),
                        _ => {}
                    }
                }
                if id == rid {
                    return Ok(Some(normalize_target(&target)));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(None)
}

/// Relationship targets are relative to `xl/` unless absolute
fn normalize_target(target: &str) -> String {
    let mut target = target.trim_start_matches('/');
    while let Some(rest) = target.strip_prefix("../") {
        target = rest;
    }
    if target.starts_with("xl/") {
        target.to_string()
    } else {
        format!("xl/{}", target)
    }
}

fn first_worksheet_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    // numeric order, so sheet2.xml comes before sheet10.xml
    names.sort_by_key(|n| {
        let digits: String = n.chars().filter(char::is_ascii_digit).collect();
        (digits.parse::<u64>().unwrap_or(u64::MAX), n.clone())
    });
    names.into_iter().next()
}

fn parse_worksheet<R: std::io::BufRead>(source: R, shared_strings: &[String]) -> Result<CellGrid> {
    let mut reader = Reader::from_reader(source);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut buf = Vec::new();
    let mut current_row = 0usize;
    let mut next_row = 0usize;
    let mut current_col = 0usize;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == b"row" => {
                current_row = next_row;
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"r"
                        && let Ok(r) = attr.unescape_value()?.parse::<usize>()
                    {
                        if r == 0 || r > MAX_ROWS {
                            bail!("row number {} is outside the sheet", r);
                        }
                        current_row = r - 1;
                    }
                }
                next_row = current_row + 1;
                current_col = 0;
            }
            Event::Start(ref e) | Event::Empty(ref e) if e.name().as_ref() == b"c" => {
                let mut r_attr = String::new();
                let mut t_attr = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"r" => r_attr = attr.unescape_value()?.to_string(),
                        b"t" => t_attr = attr.unescape_value()?.to_string(),
                        _ => {}
                    }
                }

                let (row, col) = if r_attr.is_empty() {
                    (current_row, current_col)
                } else {
                    parse_cell_ref(&r_attr)
                        .with_context(|| format!("invalid cell reference '{}'", r_attr))?
                };
                current_col = col + 1;

                let value = if matches!(event, Event::Start(_)) {
                    parse_cell_contents(&mut reader, &t_attr, shared_strings)?
                } else {
                    String::new()
                };

                if !value.is_empty() {
                    if rows.len() <= row {
                        rows.resize_with(row + 1, Vec::new);
                    }
                    let cells = &mut rows[row];
                    if cells.len() <= col {
                        cells.resize(col + 1, String::new());
                    }
                    cells[col] = value;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(CellGrid::from_rows(rows))
}

/// Read the value of one `<c>` element, consuming events up to `</c>`
fn parse_cell_contents<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    t_attr: &str,
    shared_strings: &[String],
) -> Result<String> {
    let mut value = String::new();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(ref e) => match e.name().as_ref() {
                b"v" => {
                    let v_text = read_text_node(reader)?;
                    value = match t_attr {
                        "s" => {
                            let idx = v_text.trim().parse::<usize>().unwrap_or(usize::MAX);
                            shared_strings.get(idx).cloned().unwrap_or_default()
                        }
                        "b" => {
                            if v_text.trim() == "1" {
                                "TRUE".to_string()
                            } else {
                                "FALSE".to_string()
                            }
                        }
                        "e" => String::new(),
                        _ => v_text,
                    };
                }
                b"is" => {
                    let mut is_text = String::new();
                    let mut is_buf = Vec::new();
                    loop {
                        match reader.read_event_into(&mut is_buf)? {
                            Event::Start(ref ee) if ee.name().as_ref() == b"t" => {
                                is_text.push_str(&read_text_node(reader)?);
                            }
                            Event::End(ref ee) if ee.name().as_ref() == b"is" => break,
                            Event::Eof => break,
                            _ => {}
                        }
                        is_buf.clear();
                    }
                    value = is_text;
                }
                b"f" => {
                    // formula text is not part of the grid
                    read_text_node(reader)?;
                }
                _ => {}
            },
            Event::End(ref e) if e.name().as_ref() == b"c" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(value)
}
