//! Small parsing helpers shared by the container readers

use quick_xml::Reader;
use quick_xml::events::Event;

/// Last column of an XLSX sheet (`XFD`)
pub const MAX_COLUMNS: usize = 16_384;

/// Last row of an XLSX sheet
pub const MAX_ROWS: usize = 1_048_576;

/// Parse a cell reference like "B12" into (row, col) as 0-based indices.
///
/// References outside the XLSX sheet limits yield `None`.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(usize, usize)> {
    let mut col = 0usize;
    let mut row_str = String::new();

    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            let digit = ch.to_ascii_uppercase() as usize - 'A' as usize + 1;
            col = col.checked_mul(26)?.checked_add(digit)?;
            if col > MAX_COLUMNS {
                return None;
            }
        } else if ch.is_ascii_digit() {
            row_str.push(ch);
        }
    }

    if row_str.is_empty() || col == 0 {
        return None;
    }

    let row = row_str.parse::<usize>().ok()?;
    if row == 0 || row > MAX_ROWS {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Column letters for a 0-based column index ("A", "B", ..., "AA")
pub fn col_to_letter(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Read text content up to the closing tag of the current element
pub fn read_text_node<R: std::io::BufRead>(reader: &mut Reader<R>) -> quick_xml::Result<String> {
    let mut buf = Vec::new();
    let mut text = String::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(e) => text.push_str(e.unescape()?.as_ref()),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(e.as_ref())),
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(text)
}
