// src/process/xlsx.rs
use std::io::{Cursor, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, instrument, trace};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::HvsError;
use crate::process::raw_table::{Cell, RawTable};

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const WORKBOOK: &str = "xl/workbook.xml";
const WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const FIRST_SHEET: &str = "xl/worksheets/sheet1.xml";

// Upper bound on the buffer pre-sized from a zip entry's declared size.
const MAX_PREALLOC: usize = 64 << 20;

// Excel's own sheet limits; anything past these is a corrupt reference.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

/// Read the first worksheet of an `.xlsx` workbook into a dense grid.
///
/// Only cell values are read; styles, formulas and number formats are ignored
/// (cached formula results are used as values).
#[instrument(level = "debug", skip(bytes), fields(len = bytes.len()))]
pub fn read_workbook(source_id: &str, bytes: &[u8]) -> Result<RawTable, HvsError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| HvsError::parse(format!("{source_id} is not an xlsx archive: {e}")))?;

    let shared = match read_entry(&mut archive, SHARED_STRINGS)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };
    debug!(count = shared.len(), "loaded shared strings");

    let sheet_name = first_sheet_name(&mut archive)?
        .ok_or_else(|| HvsError::parse(format!("{source_id} contains no worksheet")))?;
    let sheet_xml = read_entry(&mut archive, &sheet_name)?
        .ok_or_else(|| HvsError::parse(format!("{sheet_name} vanished from archive")))?;

    let rows = parse_sheet(&sheet_xml, &shared)?;
    let table = RawTable::new(source_id, rows);
    debug!(
        sheet = %sheet_name,
        rows = table.height(),
        cols = table.width(),
        "parsed worksheet"
    );
    Ok(table)
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, HvsError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(HvsError::parse(format!("opening {name}: {e}"))),
    };
    let mut buf = String::with_capacity(capacity_hint(entry.size()));
    entry
        .read_to_string(&mut buf)
        .map_err(|e| HvsError::parse(format!("reading {name}: {e}")))?;
    Ok(Some(buf))
}

/// The declared size comes from the archive header and is not trusted.
fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared).unwrap_or(MAX_PREALLOC).min(MAX_PREALLOC)
}

/// Part name of the first tab in workbook order, resolved from the first
/// `<sheet r:id>` in `workbook.xml` through the workbook relationships.
/// Archives without those parts fall back to the worksheet part names.
fn first_sheet_name<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<Option<String>, HvsError> {
    let workbook = read_entry(archive, WORKBOOK)?;
    let rels = read_entry(archive, WORKBOOK_RELS)?;
    if let (Some(workbook), Some(rels)) = (workbook, rels) {
        let Some(rel_id) = first_sheet_rel_id(&workbook)? else {
            return Ok(None);
        };
        let target = relationship_target(&rels, &rel_id)?.ok_or_else(|| {
            HvsError::parse(format!("{WORKBOOK_RELS} has no relationship {rel_id:?}"))
        })?;
        let part = resolve_target(&target);
        if !archive.file_names().any(|n| n == part) {
            return Err(HvsError::parse(format!(
                "first sheet {part} is missing from the archive"
            )));
        }
        return Ok(Some(part));
    }
    debug!("no workbook part, picking worksheet by name");
    Ok(first_sheet_by_name(archive))
}

/// `sheet1.xml` when present, else the lowest-numbered worksheet part.
fn first_sheet_by_name<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<String> {
    let mut sheets: Vec<&str> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/") && n.ends_with(".xml"))
        .collect();
    if sheets.contains(&FIRST_SHEET) {
        return Some(FIRST_SHEET.to_string());
    }
    // sheet2 before sheet10
    sheets.sort_unstable_by_key(|n| (n.len(), *n));
    sheets.first().map(|s| s.to_string())
}

fn first_sheet_rel_id(xml: &str) -> Result<Option<String>, HvsError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                return attribute(&e, b"id", WORKBOOK);
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_err(WORKBOOK, e)),
            _ => {}
        }
    }
}

fn relationship_target(xml: &str, rel_id: &str) -> Result<Option<String>, HvsError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if attribute(&e, b"Id", WORKBOOK_RELS)?.as_deref() == Some(rel_id) {
                    return attribute(&e, b"Target", WORKBOOK_RELS);
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_err(WORKBOOK_RELS, e)),
            _ => {}
        }
    }
}

/// Relationship targets are relative to `xl/` unless they start with `/`.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

fn attribute(e: &BytesStart<'_>, local: &[u8], part: &str) -> Result<Option<String>, HvsError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_err(part, err))?;
        if attr.key.local_name().as_ref() == local {
            let value = attr.unescape_value().map_err(|err| xml_err(part, err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn xml_err(part: &str, e: impl std::fmt::Display) -> HvsError {
    HvsError::parse(format!("{part}: {e}"))
}

/// Each `<si>` becomes one string; rich-text runs are concatenated.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>, HvsError> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => out.push(String::new()),
            Ok(Event::Text(t)) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&t.unescape().map_err(|e| xml_err(SHARED_STRINGS, e))?);
                }
            }
            Ok(Event::CData(t)) if in_text => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => out.push(current.take().unwrap_or_default()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(SHARED_STRINGS, e)),
            _ => {}
        }
    }
    Ok(out)
}

/// Cell currently being read from the sheet XML.
#[derive(Default)]
struct PendingCell {
    col: usize,
    kind: Option<String>,
    value: String,
}

fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<Cell>>, HvsError> {
    let mut reader = Reader::from_str(xml);
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut row_idx: Option<usize> = None;
    let mut next_col = 0usize;
    let mut pending: Option<PendingCell> = None;
    let mut in_value = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row_idx = Some(row_reference(&e, row_idx)?);
                    next_col = 0;
                }
                b"c" => {
                    let (col, kind) = cell_reference(&e, next_col)?;
                    next_col = col + 1;
                    pending = Some(PendingCell {
                        col,
                        kind,
                        value: String::new(),
                    });
                }
                // <v> holds plain values, <t> (inside <is>) holds inline strings
                b"v" | b"t" => in_value = pending.is_some(),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row_idx = Some(row_reference(&e, row_idx)?);
                    next_col = 0;
                }
                b"c" => {
                    let (col, _) = cell_reference(&e, next_col)?;
                    next_col = col + 1;
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_value => {
                if let Some(cell) = pending.as_mut() {
                    cell.value
                        .push_str(&t.unescape().map_err(|e| xml_err("worksheet", e))?);
                }
            }
            Ok(Event::CData(t)) if in_value => {
                if let Some(cell) = pending.as_mut() {
                    cell.value.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let (Some(cell), Some(r)) = (pending.take(), row_idx) {
                        let col = cell.col;
                        let value = resolve_cell(cell, shared)?;
                        place(&mut rows, r, col, value);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err("worksheet", e)),
            _ => {}
        }
    }
    trace!(rows = rows.len(), "sheet rows collected");
    Ok(rows)
}

fn place(rows: &mut Vec<Vec<Cell>>, r: usize, c: usize, value: Cell) {
    if rows.len() <= r {
        rows.resize_with(r + 1, Vec::new);
    }
    let row = &mut rows[r];
    if row.len() <= c {
        row.resize(c + 1, Cell::Empty);
    }
    row[c] = value;
}

/// Zero-based row index from `<row r="N">`, or the row after `prev`.
fn row_reference(e: &BytesStart<'_>, prev: Option<usize>) -> Result<usize, HvsError> {
    let fallback = prev.map(|p| p + 1).unwrap_or(0);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_err("worksheet row", e))?;
        if attr.key.local_name().as_ref() == b"r" {
            let raw = attr
                .unescape_value()
                .map_err(|e| xml_err("worksheet row", e))?;
            let n: usize = raw
                .trim()
                .parse()
                .map_err(|_| HvsError::parse(format!("bad row reference {raw:?}")))?;
            if n == 0 || n > MAX_ROWS {
                return Err(HvsError::parse(format!("row reference {n} out of range")));
            }
            return Ok(n - 1);
        }
    }
    Ok(fallback)
}

/// Zero-based column index and type attribute of a `<c>` element.
fn cell_reference(
    e: &BytesStart<'_>,
    next_col: usize,
) -> Result<(usize, Option<String>), HvsError> {
    let mut col = next_col;
    let mut kind = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_err("worksheet cell", e))?;
        let value = attr
            .unescape_value()
            .map_err(|e| xml_err("worksheet cell", e))?;
        match attr.key.local_name().as_ref() {
            b"r" => col = column_index(&value)?,
            b"t" => kind = Some(value.into_owned()),
            _ => {}
        }
    }
    Ok((col, kind))
}

/// "A1" -> 0, "B7" -> 1, "AA3" -> 26.
pub(crate) fn column_index(reference: &str) -> Result<usize, HvsError> {
    let letters: Vec<char> = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return Err(HvsError::parse(format!("bad cell reference {reference:?}")));
    }
    let mut n = 0usize;
    for c in letters {
        n = n * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
        if n > MAX_COLS {
            return Err(HvsError::parse(format!("column in {reference:?} out of range")));
        }
    }
    Ok(n - 1)
}

fn resolve_cell(cell: PendingCell, shared: &[String]) -> Result<Cell, HvsError> {
    let PendingCell { kind, value, .. } = cell;
    if value.is_empty() {
        return Ok(Cell::Empty);
    }
    let resolved = match kind.as_deref() {
        Some("s") => {
            let idx: usize = value
                .trim()
                .parse()
                .map_err(|_| HvsError::parse(format!("bad shared string index {value:?}")))?;
            let s = shared.get(idx).ok_or_else(|| {
                HvsError::parse(format!(
                    "shared string {idx} out of range ({} strings)",
                    shared.len()
                ))
            })?;
            Cell::Text(s.clone())
        }
        Some("b") => Cell::Text(if value.trim() == "1" { "TRUE" } else { "FALSE" }.into()),
        Some("inlineStr") | Some("str") | Some("e") | Some("d") => Cell::Text(value),
        _ => match value.trim().parse::<f64>() {
            Ok(n) => Cell::Number(n),
            Err(_) => Cell::Text(value),
        },
    };
    Ok(resolved)
}
