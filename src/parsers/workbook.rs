//! Spreadsheet parsing.
//!
//! XLSX is read from the raw OOXML parts. Sheet order and names come from
//! `xl/workbook.xml` and its relationships part; when those are missing the
//! worksheets are taken in `sheetN.xml` order. Legacy BIFF workbooks
//! (`.xls`, recognised by their compound-file signature rather than the
//! extension) are read with `calamine`. Either way each sheet is parsed and
//! classified on its own, so one malformed sheet does not lose the others.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use bundle_insights_core::{InsightClassifier, Table};
use calamine::{Data, Range, Reader, Xls};
use quick_xml::events::{BytesStart, Event};

use super::{SheetOutcome, SheetRecord, TableSummary, WorkbookPayload};
use crate::config::ParsingConfig;
use crate::error::ParseError;

const MAX_XML_ENTRY_BYTES: u64 = 20 * 1024 * 1024;
const WORKSHEET_PREFIX: &str = "xl/worksheets/sheet";
/// Widest column Excel allows (`XFD`).
const MAX_COLUMNS: usize = 16_384;
const CFB_SIGNATURE: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

/// A worksheet part and its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SheetEntry {
    name: String,
    path: String,
}

pub fn parse(
    bytes: &[u8],
    classifier: &InsightClassifier,
    config: &ParsingConfig,
) -> Result<WorkbookPayload, ParseError> {
    if bytes.starts_with(CFB_SIGNATURE) {
        return parse_legacy(bytes, classifier, config);
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        ParseError::Spreadsheet(format!("not an OOXML or BIFF workbook: {}", e))
    })?;
    let shared_strings = read_shared_strings(&mut archive)?;
    let sheets = list_sheets(&mut archive)?;
    check_sheet_count(sheets.len(), config)?;

    let records = sheets
        .into_iter()
        .take(config.max_sheets)
        .map(|sheet| {
            let table = read_sheet(
                &mut archive,
                &sheet.path,
                &shared_strings,
                config.max_cells_per_sheet,
            );
            sheet_record(sheet.name, table, classifier, config)
        })
        .collect();

    Ok(WorkbookPayload { sheets: records })
}

/// BIFF workbook through calamine. Sheets keep their workbook order.
fn parse_legacy(
    bytes: &[u8],
    classifier: &InsightClassifier,
    config: &ParsingConfig,
) -> Result<WorkbookPayload, ParseError> {
    let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))?;
    let names = workbook.sheet_names();
    check_sheet_count(names.len(), config)?;

    let records = names
        .into_iter()
        .take(config.max_sheets)
        .map(|name| {
            let table = workbook
                .worksheet_range(&name)
                .map_err(ParseError::from)
                .map(|range| Table::from_grid(range_grid(&range, config.max_cells_per_sheet)));
            sheet_record(name, table, classifier, config)
        })
        .collect();

    Ok(WorkbookPayload { sheets: records })
}

fn check_sheet_count(count: usize, config: &ParsingConfig) -> Result<(), ParseError> {
    if count == 0 {
        return Err(ParseError::Spreadsheet(
            "workbook contains no worksheets".to_string(),
        ));
    }
    if count > config.max_sheets {
        tracing::warn!(
            sheets = count,
            limit = config.max_sheets,
            "workbook sheet count over limit, extra sheets ignored"
        );
    }
    Ok(())
}

fn sheet_record(
    name: String,
    table: Result<Table, ParseError>,
    classifier: &InsightClassifier,
    config: &ParsingConfig,
) -> SheetRecord {
    let outcome = match table {
        Ok(table) => {
            let classification = classifier.classify_table(&table);
            SheetOutcome::Parsed(TableSummary::new(
                &table,
                classification,
                config.sheet_sample_rows,
            ))
        }
        Err(e) => {
            tracing::warn!(sheet = %name, error = %e, "sheet parse failed");
            SheetOutcome::Failed {
                error: e.to_string(),
            }
        }
    };
    SheetRecord {
        sheet: name,
        outcome,
    }
}

/// Rows of cell text from a calamine range, with the same blank-row and
/// cell-limit rules as the XLSX reader.
fn range_grid(range: &Range<Data>, max_cells: usize) -> Vec<Vec<String>> {
    let first_column = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let mut grid = Vec::new();
    let mut cells = 0usize;

    for source in range.rows() {
        let mut row = vec![String::new(); first_column];
        let mut full = false;
        for cell in source {
            let text = cell_text(cell);
            if !text.is_empty() {
                cells += 1;
            }
            row.push(text);
            if cells >= max_cells {
                full = true;
                break;
            }
        }
        while row.last().is_some_and(|c| c.is_empty()) {
            row.pop();
        }
        if !row.is_empty() {
            grid.push(row);
        }
        if full {
            tracing::warn!(limit = max_cells, "sheet cell limit reached, remaining cells ignored");
            break;
        }
    }
    grid
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

fn read_zip_entry_bounded(
    archive: &mut Archive<'_>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ParseError> {
    let entry = archive.by_name(name)?;
    let mut out = Vec::new();
    entry.take(max_bytes + 1).read_to_end(&mut out)?;
    if out.len() as u64 > max_bytes {
        return Err(ParseError::Spreadsheet(format!(
            "{} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn has_entry(archive: &Archive<'_>, name: &str) -> bool {
    archive.file_names().any(|n| n == name)
}

fn attribute(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, ParseError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == local {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Shared string table. Rich-text runs of one entry are concatenated.
fn read_shared_strings(archive: &mut Archive<'_>) -> Result<Vec<String>, ParseError> {
    if !has_entry(archive, "xl/sharedStrings.xml") {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(te) if in_t => current.push_str(&te.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Worksheets in workbook order.
fn list_sheets(archive: &mut Archive<'_>) -> Result<Vec<SheetEntry>, ParseError> {
    let declared = if has_entry(archive, "xl/workbook.xml") {
        read_declared_sheets(archive)?
    } else {
        Vec::new()
    };
    let sheets: Vec<SheetEntry> = declared
        .into_iter()
        .filter(|s| has_entry(archive, &s.path))
        .collect();
    if !sheets.is_empty() {
        return Ok(sheets);
    }

    let mut paths: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(WORKSHEET_PREFIX) && n.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    paths.sort_by_key(|path| sheet_number(path).unwrap_or(u32::MAX));
    Ok(paths
        .into_iter()
        .map(|path| SheetEntry {
            name: format!("Sheet{}", sheet_number(&path).unwrap_or(0)),
            path,
        })
        .collect())
}

fn sheet_number(path: &str) -> Option<u32> {
    path.trim_start_matches(WORKSHEET_PREFIX)
        .trim_end_matches(".xml")
        .parse()
        .ok()
}

/// `<sheet name=".." r:id=".."/>` entries resolved through the workbook
/// relationships part.
fn read_declared_sheets(archive: &mut Archive<'_>) -> Result<Vec<SheetEntry>, ParseError> {
    let xml = read_zip_entry_bounded(archive, "xl/workbook.xml", MAX_XML_ENTRY_BYTES)?;
    let mut declared = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(id)) = (attribute(&e, b"name")?, attribute(&e, b"id")?) {
                    declared.push((name, id));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let rels_name = "xl/_rels/workbook.xml.rels";
    let targets = if has_entry(archive, rels_name) {
        read_relationships(&read_zip_entry_bounded(archive, rels_name, MAX_XML_ENTRY_BYTES)?)?
    } else {
        HashMap::new()
    };

    Ok(declared
        .into_iter()
        .filter_map(|(name, id)| {
            let target = targets.get(&id)?;
            let path = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{}", target),
            };
            Some(SheetEntry { name, path })
        })
        .collect())
}

fn read_relationships(xml: &[u8]) -> Result<HashMap<String, String>, ParseError> {
    let mut targets = HashMap::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attribute(&e, b"Id")?, attribute(&e, b"Target")?)
                {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

fn read_sheet(
    archive: &mut Archive<'_>,
    path: &str,
    shared_strings: &[String],
    max_cells: usize,
) -> Result<Table, ParseError> {
    let xml = read_zip_entry_bounded(archive, path, MAX_XML_ENTRY_BYTES)?;
    let grid = read_sheet_grid(&xml, shared_strings, max_cells)?;
    Ok(Table::from_grid(grid))
}

/// Cell type from the `t` attribute of `<c>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Number,
    Shared,
    Inline,
    Formula,
    Boolean,
}

impl CellKind {
    fn from_attr(t: Option<&str>) -> Self {
        match t {
            Some("s") => CellKind::Shared,
            Some("inlineStr") => CellKind::Inline,
            Some("str") => CellKind::Formula,
            Some("b") => CellKind::Boolean,
            _ => CellKind::Number,
        }
    }
}

/// Rows of cell text, placed by column reference. Fully blank rows are
/// dropped. Reading stops at `max_cells` non-empty cells.
fn read_sheet_grid(
    xml: &[u8],
    shared_strings: &[String],
    max_cells: usize,
) -> Result<Vec<Vec<String>>, ParseError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut grid: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut column = 0usize;
    let mut kind = CellKind::Number;
    let mut value = String::new();
    let mut in_value = false;
    let mut cells = 0usize;

    loop {
        if cells >= max_cells {
            tracing::warn!(limit = max_cells, "sheet cell limit reached, remaining cells ignored");
            if row.iter().any(|c| !c.is_empty()) {
                grid.push(std::mem::take(&mut row));
            }
            break;
        }
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row.clear();
                    column = 0;
                }
                b"c" => {
                    column = cell_column(&e, column)?;
                    kind = CellKind::from_attr(attribute(&e, b"t")?.as_deref());
                    value.clear();
                }
                b"v" => in_value = true,
                b"t" if kind == CellKind::Inline => in_value = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"c" => {
                    column = cell_column(&e, column)? + 1;
                }
                b"row" => {
                    row.clear();
                    column = 0;
                }
                _ => {}
            },
            Event::Text(te) if in_value => value.push_str(&te.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    let text = resolve_cell(kind, value.trim(), shared_strings);
                    if !text.is_empty() {
                        if row.len() <= column {
                            row.resize(column + 1, String::new());
                        }
                        row[column] = text;
                        cells += 1;
                    }
                    column += 1;
                }
                b"row" => {
                    if row.iter().any(|c| !c.is_empty()) {
                        grid.push(std::mem::take(&mut row));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(grid)
}

fn resolve_cell(kind: CellKind, raw: &str, shared_strings: &[String]) -> String {
    match kind {
        CellKind::Shared => raw
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i))
            .cloned()
            .unwrap_or_default(),
        CellKind::Boolean => match raw {
            "1" => "TRUE".to_string(),
            "0" => "FALSE".to_string(),
            other => other.to_string(),
        },
        CellKind::Number | CellKind::Inline | CellKind::Formula => raw.to_string(),
    }
}

/// Column of a `<c>` element: its `r` reference when present, otherwise
/// the position after the previous cell.
fn cell_column(e: &BytesStart<'_>, next: usize) -> Result<usize, ParseError> {
    let column = match attribute(e, b"r")? {
        Some(reference) => column_index(&reference)?.unwrap_or(next),
        None => next,
    };
    if column >= MAX_COLUMNS {
        return Err(ParseError::Spreadsheet(format!(
            "cell column {} is beyond the last spreadsheet column",
            column + 1
        )));
    }
    Ok(column)
}

/// Zero-based column of a cell reference such as `B7` or `AA12`. `None`
/// when the reference has no column letters.
fn column_index(reference: &str) -> Result<Option<usize>, ParseError> {
    let out_of_range =
        || ParseError::Spreadsheet(format!("cell reference {} is out of range", reference));
    let mut n = 0usize;
    let mut letters = 0usize;
    for b in reference.bytes().take_while(u8::is_ascii_alphabetic) {
        let digit = (b.to_ascii_uppercase() - b'A' + 1) as usize;
        n = n
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .filter(|v| *v <= MAX_COLUMNS)
            .ok_or_else(out_of_range)?;
        letters += 1;
    }
    if letters == 0 {
        return Ok(None);
    }
    Ok(Some(n - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundle_insights_core::TableShape;
    use std::io::Write;

    fn build_xlsx(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            for (name, body) in parts {
                zip.start_file(*name, zip::write::SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn biff_record(out: &mut Vec<u8>, kind: u16, data: &[u8]) {
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&(data.len() as u16).to_le_bytes());
        out.extend_from_slice(data);
    }

    fn biff_bof(substream: u16) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&0x0600u16.to_le_bytes());
        data.extend_from_slice(&substream.to_le_bytes());
        data.extend_from_slice(&0x0DBBu16.to_le_bytes());
        data.extend_from_slice(&0x07CCu16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&6u32.to_le_bytes());
        data
    }

    /// BIFF8 workbook stream with one worksheet. Numeric cell text becomes
    /// a Number record, anything else a shared-string label.
    fn biff_stream(sheet_name: &str, cells: &[(u16, u16, &str)]) -> Vec<u8> {
        let mut strings: Vec<&str> = Vec::new();
        let mut sheet = Vec::new();
        biff_record(&mut sheet, 0x0809, &biff_bof(0x0010));
        for (row, col, text) in cells {
            let mut data = Vec::new();
            data.extend_from_slice(&row.to_le_bytes());
            data.extend_from_slice(&col.to_le_bytes());
            data.extend_from_slice(&0u16.to_le_bytes());
            match text.parse::<f64>() {
                Ok(number) => {
                    data.extend_from_slice(&number.to_le_bytes());
                    biff_record(&mut sheet, 0x0203, &data);
                }
                Err(_) => {
                    let index = strings.iter().position(|s| s == text).unwrap_or_else(|| {
                        strings.push(*text);
                        strings.len() - 1
                    });
                    data.extend_from_slice(&(index as u32).to_le_bytes());
                    biff_record(&mut sheet, 0x00FD, &data);
                }
            }
        }
        biff_record(&mut sheet, 0x000A, &[]);

        let globals = |sheet_offset: u32| {
            let mut out = Vec::new();
            biff_record(&mut out, 0x0809, &biff_bof(0x0005));
            biff_record(&mut out, 0x0042, &1200u16.to_le_bytes());
            let mut bound = sheet_offset.to_le_bytes().to_vec();
            bound.extend_from_slice(&[0, 0, sheet_name.len() as u8, 0]);
            bound.extend_from_slice(sheet_name.as_bytes());
            biff_record(&mut out, 0x0085, &bound);
            let mut sst = Vec::new();
            sst.extend_from_slice(&(strings.len() as u32).to_le_bytes());
            sst.extend_from_slice(&(strings.len() as u32).to_le_bytes());
            for s in &strings {
                sst.extend_from_slice(&(s.len() as u16).to_le_bytes());
                sst.push(0);
                sst.extend_from_slice(s.as_bytes());
            }
            biff_record(&mut out, 0x00FC, &sst);
            biff_record(&mut out, 0x000A, &[]);
            out
        };
        let offset = globals(0).len() as u32;
        let mut stream = globals(offset);
        stream.extend_from_slice(&sheet);
        stream
    }

    fn directory_entry(name: &str, kind: u8, child: u32, start: u32, size: u32) -> Vec<u8> {
        let mut entry = vec![0u8; 128];
        let utf16: Vec<u8> = name.encode_utf16().flat_map(u16::to_le_bytes).collect();
        entry[..utf16.len()].copy_from_slice(&utf16);
        entry[64..66].copy_from_slice(&((utf16.len() + 2) as u16).to_le_bytes());
        entry[66] = kind;
        entry[67] = 1;
        entry[68..72].copy_from_slice(&u32::MAX.to_le_bytes());
        entry[72..76].copy_from_slice(&u32::MAX.to_le_bytes());
        entry[76..80].copy_from_slice(&child.to_le_bytes());
        entry[116..120].copy_from_slice(&start.to_le_bytes());
        entry[120..124].copy_from_slice(&size.to_le_bytes());
        entry
    }

    /// Minimal version 3 compound file holding a `Workbook` stream. The
    /// stream is padded to 4096 bytes so it lives in regular sectors.
    fn biff_workbook(sheet_name: &str, cells: &[(u16, u16, &str)]) -> Vec<u8> {
        const SECTOR: usize = 512;
        const END_OF_CHAIN: u32 = 0xFFFF_FFFE;
        const FAT_SECTOR: u32 = 0xFFFF_FFFD;
        const FREE: u32 = 0xFFFF_FFFF;

        let mut stream = biff_stream(sheet_name, cells);
        assert!(stream.len() <= 4096);
        stream.resize(4096, 0);
        let stream_sectors = stream.len() / SECTOR;

        let mut header = vec![0u8; SECTOR];
        header[..8].copy_from_slice(CFB_SIGNATURE);
        header[24..26].copy_from_slice(&0x003Eu16.to_le_bytes());
        header[26..28].copy_from_slice(&3u16.to_le_bytes());
        header[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());
        header[30..32].copy_from_slice(&9u16.to_le_bytes());
        header[32..34].copy_from_slice(&6u16.to_le_bytes());
        header[44..48].copy_from_slice(&1u32.to_le_bytes());
        header[48..52].copy_from_slice(&1u32.to_le_bytes());
        header[56..60].copy_from_slice(&4096u32.to_le_bytes());
        header[60..64].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
        header[68..72].copy_from_slice(&END_OF_CHAIN.to_le_bytes());
        header[76..80].copy_from_slice(&0u32.to_le_bytes());
        for slot in header[80..].chunks_mut(4) {
            slot.copy_from_slice(&FREE.to_le_bytes());
        }

        let mut fat = vec![FREE; SECTOR / 4];
        fat[0] = FAT_SECTOR;
        fat[1] = END_OF_CHAIN;
        for i in 0..stream_sectors {
            let id = i + 2;
            fat[id] = if i + 1 == stream_sectors {
                END_OF_CHAIN
            } else {
                (id + 1) as u32
            };
        }

        let mut directory = directory_entry("Root Entry", 5, 1, END_OF_CHAIN, 0);
        directory.extend(directory_entry("Workbook", 2, u32::MAX, 2, stream.len() as u32));
        directory.resize(SECTOR, 0);

        let mut out = header;
        out.extend(fat.iter().flat_map(|v| v.to_le_bytes()));
        out.extend(directory);
        out.extend(stream);
        out
    }

    const WORKBOOK: &str = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Audience" sheetId="1" r:id="rId1"/><sheet name="Sites" sheetId="2" r:id="rId2"/></sheets></workbook>"#;
    const RELS: &str = r#"<Relationships><Relationship Id="rId1" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Target="/xl/worksheets/sheet2.xml"/></Relationships>"#;
    const SHARED: &str = r#"<sst><si><t>Insight</t></si><si><t>Insight Value</t></si><si><r><t>Shops </t></r><r><t>Online</t></r></si><si><t>Domain Name</t></si></sst>"#;
    const SHEET1: &str = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row><row r="2"><c r="A2" t="s"><v>2</v></c><c r="B2"><v>42</v></c></row></sheetData></worksheet>"#;
    const SHEET2: &str = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>3</v></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>example.com</t></is></c></row></sheetData></worksheet>"#;

    #[test]
    fn parses_sheets_in_workbook_order() {
        let bytes = build_xlsx(&[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELS),
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet1.xml", SHEET1),
            ("xl/worksheets/sheet2.xml", SHEET2),
        ]);
        let payload = parse(
            &bytes,
            &InsightClassifier::default(),
            &ParsingConfig::default(),
        )
        .unwrap();
        let names: Vec<&str> = payload.sheets.iter().map(|s| s.sheet.as_str()).collect();
        assert_eq!(names, ["Audience", "Sites"]);

        let SheetOutcome::Parsed(audience) = &payload.sheets[0].outcome else {
            panic!("first sheet should parse");
        };
        assert_eq!(audience.columns, ["Insight", "Insight Value"]);
        assert_eq!(audience.shape, TableShape::InsightValue);
        assert_eq!(audience.sample_rows[0]["Insight"], "Shops Online");
        assert_eq!(audience.sample_rows[0]["Insight Value"], 42);

        let SheetOutcome::Parsed(sites) = &payload.sheets[1].outcome else {
            panic!("second sheet should parse");
        };
        assert_eq!(sites.shape, TableShape::Domain);
        assert_eq!(sites.row_count, 1);
    }

    #[test]
    fn falls_back_to_sheet_file_order() {
        let bytes = build_xlsx(&[
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet10.xml", SHEET2),
            ("xl/worksheets/sheet2.xml", SHEET1),
        ]);
        let payload = parse(
            &bytes,
            &InsightClassifier::default(),
            &ParsingConfig::default(),
        )
        .unwrap();
        let names: Vec<&str> = payload.sheets.iter().map(|s| s.sheet.as_str()).collect();
        assert_eq!(names, ["Sheet2", "Sheet10"]);
    }

    #[test]
    fn malformed_sheet_is_isolated() {
        let bytes = build_xlsx(&[
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet1.xml", SHEET1),
            ("xl/worksheets/sheet2.xml", "<worksheet><sheetData><row></c></worksheet>"),
        ]);
        let payload = parse(
            &bytes,
            &InsightClassifier::default(),
            &ParsingConfig::default(),
        )
        .unwrap();
        assert!(matches!(payload.sheets[0].outcome, SheetOutcome::Parsed(_)));
        assert!(matches!(
            payload.sheets[1].outcome,
            SheetOutcome::Failed { .. }
        ));
    }

    #[test]
    fn truncated_legacy_workbook_fails() {
        let err = parse(
            b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1 legacy",
            &InsightClassifier::default(),
            &ParsingConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Spreadsheet(_)));
    }

    #[test]
    fn legacy_workbook_sheets_are_classified() {
        let bytes = biff_workbook(
            "Audience",
            &[
                (0, 0, "Age Range"),
                (0, 1, "Percentage"),
                (1, 0, "25-34"),
                (1, 1, "41"),
                (2, 0, "18-24"),
                (2, 1, "12.5"),
            ],
        );
        let payload = parse(
            &bytes,
            &InsightClassifier::default(),
            &ParsingConfig::default(),
        )
        .unwrap();
        assert_eq!(payload.sheets.len(), 1);
        assert_eq!(payload.sheets[0].sheet, "Audience");
        let SheetOutcome::Parsed(summary) = &payload.sheets[0].outcome else {
            panic!("legacy sheet should parse: {:?}", payload.sheets[0].outcome);
        };
        assert_eq!(summary.columns, ["Age Range", "Percentage"]);
        assert_eq!(summary.row_count, 2);
        assert_eq!(summary.sample_rows[0]["Age Range"], "25-34");
        assert_eq!(summary.sample_rows[0]["Percentage"], 41);
        assert_eq!(summary.sample_rows[1]["Percentage"], 12.5);
    }

    #[test]
    fn oversized_column_reference_fails_only_that_sheet() {
        let huge = r#"<worksheet><sheetData><row r="1"><c r="ZZZZZZZZZZZZZZZ1" t="inlineStr"><is><t>x</t></is></c></row></sheetData></worksheet>"#;
        let wide = r#"<worksheet><sheetData><row r="1"><c r="ZZZZZZ1" t="inlineStr"><is><t>x</t></is></c></row></sheetData></worksheet>"#;
        let bytes = build_xlsx(&[
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/sheet1.xml", SHEET1),
            ("xl/worksheets/sheet2.xml", huge),
            ("xl/worksheets/sheet3.xml", wide),
        ]);
        let payload = parse(
            &bytes,
            &InsightClassifier::default(),
            &ParsingConfig::default(),
        )
        .unwrap();
        assert!(matches!(payload.sheets[0].outcome, SheetOutcome::Parsed(_)));
        for sheet in &payload.sheets[1..] {
            let SheetOutcome::Failed { error } = &sheet.outcome else {
                panic!("{} should fail", sheet.sheet);
            };
            assert!(error.contains("out of range") || error.contains("last spreadsheet column"));
        }
    }

    #[test]
    fn cells_land_in_referenced_columns() {
        let xml = br#"<worksheet><sheetData><row><c r="A1" t="inlineStr"><is><t>a</t></is></c><c r="C1" t="inlineStr"><is><t>c</t></is></c></row><row><c r="B2" t="b"><v>1</v></c></row></sheetData></worksheet>"#;
        let grid = read_sheet_grid(xml, &[], 100).unwrap();
        assert_eq!(grid[0], ["a", "", "c"]);
        assert_eq!(grid[1], ["", "TRUE"]);
    }

    #[test]
    fn cell_limit_truncates_grid() {
        let xml = br#"<worksheet><sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row></sheetData></worksheet>"#;
        let grid = read_sheet_grid(xml, &[], 2).unwrap();
        assert_eq!(grid, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn column_references() {
        assert_eq!(column_index("A1").unwrap(), Some(0));
        assert_eq!(column_index("Z9").unwrap(), Some(25));
        assert_eq!(column_index("AA12").unwrap(), Some(26));
        assert_eq!(column_index("XFD1").unwrap(), Some(16_383));
        assert_eq!(column_index("12").unwrap(), None);
        assert!(column_index("XFE1").is_err());
        assert!(column_index("ZZZZZZZZZZZZZZZ1").is_err());
    }
}
