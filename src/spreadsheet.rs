//! Reading the raw miRTarBase MTI table.
//!
//! The table is published as an Excel workbook; CSV and TSV exports with the
//! same column order are accepted too. Each row becomes a [`RawRow`] with
//! named fields, so nothing downstream depends on column positions.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;

use camino::Utf8Path;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::domain::{MirtarbaseId, canonical_integer};
use crate::error::MirtarbaseError;

const COLUMN_COUNT: usize = 9;

/// One line of the source table, before any cross-referencing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRow {
    pub mirtarbase_id: String,
    pub mirna_name: String,
    pub mirna_species: String,
    pub target_name: String,
    pub target_entrez_id: String,
    pub target_species: String,
    pub experiments: String,
    pub support_type: String,
    pub pubmed_id: String,
}

impl RawRow {
    /// Builds a row from positional cells. `has_index` drops a leading
    /// positional index column; short rows are padded. Blank lines yield `None`.
    pub fn from_cells(mut cells: Vec<String>, has_index: bool) -> Option<Self> {
        if has_index && !cells.is_empty() {
            cells.remove(0);
        }
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            return None;
        }
        cells.resize(COLUMN_COUNT, String::new());

        let mut it = cells.into_iter().map(|cell| cell.trim().to_string());
        let mut next = || it.next().unwrap_or_default();
        Some(Self {
            mirtarbase_id: next(),
            mirna_name: next(),
            mirna_species: next(),
            target_name: next(),
            target_entrez_id: next(),
            target_species: next(),
            experiments: next(),
            support_type: next(),
            pubmed_id: next(),
        })
    }

    fn looks_like_header(&self) -> bool {
        self.mirtarbase_id.parse::<MirtarbaseId>().is_err()
            && canonical_integer(&self.target_entrez_id).is_none()
    }
}

/// Reads every data row of the table at `path`.
pub fn read_rows(path: &Utf8Path) -> Result<Vec<RawRow>, MirtarbaseError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    let cells = match extension.as_str() {
        "xlsx" | "xlsm" => read_xlsx_cells(path)?,
        "csv" => read_delimited_cells(path, b',')?,
        _ => read_delimited_cells(path, b'\t')?,
    };
    Ok(rows_from_cells(cells))
}

pub fn rows_from_cells(cells: Vec<Vec<String>>) -> Vec<RawRow> {
    let has_index = cells.iter().any(|row| filled_width(row) > COLUMN_COUNT);
    let mut rows = cells
        .into_iter()
        .filter_map(|row| RawRow::from_cells(row, has_index))
        .peekable();
    if rows.peek().map(RawRow::looks_like_header).unwrap_or(false) {
        rows.next();
    }
    rows.collect()
}

fn filled_width(row: &[String]) -> usize {
    row.iter()
        .rposition(|cell| !cell.trim().is_empty())
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

fn read_delimited_cells(path: &Utf8Path, delimiter: u8) -> Result<Vec<Vec<String>>, MirtarbaseError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path.as_std_path())
        .map_err(|err| MirtarbaseError::Spreadsheet(format!("open {path}: {err}")))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| MirtarbaseError::Spreadsheet(err.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn read_xlsx_cells(path: &Utf8Path) -> Result<Vec<Vec<String>>, MirtarbaseError> {
    let file = File::open(path.as_std_path())
        .map_err(|err| MirtarbaseError::Spreadsheet(format!("open {path}: {err}")))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| MirtarbaseError::Spreadsheet(err.to_string()))?;

    let shared_strings = match read_entry(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet_name = first_worksheet(&archive).ok_or_else(|| {
        MirtarbaseError::Spreadsheet(format!("{path} contains no worksheet"))
    })?;
    let sheet = read_entry(&mut archive, &sheet_name)?
        .ok_or_else(|| MirtarbaseError::Spreadsheet(format!("missing {sheet_name}")))?;
    parse_sheet(&sheet, &shared_strings)
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Option<String>, MirtarbaseError> {
    match archive.by_name(name) {
        Ok(mut entry) => {
            let mut content = String::new();
            entry
                .read_to_string(&mut content)
                .map_err(|err| MirtarbaseError::Spreadsheet(err.to_string()))?;
            Ok(Some(content))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(MirtarbaseError::Spreadsheet(err.to_string())),
    }
}

fn first_worksheet(archive: &ZipArchive<File>) -> Option<String> {
    let mut sheets = archive
        .file_names()
        .filter(|name| name.starts_with("xl/worksheets/") && name.ends_with(".xml"))
        .map(str::to_string)
        .collect::<Vec<_>>();
    if sheets.iter().any(|name| name == "xl/worksheets/sheet1.xml") {
        return Some("xl/worksheets/sheet1.xml".to_string());
    }
    sheets.sort();
    sheets.into_iter().next()
}

fn xml_error(err: quick_xml::Error) -> MirtarbaseError {
    MirtarbaseError::Spreadsheet(format!("XML parsing error: {err}"))
}

pub(crate) fn parse_shared_strings(xml: &str) -> Result<Vec<String>, MirtarbaseError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"t" => in_text = true,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(e) if in_text && !in_phonetic => {
                current.push_str(&e.unescape().map_err(xml_error)?);
            }
            Event::CData(e) if in_text && !in_phonetic => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => strings.push(std::mem::take(&mut current)),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

#[derive(Default)]
struct PendingCell {
    column: usize,
    kind: Option<String>,
    value: String,
}

pub(crate) fn parse_sheet(
    xml: &str,
    shared_strings: &[String],
) -> Result<Vec<Vec<String>>, MirtarbaseError> {
    let mut reader = Reader::from_str(xml);
    let mut rows = Vec::new();
    let mut row: BTreeMap<usize, String> = BTreeMap::new();
    let mut cell: Option<PendingCell> = None;
    let mut next_column = 0usize;
    let mut in_value = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"row" => {
                    row.clear();
                    next_column = 0;
                }
                b"c" => {
                    let pending = start_cell(&e, next_column)?;
                    next_column = pending.column + 1;
                    cell = Some(pending);
                }
                b"v" | b"t" => in_value = cell.is_some(),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"row" => rows.push(Vec::new()),
                b"c" => next_column = start_cell(&e, next_column)?.column + 1,
                _ => {}
            },
            Event::Text(e) if in_value => {
                if let Some(pending) = cell.as_mut() {
                    pending.value.push_str(&e.unescape().map_err(xml_error)?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(pending) = cell.take() {
                        let column = pending.column;
                        row.insert(column, resolve_cell(pending, shared_strings));
                    }
                }
                b"row" => rows.push(dense_row(&row)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}

fn start_cell(e: &BytesStart<'_>, default_column: usize) -> Result<PendingCell, MirtarbaseError> {
    let mut pending = PendingCell {
        column: default_column,
        ..PendingCell::default()
    };
    for attr in e.attributes() {
        let attr = attr.map_err(|err| MirtarbaseError::Spreadsheet(err.to_string()))?;
        let value = attr.unescape_value().map_err(xml_error)?;
        match attr.key.local_name().as_ref() {
            b"r" => {
                if let Some(column) = column_index(&value) {
                    pending.column = column;
                }
            }
            b"t" => pending.kind = Some(value.to_string()),
            _ => {}
        }
    }
    Ok(pending)
}

fn resolve_cell(cell: PendingCell, shared_strings: &[String]) -> String {
    match cell.kind.as_deref() {
        Some("s") => cell
            .value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|idx| shared_strings.get(idx).cloned())
            .unwrap_or_default(),
        Some("b") => match cell.value.trim() {
            "1" => "TRUE".to_string(),
            _ => "FALSE".to_string(),
        },
        _ => cell.value,
    }
}

fn dense_row(row: &BTreeMap<usize, String>) -> Vec<String> {
    let width = row.keys().next_back().map(|last| last + 1).unwrap_or(0);
    (0..width)
        .map(|column| row.get(&column).cloned().unwrap_or_default())
        .collect()
}

/// Converts the letters of an A1-style reference to a zero-based column.
fn column_index(reference: &str) -> Option<usize> {
    let letters = reference
        .chars()
        .take_while(|ch| ch.is_ascii_alphabetic())
        .collect::<String>();
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for ch in letters.chars() {
        index = index * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(index - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("I12"), Some(8));
        assert_eq!(column_index("AA3"), Some(26));
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn sheet_with_shared_and_inline_strings() {
        let shared = parse_shared_strings(
            r#"<sst><si><t>MIRT000002</t></si><si><r><t>hsa-miR-</t></r><r><t>20a-5p</t></r></si></sst>"#,
        )
        .unwrap();
        assert_eq!(shared, vec!["MIRT000002", "hsa-miR-20a-5p"]);

        let rows = parse_sheet(
            r#"<worksheet><sheetData>
                <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="E1"><v>3091.0</v></c></row>
                <row r="2"><c r="B2" t="inlineStr"><is><t>x &amp; y</t></is></c></row>
            </sheetData></worksheet>"#,
            &shared,
        )
        .unwrap();
        assert_eq!(rows[0], vec!["MIRT000002", "hsa-miR-20a-5p", "", "", "3091.0"]);
        assert_eq!(rows[1], vec!["", "x & y"]);
    }

    #[test]
    fn index_column_and_header_are_dropped() {
        let header = ["", "miRTarBase ID", "miRNA", "Species (miRNA)", "Target Gene",
            "Target Gene (Entrez Gene ID)", "Species (Target Gene)", "Experiments",
            "Support Type", "References (PMID)"];
        let data = ["0", "MIRT000002", "hsa-miR-20a-5p", "Homo sapiens", "HIF1A", "3091",
            "Homo sapiens", "Luciferase reporter assay", "Functional MTI", "18632605"];
        let rows = rows_from_cells(vec![
            header.iter().map(|s| s.to_string()).collect(),
            data.iter().map(|s| s.to_string()).collect(),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mirtarbase_id, "MIRT000002");
        assert_eq!(rows[0].pubmed_id, "18632605");
    }
}
